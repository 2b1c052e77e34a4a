//! Constant tensor payloads
//!
//! [`TensorData`] is the embedded value of a `Constant` node. Each variant
//! pins the element type, so reading a zero-point out of a constant is a
//! dtype-guarded operation rather than an implicit coercion.

use ndarray::{arr0, Array1, ArrayD, IxDyn};

use crate::error::{PartitionError, PartitionResult};

use super::dtype::DType;

/// Embedded tensor value of a constant
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    /// int8 payload
    Int8(ArrayD<i8>),
    /// int16 payload
    Int16(ArrayD<i16>),
    /// int32 payload
    Int32(ArrayD<i32>),
    /// int64 payload
    Int64(ArrayD<i64>),
    /// uint8 payload
    Uint8(ArrayD<u8>),
    /// float32 payload
    Float32(ArrayD<f32>),
}

impl TensorData {
    /// Element type of the payload
    pub fn dtype(&self) -> DType {
        match self {
            TensorData::Int8(_) => DType::Int8,
            TensorData::Int16(_) => DType::Int16,
            TensorData::Int32(_) => DType::Int32,
            TensorData::Int64(_) => DType::Int64,
            TensorData::Uint8(_) => DType::Uint8,
            TensorData::Float32(_) => DType::Float32,
        }
    }

    /// Shape of the payload
    pub fn shape(&self) -> Vec<usize> {
        match self {
            TensorData::Int8(a) => a.shape().to_vec(),
            TensorData::Int16(a) => a.shape().to_vec(),
            TensorData::Int32(a) => a.shape().to_vec(),
            TensorData::Int64(a) => a.shape().to_vec(),
            TensorData::Uint8(a) => a.shape().to_vec(),
            TensorData::Float32(a) => a.shape().to_vec(),
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        match self {
            TensorData::Int8(a) => a.len(),
            TensorData::Int16(a) => a.len(),
            TensorData::Int32(a) => a.len(),
            TensorData::Int64(a) => a.len(),
            TensorData::Uint8(a) => a.len(),
            TensorData::Float32(a) => a.len(),
        }
    }

    /// Check if the payload has no elements
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All elements widened to i64, in logical order
    ///
    /// A 0-d tensor yields a single element. Float payloads are rejected.
    pub fn to_vec_i64(&self) -> PartitionResult<Vec<i64>> {
        match self {
            TensorData::Int8(a) => Ok(a.iter().map(|&v| i64::from(v)).collect()),
            TensorData::Int16(a) => Ok(a.iter().map(|&v| i64::from(v)).collect()),
            TensorData::Int32(a) => Ok(a.iter().map(|&v| i64::from(v)).collect()),
            TensorData::Int64(a) => Ok(a.iter().copied().collect()),
            TensorData::Uint8(a) => Ok(a.iter().map(|&v| i64::from(v)).collect()),
            TensorData::Float32(_) => Err(PartitionError::InvalidConstant(format!(
                "expected an integer tensor, found {}",
                self.dtype()
            ))),
        }
    }

    /// First element widened to i64
    pub fn first_i64(&self) -> PartitionResult<i64> {
        self.to_vec_i64()?
            .first()
            .copied()
            .ok_or_else(|| PartitionError::InvalidConstant("empty tensor".to_string()))
    }

    /// Single element widened to i64; the payload must hold exactly one value
    pub fn scalar_i64(&self) -> PartitionResult<i64> {
        if self.len() != 1 {
            return Err(PartitionError::InvalidConstant(format!(
                "expected a single element, found {} with shape {:?}",
                self.len(),
                self.shape()
            )));
        }
        self.first_i64()
    }
}

/// Create a 0-d int32 constant
pub fn scalar_i32(value: i32) -> TensorData {
    TensorData::Int32(arr0(value).into_dyn())
}

/// Create a 0-d float32 constant
pub fn scalar_f32(value: f32) -> TensorData {
    TensorData::Float32(arr0(value).into_dyn())
}

/// Create a 1-D int32 constant
pub fn vec_i32(data: &[i32]) -> TensorData {
    TensorData::Int32(Array1::from(data.to_vec()).into_dyn())
}

/// Create an int8 tensor of the given shape filled with `value`
pub fn filled_i8(shape: &[usize], value: i8) -> TensorData {
    TensorData::Int8(ArrayD::from_elem(IxDyn(shape), value))
}

/// Create an int32 tensor of the given shape filled with `value`
pub fn filled_i32(shape: &[usize], value: i32) -> TensorData {
    TensorData::Int32(ArrayD::from_elem(IxDyn(shape), value))
}

/// Create an int64 tensor of the given shape filled with `value`
pub fn filled_i64(shape: &[usize], value: i64) -> TensorData {
    TensorData::Int64(ArrayD::from_elem(IxDyn(shape), value))
}

/// Create a tensor of `dtype` and `shape` filled with zeros
pub fn zeros(dtype: DType, shape: &[usize]) -> PartitionResult<TensorData> {
    let ix = IxDyn(shape);
    match dtype {
        DType::Int8 => Ok(TensorData::Int8(ArrayD::zeros(ix))),
        DType::Int16 => Ok(TensorData::Int16(ArrayD::zeros(ix))),
        DType::Int32 => Ok(TensorData::Int32(ArrayD::zeros(ix))),
        DType::Int64 => Ok(TensorData::Int64(ArrayD::zeros(ix))),
        DType::Uint8 => Ok(TensorData::Uint8(ArrayD::zeros(ix))),
        DType::Float32 => Ok(TensorData::Float32(ArrayD::zeros(ix))),
        other => Err(PartitionError::InvalidConstant(format!(
            "no constant payload for dtype {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_accessors() {
        let zp = scalar_i32(0);
        assert_eq!(zp.dtype(), DType::Int32);
        assert!(zp.shape().is_empty());
        assert_eq!(zp.first_i64().unwrap(), 0);
        assert_eq!(zp.scalar_i64().unwrap(), 0);
        assert_eq!(zp.to_vec_i64().unwrap(), vec![0]);
    }

    #[test]
    fn test_per_channel_vector() {
        let zp = vec_i32(&[0, 0, 5]);
        assert_eq!(zp.shape(), vec![3]);
        assert_eq!(zp.to_vec_i64().unwrap(), vec![0, 0, 5]);
        assert_eq!(zp.first_i64().unwrap(), 0);
        assert!(zp.scalar_i64().is_err());
    }

    #[test]
    fn test_float_rejected_for_integer_access() {
        let scale = scalar_f32(0.125);
        assert!(matches!(
            scale.first_i64(),
            Err(PartitionError::InvalidConstant(_))
        ));
    }

    #[test]
    fn test_empty_tensor_has_no_first() {
        let empty = filled_i32(&[0], 1);
        assert!(empty.is_empty());
        assert!(empty.first_i64().is_err());
    }

    #[test]
    fn test_zeros() {
        let w = zeros(DType::Int8, &[3, 3, 8, 16]).unwrap();
        assert_eq!(w.dtype(), DType::Int8);
        assert_eq!(w.len(), 3 * 3 * 8 * 16);
        assert!(zeros(DType::Bool, &[1]).is_err());
    }
}
