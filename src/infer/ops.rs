//! Per-operator type rules

use crate::error::{PartitionError, PartitionResult};
use crate::ir::{get_attr_i, get_attr_ints, get_attr_s, Attrs, Call, Op, TensorType, Type};
use crate::tensor::{check_layout, conv_out_dim, dim_of, expand_padding, layout_index, DType};

/// Output type of a primitive operator call
///
/// `args` holds the checked types of the call's arguments, in order.
pub fn infer_op(op: &Op, call: &Call, args: &[&Type]) -> PartitionResult<Option<Type>> {
    let ty = match op {
        Op::QnnConv2d | Op::Conv2d => {
            infer_conv2d(&call.attrs, tensor_arg(op, args, 0)?, tensor_arg(op, args, 1)?)?
        }
        Op::QnnDense | Op::Dense => {
            infer_dense(&call.attrs, tensor_arg(op, args, 0)?, tensor_arg(op, args, 1)?)?
        }
        Op::BiasAdd => {
            infer_bias_add(&call.attrs, tensor_arg(op, args, 0)?, tensor_arg(op, args, 1)?)?
        }
        Op::Requantize => {
            let data = tensor_arg(op, args, 0)?;
            TensorType::new(out_dtype(&call.attrs, data.dtype)?, data.shape.clone())
        }
        Op::Clip | Op::Relu => tensor_arg(op, args, 0)?.clone(),
        Op::Pad => infer_pad(&call.attrs, tensor_arg(op, args, 0)?)?,
        Op::Custom(_) => return Ok(call.annotation.clone()),
    };
    Ok(Some(Type::Tensor(ty)))
}

fn tensor_arg<'a>(op: &Op, args: &[&'a Type], index: usize) -> PartitionResult<&'a TensorType> {
    args.get(index)
        .ok_or_else(|| {
            PartitionError::TypeInference(format!("{op} is missing argument {index}"))
        })?
        .as_tensor()
        .ok_or_else(|| {
            PartitionError::TypeInference(format!("{op} argument {index} is not a tensor"))
        })
}

/// `out_dtype` attribute, falling back to `default` when empty or absent
pub fn out_dtype(attrs: &Attrs, default: DType) -> PartitionResult<DType> {
    match get_attr_s(attrs, "out_dtype") {
        Some(name) if !name.is_empty() => name.parse(),
        _ => Ok(default),
    }
}

fn positive(value: i64, what: &str) -> PartitionResult<usize> {
    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| PartitionError::TypeInference(format!("{what} must be positive, got {value}")))
}

fn pair(attrs: &Attrs, name: &str) -> PartitionResult<[usize; 2]> {
    match get_attr_ints(attrs, name) {
        None | Some([]) => Ok([1, 1]),
        Some([v]) => {
            let v = positive(*v, name)?;
            Ok([v, v])
        }
        Some([h, w]) => Ok([positive(*h, name)?, positive(*w, name)?]),
        Some(other) => Err(PartitionError::TypeInference(format!(
            "{name} must have 1 or 2 values, got {}",
            other.len()
        ))),
    }
}

fn infer_conv2d(attrs: &Attrs, data: &TensorType, weight: &TensorType) -> PartitionResult<TensorType> {
    let data_layout = get_attr_s(attrs, "data_layout").unwrap_or("NCHW");
    let kernel_layout = get_attr_s(attrs, "kernel_layout").unwrap_or("OIHW");
    check_layout(data_layout, "NCHW")?;
    check_layout(kernel_layout, "OIHW")?;
    if data.rank() != 4 || weight.rank() != 4 {
        return Err(PartitionError::TypeInference(format!(
            "conv2d expects rank-4 data and weight, got {data} and {weight}"
        )));
    }

    let n = dim_of(&data.shape, data_layout, 'N')?;
    let c = dim_of(&data.shape, data_layout, 'C')?;
    let h = dim_of(&data.shape, data_layout, 'H')?;
    let w = dim_of(&data.shape, data_layout, 'W')?;
    let kh = dim_of(&weight.shape, kernel_layout, 'H')?;
    let kw = dim_of(&weight.shape, kernel_layout, 'W')?;
    let ki = dim_of(&weight.shape, kernel_layout, 'I')?;

    let groups = positive(get_attr_i(attrs, "groups").unwrap_or(1), "groups")?;
    if ki * groups != c {
        return Err(PartitionError::TypeInference(format!(
            "conv2d input channels {c} do not match kernel input channels {ki} x groups {groups}"
        )));
    }

    let channels = match get_attr_i(attrs, "channels") {
        Some(ch) if ch > 0 => positive(ch, "channels")?,
        _ => dim_of(&weight.shape, kernel_layout, 'O')?,
    };

    let [sh, sw] = pair(attrs, "strides")?;
    let [dh, dw] = pair(attrs, "dilation")?;
    let [top, left, bottom, right] = expand_padding(get_attr_ints(attrs, "padding").unwrap_or(&[]))?;
    let oh = conv_out_dim(h, kh, sh, dh, top + bottom)?;
    let ow = conv_out_dim(w, kw, sw, dw, left + right)?;

    let mut shape = vec![0; 4];
    for (axis, extent) in [('N', n), ('C', channels), ('H', oh), ('W', ow)] {
        // layout_index is Some for every axis after check_layout
        if let Some(pos) = layout_index(data_layout, axis) {
            shape[pos] = extent;
        }
    }

    Ok(TensorType::new(out_dtype(attrs, data.dtype)?, shape))
}

fn infer_dense(attrs: &Attrs, data: &TensorType, weight: &TensorType) -> PartitionResult<TensorType> {
    let (Some(&k), [units, wk]) = (data.shape.last(), weight.shape.as_slice()) else {
        return Err(PartitionError::TypeInference(format!(
            "dense expects data of rank >= 1 and a rank-2 weight, got {data} and {weight}"
        )));
    };
    if k != *wk {
        return Err(PartitionError::TypeInference(format!(
            "dense reduction axis mismatch: data {data}, weight {weight}"
        )));
    }
    let mut shape = data.shape.clone();
    if let Some(last) = shape.last_mut() {
        *last = *units;
    }
    Ok(TensorType::new(out_dtype(attrs, data.dtype)?, shape))
}

fn infer_bias_add(attrs: &Attrs, data: &TensorType, bias: &TensorType) -> PartitionResult<TensorType> {
    let rank = data.rank() as i64;
    let axis = get_attr_i(attrs, "axis").unwrap_or(1);
    let axis = if axis < 0 { axis + rank } else { axis };
    let extent = usize::try_from(axis)
        .ok()
        .and_then(|a| data.shape.get(a))
        .ok_or_else(|| {
            PartitionError::TypeInference(format!("bias_add axis {axis} out of range for {data}"))
        })?;
    if bias.shape != [*extent] {
        return Err(PartitionError::TypeInference(format!(
            "bias {bias} does not match axis {axis} of {data}"
        )));
    }
    Ok(data.clone())
}

fn infer_pad(attrs: &Attrs, data: &TensorType) -> PartitionResult<TensorType> {
    let pad_width = get_attr_ints(attrs, "pad_width").unwrap_or(&[]);
    if pad_width.len() != 2 * data.rank() {
        return Err(PartitionError::TypeInference(format!(
            "pad_width has {} values, expected {} for {data}",
            pad_width.len(),
            2 * data.rank()
        )));
    }
    let shape = data
        .shape
        .iter()
        .zip(pad_width.chunks_exact(2))
        .map(|(&dim, w)| {
            let grown = i64::try_from(dim)
                .ok()
                .and_then(|d| d.checked_add(w[0]))
                .and_then(|d| d.checked_add(w[1]))
                .ok_or_else(|| {
                    PartitionError::TypeInference(format!("pad_width {w:?} overflows {data}"))
                })?;
            usize::try_from(grown).map_err(|_| {
                PartitionError::TypeInference(format!("padding shrinks {data} below zero"))
            })
        })
        .collect::<PartitionResult<Vec<_>>>()?;
    Ok(TensorType::new(data.dtype, shape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::Conv2dAttrs;
    use crate::ir::{AttrValue, Callee};

    fn call(op: Op, attrs: Attrs) -> Call {
        Call {
            callee: Callee::Op(op),
            args: Default::default(),
            attrs,
            annotation: None,
        }
    }

    #[test]
    fn test_conv2d_nhwc() {
        let attrs = Conv2dAttrs::nhwc()
            .padding(vec![1, 1])
            .out_dtype(DType::Int32)
            .to_attrs();
        let data = Type::tensor(DType::Int8, vec![1, 32, 32, 8]);
        let weight = Type::tensor(DType::Int8, vec![3, 3, 8, 16]);
        let ty = infer_op(&Op::QnnConv2d, &call(Op::QnnConv2d, attrs), &[&data, &weight])
            .unwrap()
            .unwrap();
        assert_eq!(ty, Type::tensor(DType::Int32, vec![1, 32, 32, 16]));
    }

    #[test]
    fn test_conv2d_strided_nchw() {
        let attrs = Conv2dAttrs::default().strides(vec![2, 2]).to_attrs();
        let data = Type::tensor(DType::Float32, vec![1, 3, 9, 9]);
        let weight = Type::tensor(DType::Float32, vec![4, 3, 3, 3]);
        let ty = infer_op(&Op::Conv2d, &call(Op::Conv2d, attrs), &[&data, &weight])
            .unwrap()
            .unwrap();
        assert_eq!(ty, Type::tensor(DType::Float32, vec![1, 4, 4, 4]));
    }

    #[test]
    fn test_depthwise_channels() {
        let attrs = Conv2dAttrs::nhwc().kernel_layout("HWOI").groups(8).to_attrs();
        let data = Type::tensor(DType::Int8, vec![1, 8, 8, 8]);
        let weight = Type::tensor(DType::Int8, vec![3, 3, 8, 1]);
        let ty = infer_op(&Op::QnnConv2d, &call(Op::QnnConv2d, attrs), &[&data, &weight])
            .unwrap()
            .unwrap();
        assert_eq!(ty, Type::tensor(DType::Int8, vec![1, 6, 6, 8]));
    }

    #[test]
    fn test_conv2d_channel_mismatch() {
        let attrs = Conv2dAttrs::nhwc().to_attrs();
        let data = Type::tensor(DType::Int8, vec![1, 8, 8, 4]);
        let weight = Type::tensor(DType::Int8, vec![3, 3, 8, 16]);
        let err = infer_op(&Op::QnnConv2d, &call(Op::QnnConv2d, attrs), &[&data, &weight]);
        assert!(matches!(err, Err(PartitionError::TypeInference(_))));
    }

    #[test]
    fn test_dense() {
        let mut attrs = Attrs::new();
        attrs.insert("units".into(), AttrValue::Int(10));
        attrs.insert("out_dtype".into(), AttrValue::Str("int32".into()));
        let data = Type::tensor(DType::Int8, vec![2, 64]);
        let weight = Type::tensor(DType::Int8, vec![10, 64]);
        let ty = infer_op(&Op::QnnDense, &call(Op::QnnDense, attrs), &[&data, &weight])
            .unwrap()
            .unwrap();
        assert_eq!(ty, Type::tensor(DType::Int32, vec![2, 10]));
    }

    #[test]
    fn test_bias_add_axis() {
        let mut attrs = Attrs::new();
        attrs.insert("axis".into(), AttrValue::Int(-1));
        let data = Type::tensor(DType::Int32, vec![1, 4, 4, 16]);
        let ok = Type::tensor(DType::Int32, vec![16]);
        let bad = Type::tensor(DType::Int32, vec![4]);
        let c = call(Op::BiasAdd, attrs);
        assert_eq!(
            infer_op(&Op::BiasAdd, &c, &[&data, &ok]).unwrap(),
            Some(data.clone())
        );
        assert!(infer_op(&Op::BiasAdd, &c, &[&data, &bad]).is_err());
    }

    #[test]
    fn test_pad() {
        let mut attrs = Attrs::new();
        attrs.insert("pad_width".into(), AttrValue::Ints(vec![0, 0, 1, 1, 2, 2, 0, 0]));
        let data = Type::tensor(DType::Int8, vec![1, 4, 4, 3]);
        let ty = infer_op(&Op::Pad, &call(Op::Pad, attrs), &[&data, &data])
            .unwrap()
            .unwrap();
        assert_eq!(ty, Type::tensor(DType::Int8, vec![1, 6, 8, 3]));
    }

    #[test]
    fn test_pad_width_overflow() {
        let mut attrs = Attrs::new();
        attrs.insert("pad_width".into(), AttrValue::Ints(vec![i64::MAX, 1, 0, 0]));
        let data = Type::tensor(DType::Int8, vec![4, 3]);
        assert!(matches!(
            infer_op(&Op::Pad, &call(Op::Pad, attrs), &[&data, &data]),
            Err(PartitionError::TypeInference(_))
        ));
    }

    #[test]
    fn test_custom_uses_annotation() {
        let op = Op::Custom("concat".into());
        let mut c = call(op.clone(), Attrs::new());
        assert_eq!(infer_op(&op, &c, &[]).unwrap(), None);
        c.annotation = Some(Type::tensor(DType::Int8, vec![2]));
        assert_eq!(
            infer_op(&op, &c, &[]).unwrap(),
            Some(Type::tensor(DType::Int8, vec![2]))
        );
    }
}
