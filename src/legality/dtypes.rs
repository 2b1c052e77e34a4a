//! Dtype allow-list
//!
//! The accelerator accepts exactly one dtype combination per input dtype:
//!
//! | input | weight | bias | accumulator | output |
//! |-------|--------|------|-------------|--------|
//! | int8  | int8   | int32 | int32      | int8   |
//! | int16 | int8   | int64 | int64      | int16  |

use std::fmt;

use crate::tensor::DType;

/// `(input, weight, bias, core output, pattern output)` dtypes of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DtypeTuple {
    /// Data input of the core operator
    pub input: DType,
    /// Weight of the core operator
    pub weight: DType,
    /// Bias, or the synthesized default when no bias is present
    pub bias: DType,
    /// Accumulator dtype of the core operator
    pub core_out: DType,
    /// Result of the whole matched pattern
    pub output: DType,
}

impl DtypeTuple {
    /// The only accepted tuple for `input`, if any
    pub fn expected_for(input: DType) -> Option<DtypeTuple> {
        let (bias, output) = match input {
            DType::Int8 => (DType::Int32, DType::Int8),
            DType::Int16 => (DType::Int64, DType::Int16),
            _ => return None,
        };
        Some(DtypeTuple {
            input,
            weight: DType::Int8,
            bias,
            core_out: bias,
            output,
        })
    }
}

impl fmt::Display for DtypeTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, {}, {})",
            self.input, self.weight, self.bias, self.core_out, self.output
        )
    }
}

/// Bias dtype assumed when the pattern has no bias layer
pub fn default_bias_dtype(input: DType) -> DType {
    if input == DType::Int8 {
        DType::Int32
    } else {
        DType::Int64
    }
}

/// Check a tuple against the allow-list
pub fn check_dtype_tuple(tuple: &DtypeTuple) -> bool {
    DtypeTuple::expected_for(tuple.input).as_ref() == Some(tuple)
}
