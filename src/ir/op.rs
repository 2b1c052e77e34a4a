//! Operator vocabulary
//!
//! The operators the partitioner reasons about form a closed enumeration;
//! everything else is carried as [`Op::Custom`]. Pattern matching compares
//! `Op` values, so no string dispatch happens while matching.

use std::fmt;

/// Operator of a call node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Op {
    /// `qnn.conv2d(data, weight, input_zp, kernel_zp, input_scale, kernel_scale)`
    QnnConv2d,
    /// `qnn.dense(data, weight, input_zp, kernel_zp, input_scale, kernel_scale)`
    QnnDense,
    /// `nn.bias_add(data, bias)`
    BiasAdd,
    /// `qnn.requantize(data, input_scale, input_zp, output_scale, output_zp)`
    Requantize,
    /// `clip(data)`
    Clip,
    /// `nn.pad(data, pad_value)`
    Pad,
    /// `nn.conv2d(data, weight)`
    Conv2d,
    /// `nn.dense(data, weight)`
    Dense,
    /// `nn.relu(data)`
    Relu,
    /// Any operator without a dedicated variant
    Custom(String),
}

const CONV2D_ATTRS: &[&str] = &[
    "strides",
    "padding",
    "dilation",
    "groups",
    "channels",
    "kernel_size",
    "data_layout",
    "kernel_layout",
    "out_dtype",
];

const DENSE_ATTRS: &[&str] = &["units", "out_dtype"];

impl Op {
    /// Parse an operator from its textual name
    pub fn from_name(name: &str) -> Op {
        match name {
            "qnn.conv2d" => Op::QnnConv2d,
            "qnn.dense" => Op::QnnDense,
            "nn.bias_add" => Op::BiasAdd,
            "qnn.requantize" => Op::Requantize,
            "clip" => Op::Clip,
            "nn.pad" => Op::Pad,
            "nn.conv2d" => Op::Conv2d,
            "nn.dense" => Op::Dense,
            "nn.relu" => Op::Relu,
            other => Op::Custom(other.to_string()),
        }
    }

    /// Textual name
    pub fn name(&self) -> &str {
        match self {
            Op::QnnConv2d => "qnn.conv2d",
            Op::QnnDense => "qnn.dense",
            Op::BiasAdd => "nn.bias_add",
            Op::Requantize => "qnn.requantize",
            Op::Clip => "clip",
            Op::Pad => "nn.pad",
            Op::Conv2d => "nn.conv2d",
            Op::Dense => "nn.dense",
            Op::Relu => "nn.relu",
            Op::Custom(name) => name,
        }
    }

    /// Number of arguments, `None` for custom operators
    pub fn arity(&self) -> Option<usize> {
        match self {
            Op::QnnConv2d | Op::QnnDense => Some(6),
            Op::Requantize => Some(5),
            Op::BiasAdd | Op::Pad | Op::Conv2d | Op::Dense => Some(2),
            Op::Clip | Op::Relu => Some(1),
            Op::Custom(_) => None,
        }
    }

    /// Attribute names the operator carries, `None` for custom operators
    pub fn attr_schema(&self) -> Option<&'static [&'static str]> {
        match self {
            Op::QnnConv2d | Op::Conv2d => Some(CONV2D_ATTRS),
            Op::QnnDense | Op::Dense => Some(DENSE_ATTRS),
            Op::BiasAdd => Some(&["axis"]),
            Op::Requantize => Some(&["axis", "rounding", "out_dtype"]),
            Op::Clip => Some(&["a_min", "a_max"]),
            Op::Pad => Some(&["pad_width", "pad_mode"]),
            Op::Relu => Some(&[]),
            Op::Custom(_) => None,
        }
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_roundtrip() {
        for op in [
            Op::QnnConv2d,
            Op::QnnDense,
            Op::BiasAdd,
            Op::Requantize,
            Op::Clip,
            Op::Pad,
            Op::Conv2d,
            Op::Dense,
            Op::Relu,
        ] {
            assert_eq!(Op::from_name(op.name()), op);
        }
    }

    #[test]
    fn test_unknown_is_custom() {
        assert_eq!(Op::from_name("add"), Op::Custom("add".to_string()));
        assert_eq!(Op::from_name("add").arity(), None);
    }

    #[test]
    fn test_arity() {
        assert_eq!(Op::QnnConv2d.arity(), Some(6));
        assert_eq!(Op::Requantize.arity(), Some(5));
        assert_eq!(Op::Clip.arity(), Some(1));
    }

    #[test]
    fn test_attr_schema() {
        let conv = Op::QnnConv2d.attr_schema().unwrap();
        assert!(conv.contains(&"groups"));
        assert!(conv.contains(&"kernel_layout"));
        assert!(Op::Custom("x".into()).attr_schema().is_none());
    }
}
