//! Operator constructors with complete attribute sets
//!
//! Every known operator is created with its full attribute schema filled in,
//! the same way a frontend would emit it. Attribute-constrained patterns rely
//! on this: a constraint on `groups` can always find the key.

use crate::error::PartitionResult;
use crate::ir::{AttrValue, Attrs, NodeId, Op};
use crate::tensor::DType;

use super::graph::GraphBuilder;

/// Attributes of `qnn.conv2d` / `nn.conv2d`
#[derive(Debug, Clone, PartialEq)]
pub struct Conv2dAttrs {
    /// Window strides `[h, w]`
    pub strides: Vec<i64>,
    /// Padding, 1, 2 or 4 values
    pub padding: Vec<i64>,
    /// Dilation `[h, w]`
    pub dilation: Vec<i64>,
    /// Group count
    pub groups: i64,
    /// Output channels (0 = take from weight)
    pub channels: i64,
    /// Kernel size `[h, w]` (informational)
    pub kernel_size: Vec<i64>,
    /// Data layout, `NCHW` or `NHWC`
    pub data_layout: String,
    /// Kernel layout, a permutation of `OIHW`
    pub kernel_layout: String,
    /// Accumulator dtype (`None` = input dtype)
    pub out_dtype: Option<DType>,
}

impl Default for Conv2dAttrs {
    fn default() -> Self {
        Self {
            strides: vec![1, 1],
            padding: vec![0, 0, 0, 0],
            dilation: vec![1, 1],
            groups: 1,
            channels: 0,
            kernel_size: Vec::new(),
            data_layout: "NCHW".to_string(),
            kernel_layout: "OIHW".to_string(),
            out_dtype: None,
        }
    }
}

impl Conv2dAttrs {
    /// NHWC data with HWIO kernels, the layout quantized frontends emit
    pub fn nhwc() -> Self {
        Self {
            data_layout: "NHWC".to_string(),
            kernel_layout: "HWIO".to_string(),
            ..Self::default()
        }
    }

    /// Set the group count
    pub fn groups(mut self, groups: i64) -> Self {
        self.groups = groups;
        self
    }

    /// Set the accumulator dtype
    pub fn out_dtype(mut self, dtype: DType) -> Self {
        self.out_dtype = Some(dtype);
        self
    }

    /// Set the kernel layout
    pub fn kernel_layout(mut self, layout: &str) -> Self {
        self.kernel_layout = layout.to_string();
        self
    }

    /// Set the padding
    pub fn padding(mut self, padding: Vec<i64>) -> Self {
        self.padding = padding;
        self
    }

    /// Set the strides
    pub fn strides(mut self, strides: Vec<i64>) -> Self {
        self.strides = strides;
        self
    }

    /// Convert into an attribute map
    pub fn to_attrs(&self) -> Attrs {
        let mut attrs = Attrs::new();
        attrs.insert("strides".into(), AttrValue::Ints(self.strides.clone()));
        attrs.insert("padding".into(), AttrValue::Ints(self.padding.clone()));
        attrs.insert("dilation".into(), AttrValue::Ints(self.dilation.clone()));
        attrs.insert("groups".into(), AttrValue::Int(self.groups));
        attrs.insert("channels".into(), AttrValue::Int(self.channels));
        attrs.insert(
            "kernel_size".into(),
            AttrValue::Ints(self.kernel_size.clone()),
        );
        attrs.insert(
            "data_layout".into(),
            AttrValue::Str(self.data_layout.clone()),
        );
        attrs.insert(
            "kernel_layout".into(),
            AttrValue::Str(self.kernel_layout.clone()),
        );
        attrs.insert("out_dtype".into(), dtype_attr(self.out_dtype));
        attrs
    }
}

fn dtype_attr(dtype: Option<DType>) -> AttrValue {
    AttrValue::Str(dtype.map(|d| d.name().to_string()).unwrap_or_default())
}

impl GraphBuilder {
    /// `qnn.conv2d(data, weight, input_zp, kernel_zp, input_scale, kernel_scale)`
    #[allow(clippy::too_many_arguments)]
    pub fn qnn_conv2d(
        &mut self,
        data: NodeId,
        weight: NodeId,
        input_zero_point: NodeId,
        kernel_zero_point: NodeId,
        input_scale: NodeId,
        kernel_scale: NodeId,
        attrs: &Conv2dAttrs,
    ) -> PartitionResult<NodeId> {
        self.call(
            Op::QnnConv2d,
            &[
                data,
                weight,
                input_zero_point,
                kernel_zero_point,
                input_scale,
                kernel_scale,
            ],
            attrs.to_attrs(),
        )
    }

    /// `qnn.dense(data, weight, input_zp, kernel_zp, input_scale, kernel_scale)`
    #[allow(clippy::too_many_arguments)]
    pub fn qnn_dense(
        &mut self,
        data: NodeId,
        weight: NodeId,
        input_zero_point: NodeId,
        kernel_zero_point: NodeId,
        input_scale: NodeId,
        kernel_scale: NodeId,
        units: i64,
        out_dtype: DType,
    ) -> PartitionResult<NodeId> {
        self.call(
            Op::QnnDense,
            &[
                data,
                weight,
                input_zero_point,
                kernel_zero_point,
                input_scale,
                kernel_scale,
            ],
            dense_attrs(units, Some(out_dtype)),
        )
    }

    /// `nn.bias_add(data, bias)`
    pub fn bias_add(&mut self, data: NodeId, bias: NodeId, axis: i64) -> PartitionResult<NodeId> {
        let mut attrs = Attrs::new();
        attrs.insert("axis".into(), AttrValue::Int(axis));
        self.call(Op::BiasAdd, &[data, bias], attrs)
    }

    /// `qnn.requantize(data, input_scale, input_zp, output_scale, output_zp)`
    #[allow(clippy::too_many_arguments)]
    pub fn requantize(
        &mut self,
        data: NodeId,
        input_scale: NodeId,
        input_zero_point: NodeId,
        output_scale: NodeId,
        output_zero_point: NodeId,
        out_dtype: DType,
    ) -> PartitionResult<NodeId> {
        let mut attrs = Attrs::new();
        attrs.insert("axis".into(), AttrValue::Int(-1));
        attrs.insert("rounding".into(), AttrValue::Str("UPWARD".into()));
        attrs.insert("out_dtype".into(), dtype_attr(Some(out_dtype)));
        self.call(
            Op::Requantize,
            &[
                data,
                input_scale,
                input_zero_point,
                output_scale,
                output_zero_point,
            ],
            attrs,
        )
    }

    /// `clip(data)`
    pub fn clip(&mut self, data: NodeId, a_min: f64, a_max: f64) -> PartitionResult<NodeId> {
        let mut attrs = Attrs::new();
        attrs.insert("a_min".into(), AttrValue::Float(a_min));
        attrs.insert("a_max".into(), AttrValue::Float(a_max));
        self.call(Op::Clip, &[data], attrs)
    }

    /// `nn.pad(data, pad_value)`; `pad_width` holds `[before, after]` per axis
    pub fn pad(
        &mut self,
        data: NodeId,
        pad_value: NodeId,
        pad_width: &[[i64; 2]],
    ) -> PartitionResult<NodeId> {
        let mut attrs = Attrs::new();
        attrs.insert(
            "pad_width".into(),
            AttrValue::Ints(pad_width.iter().flatten().copied().collect()),
        );
        attrs.insert("pad_mode".into(), AttrValue::Str("constant".into()));
        self.call(Op::Pad, &[data, pad_value], attrs)
    }

    /// `nn.conv2d(data, weight)`
    pub fn conv2d(
        &mut self,
        data: NodeId,
        weight: NodeId,
        attrs: &Conv2dAttrs,
    ) -> PartitionResult<NodeId> {
        self.call(Op::Conv2d, &[data, weight], attrs.to_attrs())
    }

    /// `nn.dense(data, weight)`
    pub fn dense(&mut self, data: NodeId, weight: NodeId, units: i64) -> PartitionResult<NodeId> {
        self.call(Op::Dense, &[data, weight], dense_attrs(units, None))
    }

    /// `nn.relu(data)`
    pub fn relu(&mut self, data: NodeId) -> PartitionResult<NodeId> {
        self.call(Op::Relu, &[data], Attrs::new())
    }
}

fn dense_attrs(units: i64, out_dtype: Option<DType>) -> Attrs {
    let mut attrs = Attrs::new();
    attrs.insert("units".into(), AttrValue::Int(units));
    attrs.insert("out_dtype".into(), dtype_attr(out_dtype));
    attrs
}
