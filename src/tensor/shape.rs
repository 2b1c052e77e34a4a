//! Shape and layout utilities
//!
//! Functions for working with tensor shapes and layout strings such as
//! `"NHWC"` or `"HWIO"`.

use crate::error::{PartitionError, PartitionResult};

/// Calculate total number of elements from shape
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Position of a dimension letter inside a layout string
///
/// `layout_index("HWIO", 'O') == Some(3)`.
pub fn layout_index(layout: &str, axis: char) -> Option<usize> {
    layout.chars().position(|c| c == axis)
}

/// Validate that `layout` is a permutation of `expected` (e.g. `"OIHW"`)
pub fn check_layout(layout: &str, expected: &str) -> PartitionResult<()> {
    let mut got: Vec<char> = layout.chars().collect();
    let mut want: Vec<char> = expected.chars().collect();
    got.sort_unstable();
    want.sort_unstable();
    if got == want {
        Ok(())
    } else {
        Err(PartitionError::TypeInference(format!(
            "layout '{layout}' is not a permutation of '{expected}'"
        )))
    }
}

/// Dimension of `shape` at the position of `axis` in `layout`
pub fn dim_of(shape: &[usize], layout: &str, axis: char) -> PartitionResult<usize> {
    let pos = layout_index(layout, axis).ok_or_else(|| {
        PartitionError::TypeInference(format!("layout '{layout}' has no '{axis}' axis"))
    })?;
    shape.get(pos).copied().ok_or_else(|| {
        PartitionError::TypeInference(format!(
            "shape {shape:?} has rank {} but layout '{layout}' needs {}",
            shape.len(),
            layout.len()
        ))
    })
}

/// Expand a padding attribute into `[top, left, bottom, right]`
///
/// Accepts one value (all sides), two values (`[vertical, horizontal]`)
/// or four values.
pub fn expand_padding(padding: &[i64]) -> PartitionResult<[usize; 4]> {
    let to_usize = |v: i64| {
        usize::try_from(v)
            .map_err(|_| PartitionError::TypeInference(format!("negative padding {v}")))
    };
    match padding {
        [] => Ok([0; 4]),
        [p] => {
            let p = to_usize(*p)?;
            Ok([p; 4])
        }
        [h, w] => {
            let (h, w) = (to_usize(*h)?, to_usize(*w)?);
            Ok([h, w, h, w])
        }
        [t, l, b, r] => Ok([to_usize(*t)?, to_usize(*l)?, to_usize(*b)?, to_usize(*r)?]),
        other => Err(PartitionError::TypeInference(format!(
            "padding must have 1, 2 or 4 values, got {}",
            other.len()
        ))),
    }
}

/// Output extent of a strided, dilated window along one axis
pub fn conv_out_dim(
    input: usize,
    kernel: usize,
    stride: usize,
    dilation: usize,
    pad_total: usize,
) -> PartitionResult<usize> {
    if stride == 0 || dilation == 0 || kernel == 0 {
        return Err(PartitionError::TypeInference(
            "kernel, stride and dilation must be positive".to_string(),
        ));
    }
    let effective = dilation * (kernel - 1) + 1;
    let padded = input + pad_total;
    if padded < effective {
        return Err(PartitionError::TypeInference(format!(
            "window {effective} larger than padded input {padded}"
        )));
    }
    Ok((padded - effective) / stride + 1)
}
