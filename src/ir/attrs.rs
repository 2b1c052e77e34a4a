//! Call attributes
//!
//! Attributes are an ordered `name → value` map. Order is preserved so that
//! printing and comparing graphs is deterministic.

use std::fmt;

use indexmap::IndexMap;

/// Attribute value
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Integer
    Int(i64),
    /// Float
    Float(f64),
    /// String
    Str(String),
    /// Integer list
    Ints(Vec<i64>),
}

impl AttrValue {
    /// Integer payload
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Float payload (integers widen)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer list payload
    pub fn as_ints(&self) -> Option<&[i64]> {
        match self {
            AttrValue::Ints(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Str(s) => write!(f, "\"{s}\""),
            AttrValue::Ints(v) => write!(f, "{v:?}"),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<Vec<i64>> for AttrValue {
    fn from(v: Vec<i64>) -> Self {
        AttrValue::Ints(v)
    }
}

/// Ordered attribute map
pub type Attrs = IndexMap<String, AttrValue>;

/// Get attribute value as i64
pub fn get_attr_i(attrs: &Attrs, name: &str) -> Option<i64> {
    attrs.get(name).and_then(AttrValue::as_int)
}

/// Get attribute value as string
pub fn get_attr_s<'a>(attrs: &'a Attrs, name: &str) -> Option<&'a str> {
    attrs.get(name).and_then(AttrValue::as_str)
}

/// Get attribute value as i64 list
pub fn get_attr_ints<'a>(attrs: &'a Attrs, name: &str) -> Option<&'a [i64]> {
    attrs.get(name).and_then(AttrValue::as_ints)
}
