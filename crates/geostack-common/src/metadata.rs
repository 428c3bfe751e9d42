//! Attribute values and metadata dictionaries.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::values::{DataType, Scalar};

/// A single dataset attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Float(f64),
    Text(String),
    Ints(Vec<i64>),
    Floats(Vec<f64>),
}

impl AttrValue {
    /// The text content, if this is a text attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// The numeric value, if this is a single number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Int(v) => Some(*v as f64),
            AttrValue::Float(v) => Some(*v),
            AttrValue::Ints(v) if v.len() == 1 => Some(v[0] as f64),
            AttrValue::Floats(v) if v.len() == 1 => Some(v[0]),
            _ => None,
        }
    }

    /// Interpret this attribute as a scalar of the given element type.
    pub fn to_scalar(&self, dtype: DataType) -> Option<Scalar> {
        match self {
            AttrValue::Int(v) => Scalar::from_i64(*v, dtype),
            AttrValue::Ints(v) if v.len() == 1 => Scalar::from_i64(v[0], dtype),
            other => Scalar::from_f64(other.as_f64()?, dtype),
        }
    }

    /// The element type this attribute was stored with.
    pub fn natural_dtype(&self) -> Option<DataType> {
        match self {
            AttrValue::Int(_) | AttrValue::Ints(_) => Some(DataType::I64),
            AttrValue::Float(_) | AttrValue::Floats(_) => Some(DataType::F64),
            AttrValue::Text(_) => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<Scalar> for AttrValue {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::F32(v) => AttrValue::Float(v as f64),
            Scalar::F64(v) => AttrValue::Float(v),
            Scalar::Bool(v) => AttrValue::Int(v as i64),
            other => match other.as_i64() {
                Some(v) => AttrValue::Int(v),
                None => AttrValue::Float(other.as_f64()),
            },
        }
    }
}

/// Attribute dictionary attached to a dimension, array, layer or stack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    attrs: BTreeMap<String, AttrValue>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    /// Text attribute lookup.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttrValue::as_str)
    }

    /// Numeric attribute lookup.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(AttrValue::as_f64)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.attrs.contains_key(key)
    }

    /// Return a copy with `key` set to `value`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Return a copy without `key`.
    pub fn without(mut self, key: &str) -> Self {
        self.attrs.remove(key);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.attrs.iter()
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl FromIterator<(String, AttrValue)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (String, AttrValue)>>(iter: I) -> Self {
        Self {
            attrs: iter.into_iter().collect(),
        }
    }
}

impl From<BTreeMap<String, AttrValue>> for Metadata {
    fn from(attrs: BTreeMap<String, AttrValue>) -> Self {
        Self { attrs }
    }
}
