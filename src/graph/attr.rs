//! Attribute values carried by nodes and edges

use super::{EdgeHandle, NodeHandle};
use crate::error::{Error, Result};
use indexmap::IndexMap;
use std::fmt;

/// Insertion-ordered attribute bag of one element
pub type Attrs = IndexMap<String, AttrValue>;

/// Build an [`Attrs`] bag from key/value pairs
pub fn attrs<I, K, V>(pairs: I) -> Attrs
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AttrValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A single attribute value.
///
/// Values are hashable so they can be used as attribute-index buckets, which
/// is why numbers are restricted to integers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<AttrValue>),
    Node(NodeHandle),
    Edge(EdgeHandle),
}

impl AttrValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[AttrValue]> {
        match self {
            AttrValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<NodeHandle> {
        match self {
            AttrValue::Node(n) => Some(*n),
            _ => None,
        }
    }

    /// Only `Bool(true)` counts as a set flag
    pub fn is_true(&self) -> bool {
        matches!(self, AttrValue::Bool(true))
    }

    /// Convert a JSON value from an interchange document.
    ///
    /// `null` maps to `None` (attribute absent).
    pub fn from_json(value: serde_json::Value) -> Result<Option<AttrValue>> {
        use serde_json::Value;

        Ok(Some(match value {
            Value::Null => return Ok(None),
            Value::Bool(b) => AttrValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => AttrValue::Int(i),
                None => {
                    return Err(Error::document(format!(
                        "unsupported non-integer attribute value {}",
                        n
                    )));
                }
            },
            Value::String(s) => AttrValue::Str(s),
            Value::Array(items) => {
                let mut list = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(value) = AttrValue::from_json(item)? {
                        list.push(value);
                    }
                }
                AttrValue::List(list)
            }
            Value::Object(_) => {
                return Err(Error::document("object attribute values are not supported"));
            }
        }))
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(b) => write!(f, "{}", b),
            AttrValue::Int(i) => write!(f, "{}", i),
            AttrValue::Str(s) => write!(f, "{:?}", s),
            AttrValue::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            AttrValue::Node(n) => write!(f, "node#{}", n.index()),
            AttrValue::Edge(e) => write!(f, "edge#{}", e.index()),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(value.into())
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        AttrValue::Str(value.clone())
    }
}

impl From<Vec<AttrValue>> for AttrValue {
    fn from(value: Vec<AttrValue>) -> Self {
        AttrValue::List(value)
    }
}

impl From<NodeHandle> for AttrValue {
    fn from(value: NodeHandle) -> Self {
        AttrValue::Node(value)
    }
}

impl From<EdgeHandle> for AttrValue {
    fn from(value: EdgeHandle) -> Self {
        AttrValue::Edge(value)
    }
}
