//! Detail Values
//!
//! A detail is a single named, typed property value attached to a content
//! node (or to one of its detail collections). Exactly one value is held per
//! detail and its [`DetailKind`] is the discriminator persisted alongside it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::node::NodeId;

/// Discriminator for the value held by a [`Detail`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetailKind {
    Bool,
    Int,
    Double,
    String,
    DateTime,
    Binary,
    Link,
}

impl DetailKind {
    /// Stable string form used by the relational `details.type` column
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailKind::Bool => "bool",
            DetailKind::Int => "int",
            DetailKind::Double => "double",
            DetailKind::String => "string",
            DetailKind::DateTime => "datetime",
            DetailKind::Binary => "binary",
            DetailKind::Link => "link",
        }
    }

    /// Parse the persisted discriminator, returning `None` for unknown tags
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "bool" => Some(DetailKind::Bool),
            "int" => Some(DetailKind::Int),
            "double" => Some(DetailKind::Double),
            "string" => Some(DetailKind::String),
            "datetime" => Some(DetailKind::DateTime),
            "binary" => Some(DetailKind::Binary),
            "link" => Some(DetailKind::Link),
            _ => None,
        }
    }
}

impl fmt::Display for DetailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed detail value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum DetailValue {
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Binary(Vec<u8>),
    /// Reference to another content node by id
    Link(NodeId),
}

impl DetailValue {
    pub fn kind(&self) -> DetailKind {
        match self {
            DetailValue::Bool(_) => DetailKind::Bool,
            DetailValue::Int(_) => DetailKind::Int,
            DetailValue::Double(_) => DetailKind::Double,
            DetailValue::String(_) => DetailKind::String,
            DetailValue::DateTime(_) => DetailKind::DateTime,
            DetailValue::Binary(_) => DetailKind::Binary,
            DetailValue::Link(_) => DetailKind::Link,
        }
    }

    /// Whether this is the zero/empty value of its kind
    ///
    /// `false`, `0`, `0.0`, `""`, an empty blob and a link to node 0 are
    /// empty. Timestamps are never considered empty.
    pub fn is_empty_value(&self) -> bool {
        match self {
            DetailValue::Bool(b) => !b,
            DetailValue::Int(i) => *i == 0,
            DetailValue::Double(d) => *d == 0.0,
            DetailValue::String(s) => s.is_empty(),
            DetailValue::DateTime(_) => false,
            DetailValue::Binary(b) => b.is_empty(),
            DetailValue::Link(id) => *id == 0,
        }
    }
}

/// A single named detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detail {
    pub name: String,
    pub value: DetailValue,
}

impl Detail {
    pub fn new(name: impl Into<String>, value: impl Into<DetailValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn kind(&self) -> DetailKind {
        self.value.kind()
    }
}

/// Conversion between Rust values and [`DetailValue`]
///
/// Implemented for every scalar a detail can hold. `from_detail` returns
/// `None` when the stored kind cannot be represented as `Self`.
pub trait DetailType: Sized {
    fn into_detail(self) -> DetailValue;
    fn from_detail(value: &DetailValue) -> Option<Self>;
}

impl DetailType for bool {
    fn into_detail(self) -> DetailValue {
        DetailValue::Bool(self)
    }

    fn from_detail(value: &DetailValue) -> Option<Self> {
        match value {
            DetailValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl DetailType for i64 {
    fn into_detail(self) -> DetailValue {
        DetailValue::Int(self)
    }

    fn from_detail(value: &DetailValue) -> Option<Self> {
        match value {
            DetailValue::Int(i) => Some(*i),
            _ => None,
        }
    }
}

impl DetailType for i32 {
    fn into_detail(self) -> DetailValue {
        DetailValue::Int(i64::from(self))
    }

    fn from_detail(value: &DetailValue) -> Option<Self> {
        match value {
            DetailValue::Int(i) => i32::try_from(*i).ok(),
            _ => None,
        }
    }
}

impl DetailType for f64 {
    fn into_detail(self) -> DetailValue {
        DetailValue::Double(self)
    }

    fn from_detail(value: &DetailValue) -> Option<Self> {
        match value {
            DetailValue::Double(d) => Some(*d),
            // Widening only; precision loss above 2^53 is accepted
            DetailValue::Int(i) => Some(*i as f64),
            _ => None,
        }
    }
}

impl DetailType for String {
    fn into_detail(self) -> DetailValue {
        DetailValue::String(self)
    }

    fn from_detail(value: &DetailValue) -> Option<Self> {
        match value {
            DetailValue::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl DetailType for DateTime<Utc> {
    fn into_detail(self) -> DetailValue {
        DetailValue::DateTime(self)
    }

    fn from_detail(value: &DetailValue) -> Option<Self> {
        match value {
            DetailValue::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }
}

impl DetailType for Vec<u8> {
    fn into_detail(self) -> DetailValue {
        DetailValue::Binary(self)
    }

    fn from_detail(value: &DetailValue) -> Option<Self> {
        match value {
            DetailValue::Binary(b) => Some(b.clone()),
            _ => None,
        }
    }
}

/// Typed wrapper for a detail that links to another node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeLink(pub NodeId);

impl DetailType for NodeLink {
    fn into_detail(self) -> DetailValue {
        DetailValue::Link(self.0)
    }

    fn from_detail(value: &DetailValue) -> Option<Self> {
        match value {
            DetailValue::Link(id) => Some(NodeLink(*id)),
            _ => None,
        }
    }
}

impl DetailType for Option<NodeLink> {
    fn into_detail(self) -> DetailValue {
        DetailValue::Link(self.map(|l| l.0).unwrap_or(0))
    }

    fn from_detail(value: &DetailValue) -> Option<Self> {
        match value {
            DetailValue::Link(0) => Some(None),
            DetailValue::Link(id) => Some(Some(NodeLink(*id))),
            _ => None,
        }
    }
}

macro_rules! impl_from_detail_type {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for DetailValue {
                fn from(value: $ty) -> Self {
                    value.into_detail()
                }
            }
        )*
    };
}

impl_from_detail_type!(
    bool,
    i64,
    i32,
    f64,
    String,
    DateTime<Utc>,
    Vec<u8>,
    NodeLink,
    Option<NodeLink>,
);

impl From<&str> for DetailValue {
    fn from(value: &str) -> Self {
        DetailValue::String(value.to_string())
    }
}
