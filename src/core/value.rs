//! Field values on both sides of the migration.

use crate::core::path::DocumentPath;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;

/// A value read from the legacy document database.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceValue {
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    Text(String),
    /// Legacy opaque identifier, stored as its lowercase hex form.
    ObjectId(String),
    DateTime(DateTime<Utc>),
    Array(Vec<SourceValue>),
    Document(IndexMap<String, SourceValue>),
}

impl SourceValue {
    pub fn object_id<T: Into<String>>(hex: T) -> Self {
        SourceValue::ObjectId(hex.into())
    }

    pub fn text<T: Into<String>>(value: T) -> Self {
        SourceValue::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, SourceValue::Null)
    }

    /// Identifier form used when this value keys a document.
    pub fn as_key(&self) -> Option<String> {
        match self {
            SourceValue::Null | SourceValue::Array(_) | SourceValue::Document(_) => None,
            SourceValue::Text(value) if value.is_empty() => None,
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for SourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceValue::Null => write!(f, "None"),
            SourceValue::Bool(value) => write!(f, "{}", value),
            SourceValue::Int(value) => write!(f, "{}", value),
            SourceValue::Double(value) => write!(f, "{}", value),
            SourceValue::Text(value) => write!(f, "{}", value),
            SourceValue::ObjectId(value) => write!(f, "{}", value),
            SourceValue::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S%.6f")),
            SourceValue::Array(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            SourceValue::Document(fields) => {
                write!(f, "{{")?;
                for (index, (key, value)) in fields.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

/// A value ready to be written into the target document store.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TargetValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    Reference(DocumentPath),
    Array(Vec<TargetValue>),
    Map(IndexMap<String, TargetValue>),
}

impl TargetValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            TargetValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&DocumentPath> {
        match self {
            TargetValue::Reference(path) => Some(path),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            TargetValue::Timestamp(value) => Some(value),
            _ => None,
        }
    }

    /// Numeric view used when ranking children by weight.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            TargetValue::Integer(value) => Some(*value as f64),
            TargetValue::Double(value) => Some(*value),
            TargetValue::String(value) => value.trim().parse().ok(),
            _ => None,
        }
    }
}

impl From<&str> for TargetValue {
    fn from(value: &str) -> Self {
        TargetValue::String(value.to_string())
    }
}

impl From<String> for TargetValue {
    fn from(value: String) -> Self {
        TargetValue::String(value)
    }
}

impl From<bool> for TargetValue {
    fn from(value: bool) -> Self {
        TargetValue::Boolean(value)
    }
}

impl From<i64> for TargetValue {
    fn from(value: i64) -> Self {
        TargetValue::Integer(value)
    }
}
