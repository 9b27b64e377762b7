//! Hierarchical document locators (`collection/doc[/collection/doc...]`).

use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Path of a single document in the target store.
///
/// Always holds an even, non-zero number of segments: collection id, document
/// id, and optionally further collection/document pairs for subcollections.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentPath {
    segments: Vec<String>,
}

impl DocumentPath {
    /// Build a top-level document path.
    pub fn new(collection: &str, id: &str) -> Result<Self, AppError> {
        Self::from_segments(vec![collection.to_string(), id.to_string()])
    }

    /// Parse a bare `a/b/c/d` string. Leading and trailing slashes are ignored.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let trimmed = raw.trim_matches('/');
        let segments = trimmed.split('/').map(str::to_string).collect();
        Self::from_segments(segments)
    }

    fn from_segments(segments: Vec<String>) -> Result<Self, AppError> {
        if segments.is_empty() || segments.len() % 2 != 0 {
            return Err(AppError::new(
                ErrorCategory::ReferenceError,
                format!(
                    "document path '{}' must have an even number of segments",
                    segments.join("/")
                ),
            )
            .with_code("PATH-001"));
        }
        if let Some(bad) = segments
            .iter()
            .find(|segment| segment.is_empty() || segment.contains('/'))
        {
            return Err(AppError::new(
                ErrorCategory::ReferenceError,
                format!(
                    "document path '{}' has an invalid segment '{}'",
                    segments.join("/"),
                    bad
                ),
            )
            .with_code("PATH-002"));
        }
        Ok(DocumentPath { segments })
    }

    /// Path of a document inside a subcollection of this document.
    pub fn child(&self, collection: &str, id: &str) -> Result<Self, AppError> {
        let mut segments = self.segments.clone();
        segments.push(collection.to_string());
        segments.push(id.to_string());
        Self::from_segments(segments)
    }

    /// The document owning this document's collection, if nested.
    pub fn parent(&self) -> Option<DocumentPath> {
        if self.segments.len() <= 2 {
            return None;
        }
        Some(DocumentPath {
            segments: self.segments[..self.segments.len() - 2].to_vec(),
        })
    }

    /// Id of the collection directly containing this document.
    pub fn collection_id(&self) -> &str {
        &self.segments[self.segments.len() - 2]
    }

    /// The document id (last segment).
    pub fn id(&self) -> &str {
        &self.segments[self.segments.len() - 1]
    }

    /// Collection path containing this document, e.g. `games/g1/names`.
    pub fn collection_path(&self) -> String {
        self.segments[..self.segments.len() - 1].join("/")
    }

    /// Number of collection levels; 1 for a top-level document.
    pub fn depth(&self) -> usize {
        self.segments.len() / 2
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

impl fmt::Display for DocumentPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl FromStr for DocumentPath {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocumentPath::parse(s)
    }
}

impl TryFrom<String> for DocumentPath {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        DocumentPath::parse(&value)
    }
}

impl From<DocumentPath> for String {
    fn from(path: DocumentPath) -> Self {
        path.to_string()
    }
}
