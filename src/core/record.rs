use crate::core::classifier::{classify_field, ReferenceFactory};
use crate::core::error::AppError;
use crate::core::value::{SourceValue, TargetValue};
use indexmap::IndexMap;
use serde::Serialize;

/// Field holding the legacy unique identifier.
pub const ID_FIELD: &str = "_id";
/// Field whose presence marks a soft-deleted record.
pub const DELETED_AT_FIELD: &str = "dateDeleted";
/// Derived flag written on every target record.
pub const IS_DELETED_FIELD: &str = "isDeleted";

/// Fields never copied, whatever collection they come from.
pub const GLOBAL_SUPPRESSED: &[&str] = &["password", "hash", "salt"];

/// A document as read from the source database.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceRecord {
    pub fields: IndexMap<String, SourceValue>,
}

impl SourceRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<K: Into<String>>(mut self, key: K, value: SourceValue) -> Self {
        self.fields.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&SourceValue> {
        self.fields.get(key)
    }

    /// Legacy identifier as a string, if present and usable as a key.
    pub fn legacy_id(&self) -> Option<String> {
        self.fields.get(ID_FIELD).and_then(SourceValue::as_key)
    }

    pub fn is_deleted(&self) -> bool {
        self.fields
            .get(DELETED_AT_FIELD)
            .map(|value| !value.is_null())
            .unwrap_or(false)
    }
}

impl std::fmt::Display for SourceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", SourceValue::Document(self.fields.clone()))
    }
}

/// A document ready to be written to the target store.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TargetRecord {
    pub fields: IndexMap<String, TargetValue>,
}

impl TargetRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&TargetValue> {
        self.fields.get(key)
    }

    pub fn insert<K: Into<String>>(&mut self, key: K, value: TargetValue) {
        self.fields.insert(key.into(), value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(String, TargetValue)> for TargetRecord {
    fn from_iter<I: IntoIterator<Item = (String, TargetValue)>>(iter: I) -> Self {
        TargetRecord {
            fields: iter.into_iter().collect(),
        }
    }
}

/// Whether `field` is copied into the target record.
pub fn is_projected(field: &str, suppressed: &[&str]) -> bool {
    !field.contains('_') && !GLOBAL_SUPPRESSED.contains(&field) && !suppressed.contains(&field)
}

/// Project a source record into its target shape.
///
/// Drops underscore fields, globally suppressed fields and `suppressed`,
/// converts every remaining value, and always sets `isDeleted`.
pub fn project_record(
    record: &SourceRecord,
    suppressed: &[&str],
    refs: &(impl ReferenceFactory + ?Sized),
) -> Result<TargetRecord, AppError> {
    let mut target = TargetRecord::new();
    for (field, value) in &record.fields {
        if !is_projected(field, suppressed) {
            continue;
        }
        target.insert(field.clone(), classify_field(value, field, refs)?);
    }
    target.insert(IS_DELETED_FIELD, TargetValue::Boolean(record.is_deleted()));
    Ok(target)
}
