//! Per-field value conversion: numbers pass through, timestamp strings are
//! parsed, legacy identifiers become document references, everything else is
//! rendered as a string.

use crate::core::error::AppError;
use crate::core::path::DocumentPath;
use crate::core::types::ErrorCategory;
use crate::core::value::{SourceValue, TargetValue};
use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;
use std::sync::OnceLock;

const FRACTIONAL_TIMESTAMP: &str =
    r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}\.[0-9]+";
const WHOLE_SECOND_TIMESTAMP: &str =
    r"^[0-9]{4}-[0-9]{2}-[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}$";

const FRACTIONAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const WHOLE_SECOND_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub const USERS_COLLECTION: &str = "users";
pub const METADATA_COLLECTION: &str = "gamemetadatas";
pub const TAGS_COLLECTION: &str = "tags";
pub const GAMES_COLLECTION: &str = "games";

/// Field names that always point at game metadata documents.
pub const METADATA_FIELDS: &[&str] = &["duration", "playerCount"];

/// Capability that turns a bare `collection/id` path into a reference value.
///
/// Implemented by every target store so references can be validated (and, for
/// remote stores, qualified) the same way documents are addressed.
pub trait ReferenceFactory: Send + Sync {
    fn document_ref(&self, path: &str) -> Result<DocumentPath, AppError>;
}

/// Resolve the target collection for a reference found under `field`.
///
/// Precedence is fixed: `User` substring, metadata field names, `tag`
/// substring, `game` substring, then the field name itself.
pub fn resolve_collection(field: &str) -> &str {
    if field.contains("User") {
        USERS_COLLECTION
    } else if METADATA_FIELDS.contains(&field) {
        METADATA_COLLECTION
    } else if field.contains("tag") {
        TAGS_COLLECTION
    } else if field.contains("game") {
        GAMES_COLLECTION
    } else {
        field
    }
}

/// Convert a single (non-list) source value found under `field`.
pub fn classify_value(
    value: &SourceValue,
    field: &str,
    refs: &(impl ReferenceFactory + ?Sized),
) -> Result<TargetValue, AppError> {
    match value {
        SourceValue::Int(number) => Ok(TargetValue::Integer(*number)),
        SourceValue::Double(number) => Ok(TargetValue::Double(*number)),
        SourceValue::Bool(flag) => Ok(TargetValue::Boolean(*flag)),
        SourceValue::Null => Ok(TargetValue::Null),
        SourceValue::DateTime(when) => Ok(TargetValue::Timestamp(*when)),
        SourceValue::ObjectId(id) => {
            let collection = resolve_collection(field);
            let path = refs.document_ref(&format!("{}/{}", collection, id))?;
            Ok(TargetValue::Reference(path))
        }
        SourceValue::Text(text) => {
            if is_numeric(text) {
                return Ok(TargetValue::String(text.clone()));
            }
            match parse_timestamp(text) {
                Some(parsed) => parsed
                    .map(TargetValue::Timestamp)
                    .map_err(|err| err.with_context(format!("field '{}'", field))),
                None => Ok(TargetValue::String(text.clone())),
            }
        }
        // Firestore arrays cannot hold arrays directly.
        SourceValue::Array(_) | SourceValue::Document(_) => Ok(TargetValue::String(value.to_string())),
    }
}

/// Convert a field value, mapping the scalar converter over list items.
pub fn classify_field(
    value: &SourceValue,
    field: &str,
    refs: &(impl ReferenceFactory + ?Sized),
) -> Result<TargetValue, AppError> {
    match value {
        SourceValue::Array(items) => items
            .iter()
            .map(|item| classify_value(item, field, refs))
            .collect::<Result<Vec<_>, _>>()
            .map(TargetValue::Array),
        scalar => classify_value(scalar, field, refs),
    }
}

/// Returns `None` when `text` is not shaped like a timestamp, and
/// `Some(Err(..))` when it is shaped like one but does not parse.
pub fn parse_timestamp(text: &str) -> Option<Result<DateTime<Utc>, AppError>> {
    let format = if fractional_pattern().is_match(text) {
        FRACTIONAL_FORMAT
    } else if whole_second_pattern().is_match(text) {
        WHOLE_SECOND_FORMAT
    } else {
        return None;
    };

    Some(
        NaiveDateTime::parse_from_str(text, format)
            .map(|naive| naive.and_utc())
            .map_err(|err| {
                AppError::new(
                    ErrorCategory::TimestampError,
                    format!("malformed timestamp '{}': {}", text, err),
                )
                .with_code("CLASSIFY-001")
            }),
    )
}

fn is_numeric(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.parse::<f64>().is_ok()
}

fn fractional_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(FRACTIONAL_TIMESTAMP).expect("timestamp pattern is valid"))
}

fn whole_second_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(WHOLE_SECOND_TIMESTAMP).expect("timestamp pattern is valid"))
}

/// Reference factory that only validates paths, with no store behind it.
pub struct PathOnlyReferences;

impl ReferenceFactory for PathOnlyReferences {
    fn document_ref(&self, path: &str) -> Result<DocumentPath, AppError> {
        DocumentPath::parse(path)
    }
}
