//! Translation between [`TargetValue`] and the Firestore REST `Value` JSON shape.

use crate::core::path::DocumentPath;
use crate::core::record::TargetRecord;
use crate::core::value::TargetValue;
use crate::target::firestore::FirestoreError;
use crate::target::StoredDocument;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::IndexMap;
use serde_json::{json, Map, Value};

/// Project and database a store addresses, used to build resource names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub project_id: String,
    pub database: String,
}

impl ResourceNames {
    pub fn new<P: Into<String>, D: Into<String>>(project_id: P, database: D) -> Self {
        ResourceNames {
            project_id: project_id.into(),
            database: database.into(),
        }
    }

    /// `projects/{project}/databases/{database}/documents`
    pub fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/{}/documents",
            self.project_id, self.database
        )
    }

    pub fn document_name(&self, path: &DocumentPath) -> String {
        format!("{}/{}", self.documents_root(), path)
    }

    /// Strip the resource prefix from a full document name.
    pub fn relative_path(&self, name: &str) -> Result<DocumentPath, FirestoreError> {
        let root = self.documents_root();
        let relative = name
            .strip_prefix(&root)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                FirestoreError::Decode(format!("document name '{}' is outside {}", name, root))
            })?;
        DocumentPath::parse(relative).map_err(|err| FirestoreError::Decode(err.message))
    }
}

pub fn encode_value(value: &TargetValue, names: &ResourceNames) -> Value {
    match value {
        TargetValue::Null => json!({ "nullValue": null }),
        TargetValue::Boolean(flag) => json!({ "booleanValue": flag }),
        TargetValue::Integer(number) => json!({ "integerValue": number.to_string() }),
        TargetValue::Double(number) => json!({ "doubleValue": encode_double(*number) }),
        TargetValue::String(text) => json!({ "stringValue": text }),
        TargetValue::Timestamp(when) => {
            json!({ "timestampValue": when.to_rfc3339_opts(SecondsFormat::AutoSi, true) })
        }
        TargetValue::Reference(path) => json!({ "referenceValue": names.document_name(path) }),
        TargetValue::Array(items) => {
            let values: Vec<Value> = items.iter().map(|item| encode_value(item, names)).collect();
            json!({ "arrayValue": { "values": values } })
        }
        TargetValue::Map(fields) => json!({ "mapValue": { "fields": encode_map(fields, names) } }),
    }
}

fn encode_double(number: f64) -> Value {
    if number.is_nan() {
        Value::String("NaN".to_string())
    } else if number.is_infinite() && number.is_sign_positive() {
        Value::String("Infinity".to_string())
    } else if number.is_infinite() {
        Value::String("-Infinity".to_string())
    } else {
        json!(number)
    }
}

fn encode_map(fields: &IndexMap<String, TargetValue>, names: &ResourceNames) -> Value {
    let encoded: Map<String, Value> = fields
        .iter()
        .map(|(key, value)| (key.clone(), encode_value(value, names)))
        .collect();
    Value::Object(encoded)
}

/// Request body for a document write: `{"fields": {...}}`.
pub fn encode_document(record: &TargetRecord, names: &ResourceNames) -> Value {
    json!({ "fields": encode_map(&record.fields, names) })
}

pub fn decode_value(value: &Value, names: &ResourceNames) -> Result<TargetValue, FirestoreError> {
    let object = value
        .as_object()
        .ok_or_else(|| FirestoreError::Decode(format!("expected a value object, got {}", value)))?;
    let (kind, inner) = object
        .iter()
        .next()
        .ok_or_else(|| FirestoreError::Decode("empty value object".to_string()))?;

    match kind.as_str() {
        "nullValue" => Ok(TargetValue::Null),
        "booleanValue" => inner
            .as_bool()
            .map(TargetValue::Boolean)
            .ok_or_else(|| malformed(kind, inner)),
        "integerValue" => match inner {
            Value::String(text) => text.parse().map(TargetValue::Integer).map_err(|_| malformed(kind, inner)),
            Value::Number(number) => number.as_i64().map(TargetValue::Integer).ok_or_else(|| malformed(kind, inner)),
            _ => Err(malformed(kind, inner)),
        },
        "doubleValue" => decode_double(inner).map(TargetValue::Double).ok_or_else(|| malformed(kind, inner)),
        "stringValue" => inner
            .as_str()
            .map(|text| TargetValue::String(text.to_string()))
            .ok_or_else(|| malformed(kind, inner)),
        "timestampValue" => inner
            .as_str()
            .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
            .map(|when| TargetValue::Timestamp(when.with_timezone(&Utc)))
            .ok_or_else(|| malformed(kind, inner)),
        "referenceValue" => {
            let name = inner.as_str().ok_or_else(|| malformed(kind, inner))?;
            names.relative_path(name).map(TargetValue::Reference)
        }
        "arrayValue" => {
            let items = match inner.get("values") {
                Some(Value::Array(values)) => values
                    .iter()
                    .map(|item| decode_value(item, names))
                    .collect::<Result<Vec<_>, _>>()?,
                None => Vec::new(),
                Some(_) => return Err(malformed(kind, inner)),
            };
            Ok(TargetValue::Array(items))
        }
        "mapValue" => Ok(TargetValue::Map(decode_fields(inner.get("fields"), names)?)),
        other => Err(FirestoreError::Decode(format!("unsupported value type '{}'", other))),
    }
}

fn decode_double(inner: &Value) -> Option<f64> {
    match inner {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => match text.as_str() {
            "NaN" => Some(f64::NAN),
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            _ => None,
        },
        _ => None,
    }
}

fn decode_fields(
    fields: Option<&Value>,
    names: &ResourceNames,
) -> Result<IndexMap<String, TargetValue>, FirestoreError> {
    match fields {
        None => Ok(IndexMap::new()),
        Some(Value::Object(entries)) => entries
            .iter()
            .map(|(key, value)| Ok((key.clone(), decode_value(value, names)?)))
            .collect(),
        Some(other) => Err(FirestoreError::Decode(format!("expected a fields object, got {}", other))),
    }
}

/// Decode a REST `Document` (`{"name": ..., "fields": {...}}`).
pub fn decode_document(document: &Value, names: &ResourceNames) -> Result<StoredDocument, FirestoreError> {
    let name = document
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| FirestoreError::Decode("document without a name".to_string()))?;
    Ok(StoredDocument {
        path: names.relative_path(name)?,
        record: TargetRecord {
            fields: decode_fields(document.get("fields"), names)?,
        },
    })
}

/// Decode a `runQuery` response; entries carrying only `readTime` are ignored.
pub fn decode_query_response(
    response: &Value,
    names: &ResourceNames,
) -> Result<Vec<StoredDocument>, FirestoreError> {
    let entries = response
        .as_array()
        .ok_or_else(|| FirestoreError::Decode("runQuery response is not an array".to_string()))?;
    entries
        .iter()
        .filter_map(|entry| entry.get("document"))
        .map(|document| decode_document(document, names))
        .collect()
}

/// Quote a field name for use in a field path or update mask.
pub fn quote_field_path(field: &str) -> String {
    let mut chars = field.chars();
    let simple = matches!(chars.next(), Some(first) if first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        field.to_string()
    } else {
        format!("`{}`", field.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn malformed(kind: &str, inner: &Value) -> FirestoreError {
    FirestoreError::Decode(format!("malformed {}: {}", kind, inner))
}
