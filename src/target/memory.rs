use crate::core::classifier::ReferenceFactory;
use crate::core::error::AppError;
use crate::core::path::DocumentPath;
use crate::core::record::TargetRecord;
use crate::core::types::{ErrorCategory, SortDirection};
use crate::core::value::TargetValue;
use crate::target::{CollectionQuery, DocumentStore, StoredDocument};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// In-process store with Firestore-like ordering semantics.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: Mutex<BTreeMap<DocumentPath, TargetRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a single document.
    pub fn get(&self, path: &str) -> Option<TargetRecord> {
        let path = DocumentPath::parse(path).ok()?;
        self.lock().ok()?.get(&path).cloned()
    }

    /// Every stored path, in path order.
    pub fn paths(&self) -> Vec<String> {
        self.lock()
            .map(|documents| documents.keys().map(ToString::to_string).collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.lock().map(|documents| documents.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<DocumentPath, TargetRecord>>, AppError> {
        self.documents.lock().map_err(|_| {
            AppError::new(ErrorCategory::InternalError, "memory store lock poisoned")
                .with_code("MEMORY-000")
        })
    }
}

impl ReferenceFactory for MemoryStore {
    fn document_ref(&self, path: &str) -> Result<DocumentPath, AppError> {
        DocumentPath::parse(path)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn set(&self, path: &DocumentPath, record: &TargetRecord) -> Result<(), AppError> {
        self.lock()?.insert(path.clone(), record.clone());
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: &TargetRecord) -> Result<(), AppError> {
        let mut documents = self.lock()?;
        let existing = documents.get_mut(path).ok_or_else(|| {
            AppError::new(
                ErrorCategory::TargetError,
                format!("cannot update missing document {}", path),
            )
            .with_code("MEMORY-001")
        })?;
        for (field, value) in &fields.fields {
            existing.insert(field.clone(), value.clone());
        }
        Ok(())
    }

    async fn list(&self, query: &CollectionQuery) -> Result<Vec<StoredDocument>, AppError> {
        let documents = self.lock()?;
        let mut matches: Vec<StoredDocument> = documents
            .iter()
            .filter(|(path, _)| path.collection_path() == query.collection_path)
            .filter(|(_, record)| {
                query
                    .filters
                    .iter()
                    .all(|filter| record.get(&filter.field) == Some(&filter.value))
            })
            .filter(|(_, record)| query.order_by.iter().all(|order| record.contains(&order.field)))
            .map(|(path, record)| StoredDocument {
                path: path.clone(),
                record: record.clone(),
            })
            .collect();

        // Stable sort keeps path order for ties.
        matches.sort_by(|a, b| {
            for order in &query.order_by {
                let (Some(left), Some(right)) = (a.record.get(&order.field), b.record.get(&order.field)) else {
                    continue;
                };
                let ordering = compare_values(left, right);
                let ordering = match order.direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            Ordering::Equal
        });

        if let Some(limit) = query.limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }
}

fn type_rank(value: &TargetValue) -> u8 {
    match value {
        TargetValue::Null => 0,
        TargetValue::Boolean(_) => 1,
        TargetValue::Integer(_) | TargetValue::Double(_) => 2,
        TargetValue::Timestamp(_) => 3,
        TargetValue::String(_) => 4,
        TargetValue::Reference(_) => 5,
        TargetValue::Array(_) => 6,
        TargetValue::Map(_) => 7,
    }
}

/// Cross-type value ordering: null, booleans, numbers, timestamps, strings,
/// references, arrays, maps.
pub fn compare_values(left: &TargetValue, right: &TargetValue) -> Ordering {
    match (left, right) {
        (TargetValue::Boolean(a), TargetValue::Boolean(b)) => a.cmp(b),
        (TargetValue::Integer(a), TargetValue::Integer(b)) => a.cmp(b),
        (TargetValue::Timestamp(a), TargetValue::Timestamp(b)) => a.cmp(b),
        (TargetValue::String(a), TargetValue::String(b)) => a.cmp(b),
        (TargetValue::Reference(a), TargetValue::Reference(b)) => a.cmp(b),
        (TargetValue::Array(a), TargetValue::Array(b)) => {
            for (x, y) in a.iter().zip(b.iter()) {
                let ordering = compare_values(x, y);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            a.len().cmp(&b.len())
        }
        (a, b) if type_rank(a) == 2 && type_rank(b) == 2 => {
            let x = a.as_f64().unwrap_or(f64::NAN);
            let y = b.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (a, b) => type_rank(a).cmp(&type_rank(b)),
    }
}
