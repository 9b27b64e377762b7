//! Hierarchical document stores that migrated records are written into.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::MemoryStore;

use crate::core::classifier::ReferenceFactory;
use crate::core::error::AppError;
use crate::core::path::DocumentPath;
use crate::core::record::TargetRecord;
use crate::core::types::SortDirection;
use crate::core::value::TargetValue;
use async_trait::async_trait;

/// Ordering clause for a collection scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn descending<T: Into<String>>(field: T) -> Self {
        OrderBy {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }
}

/// Equality filter: only documents whose `field` equals `value` match.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: TargetValue,
}

/// Collection scan: every document directly under `collection_path`.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionQuery {
    /// Slash separated collection path, e.g. `games` or `games/g1/names`.
    pub collection_path: String,
    pub filters: Vec<FieldFilter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<usize>,
}

impl CollectionQuery {
    pub fn all<T: Into<String>>(collection_path: T) -> Self {
        CollectionQuery {
            collection_path: collection_path.into(),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn where_equal<T: Into<String>>(mut self, field: T, value: TargetValue) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value,
        });
        self
    }

    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A document read back from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub path: DocumentPath,
    pub record: TargetRecord,
}

/// Target document store.
#[async_trait]
pub trait DocumentStore: ReferenceFactory {
    /// Replace whatever is at `path` with `record`.
    async fn set(&self, path: &DocumentPath, record: &TargetRecord) -> Result<(), AppError>;

    /// Merge `fields` into the existing document at `path`.
    async fn update(&self, path: &DocumentPath, fields: &TargetRecord) -> Result<(), AppError>;

    async fn list(&self, query: &CollectionQuery) -> Result<Vec<StoredDocument>, AppError>;
}
