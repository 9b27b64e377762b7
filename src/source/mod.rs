//! Legacy document databases that records are read from.

pub mod mongo;

pub use mongo::MongoSource;

use crate::core::error::AppError;
use crate::core::record::SourceRecord;
use crate::core::types::ErrorCategory;
use async_trait::async_trait;
use indexmap::IndexMap;

/// Read side of a migration.
#[async_trait]
pub trait SourceDatabase: Send + Sync {
    /// Every collection name in the source database.
    async fn list_collections(&self) -> Result<Vec<String>, AppError>;

    /// Every document in `collection`, in natural order.
    async fn fetch_all(&self, collection: &str) -> Result<Vec<SourceRecord>, AppError>;
}

/// Source held entirely in memory, for dry runs over fixtures and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    collections: IndexMap<String, Vec<SourceRecord>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection<N: Into<String>>(mut self, name: N, records: Vec<SourceRecord>) -> Self {
        self.collections.insert(name.into(), records);
        self
    }
}

#[async_trait]
impl SourceDatabase for MemorySource {
    async fn list_collections(&self) -> Result<Vec<String>, AppError> {
        Ok(self.collections.keys().cloned().collect())
    }

    async fn fetch_all(&self, collection: &str) -> Result<Vec<SourceRecord>, AppError> {
        self.collections.get(collection).cloned().ok_or_else(|| {
            AppError::new(
                ErrorCategory::SourceError,
                format!("collection '{}' does not exist", collection),
            )
            .with_code("SOURCE-404")
        })
    }
}
