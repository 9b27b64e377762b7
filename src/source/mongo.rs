use crate::core::config::MongoConfig;
use crate::core::error::AppError;
use crate::core::record::SourceRecord;
use crate::core::types::ErrorCategory;
use crate::core::value::SourceValue;
use crate::source::SourceDatabase;
use async_trait::async_trait;
use chrono::DateTime;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::{Client, Database};

/// MongoDB source database.
pub struct MongoSource {
    database: Database,
}

impl MongoSource {
    pub async fn connect(config: &MongoConfig) -> Result<Self, AppError> {
        let client = Client::with_uri_str(config.uri())
            .await
            .map_err(|err| source_error(err, "SOURCE-001", "connecting to MongoDB"))?;
        tracing::info!(host = %config.host, port = config.port, database = %config.database, "connected to MongoDB");
        Ok(MongoSource {
            database: client.database(&config.database),
        })
    }
}

#[async_trait]
impl SourceDatabase for MongoSource {
    async fn list_collections(&self) -> Result<Vec<String>, AppError> {
        self.database
            .list_collection_names()
            .await
            .map_err(|err| source_error(err, "SOURCE-002", "listing collections"))
    }

    async fn fetch_all(&self, collection: &str) -> Result<Vec<SourceRecord>, AppError> {
        let context = format!("reading collection '{}'", collection);
        let cursor = self
            .database
            .collection::<Document>(collection)
            .find(doc! {})
            .await
            .map_err(|err| source_error(err, "SOURCE-003", &context))?;
        let documents: Vec<Document> = cursor
            .try_collect()
            .await
            .map_err(|err| source_error(err, "SOURCE-003", &context))?;
        Ok(documents.iter().map(convert_document).collect())
    }
}

fn source_error(err: mongodb::error::Error, code: &str, action: &str) -> AppError {
    let suggestion = match err.kind.as_ref() {
        mongodb::error::ErrorKind::Authentication { .. } => {
            Some("check MONGO_USER and MONGO_PASS against the MONGO_DB auth database")
        }
        mongodb::error::ErrorKind::ServerSelection { .. } => {
            Some("check MONGO_HOST and MONGO_PORT and that the server is reachable")
        }
        _ => None,
    };
    let mut error = AppError::with_source(
        ErrorCategory::SourceError,
        format!("{} failed: {}", action, err),
        Box::new(err),
    )
    .with_code(code);
    if let Some(suggestion) = suggestion {
        error = error.with_suggestion(suggestion);
    }
    error
}

pub fn convert_document(document: &Document) -> SourceRecord {
    SourceRecord {
        fields: document
            .iter()
            .map(|(key, value)| (key.clone(), convert_bson(value)))
            .collect(),
    }
}

/// Map a BSON value onto the neutral source model.
///
/// Types with no counterpart keep their BSON display form as text.
pub fn convert_bson(value: &Bson) -> SourceValue {
    match value {
        Bson::Null | Bson::Undefined => SourceValue::Null,
        Bson::Boolean(flag) => SourceValue::Bool(*flag),
        Bson::Int32(number) => SourceValue::Int(i64::from(*number)),
        Bson::Int64(number) => SourceValue::Int(*number),
        Bson::Double(number) => SourceValue::Double(*number),
        Bson::String(text) => SourceValue::Text(text.clone()),
        Bson::ObjectId(id) => SourceValue::ObjectId(id.to_hex()),
        Bson::DateTime(when) => match DateTime::from_timestamp_millis(when.timestamp_millis()) {
            Some(when) => SourceValue::DateTime(when),
            None => SourceValue::Text(when.to_string()),
        },
        Bson::Array(items) => SourceValue::Array(items.iter().map(convert_bson).collect()),
        Bson::Document(inner) => SourceValue::Document(
            inner
                .iter()
                .map(|(key, value)| (key.clone(), convert_bson(value)))
                .collect(),
        ),
        other => SourceValue::Text(other.to_string()),
    }
}
