//! Firestore target over the public REST API.

pub mod codec;

use crate::core::classifier::ReferenceFactory;
use crate::core::config::FirestoreConfig;
use crate::core::error::AppError;
use crate::core::path::DocumentPath;
use crate::core::record::TargetRecord;
use crate::core::types::{ErrorCategory, SortDirection};
use crate::target::{CollectionQuery, DocumentStore, StoredDocument};
use async_trait::async_trait;
use codec::{decode_query_response, encode_document, encode_value, quote_field_path, ResourceNames};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

pub const PRODUCTION_BASE_URL: &str = "https://firestore.googleapis.com/v1";
pub const DATASTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

/// Characters escaped inside a single path segment.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'/')
    .add(b'?')
    .add(b'#')
    .add(b'%');

#[derive(Debug, Error)]
pub enum FirestoreError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("firestore returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl FirestoreError {
    fn code(&self) -> &'static str {
        match self {
            FirestoreError::Transport(_) => "FIRESTORE-001",
            FirestoreError::Status { .. } => "FIRESTORE-002",
            FirestoreError::Auth(_) => "FIRESTORE-003",
            FirestoreError::Decode(_) => "FIRESTORE-004",
        }
    }
}

impl From<FirestoreError> for AppError {
    fn from(err: FirestoreError) -> Self {
        let code = err.code();
        let category = match err {
            FirestoreError::Decode(_) => ErrorCategory::SerializationError,
            _ => ErrorCategory::TargetError,
        };
        AppError::with_source(category, err.to_string(), Box::new(err)).with_code(code)
    }
}

/// Document store backed by a Firestore database.
pub struct FirestoreStore {
    http: reqwest::Client,
    base_url: String,
    names: ResourceNames,
    auth: Option<Arc<dyn TokenProvider>>,
}

impl FirestoreStore {
    /// Unauthenticated store against `base_url` (emulator or test server).
    pub fn unauthenticated<B: Into<String>>(base_url: B, names: ResourceNames) -> Self {
        FirestoreStore {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            names,
            auth: None,
        }
    }

    /// Build a store from configuration.
    ///
    /// With an emulator host no credentials are used. Otherwise the service
    /// account certificate is required and also supplies the project id when
    /// none is configured.
    pub fn connect(config: &FirestoreConfig) -> Result<Self, AppError> {
        if let Some(host) = &config.emulator_host {
            let project_id = config.project_id.clone().ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ConfigError,
                    "a project id is required when using the Firestore emulator",
                )
                .with_code("FIRESTORE-010")
                .with_suggestion("set FIREBASE_PROJECT_ID")
            })?;
            tracing::info!(host = %host, project = %project_id, "using Firestore emulator");
            return Ok(Self::unauthenticated(
                format!("http://{}/v1", host),
                ResourceNames::new(project_id, &config.database),
            ));
        }

        let cert_path = config.cert_path.as_ref().ok_or_else(|| {
            AppError::new(ErrorCategory::ConfigError, "no service account certificate configured")
                .with_code("FIRESTORE-011")
                .with_suggestion("set FIREBASE_CERT to the path of the service account JSON")
        })?;
        let cert = std::fs::read_to_string(cert_path).map_err(|err| {
            AppError::from(err).with_context(format!("reading {}", cert_path.display()))
        })?;
        let account = CustomServiceAccount::from_json(&cert)
            .map_err(|err| FirestoreError::Auth(err.to_string()))?;

        let project_id = match &config.project_id {
            Some(project_id) => project_id.clone(),
            None => certificate_project_id(&cert)?,
        };
        tracing::info!(project = %project_id, database = %config.database, "using Firestore");

        Ok(FirestoreStore {
            http: reqwest::Client::new(),
            base_url: PRODUCTION_BASE_URL.to_string(),
            names: ResourceNames::new(project_id, &config.database),
            auth: Some(Arc::new(account)),
        })
    }

    pub fn names(&self) -> &ResourceNames {
        &self.names
    }

    fn document_url(&self, path: &DocumentPath) -> String {
        let encoded: Vec<String> = path
            .segments()
            .iter()
            .map(|segment| utf8_percent_encode(segment, PATH_SEGMENT_ENCODE_SET).to_string())
            .collect();
        format!("{}/{}/{}", self.base_url, self.names.documents_root(), encoded.join("/"))
    }

    fn query_url(&self, parent: Option<&DocumentPath>) -> String {
        match parent {
            Some(parent) => format!("{}:runQuery", self.document_url(parent)),
            None => format!("{}/{}:runQuery", self.base_url, self.names.documents_root()),
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, FirestoreError> {
        let request = match &self.auth {
            Some(provider) => {
                let token = provider
                    .token(&[DATASTORE_SCOPE])
                    .await
                    .map_err(|err| FirestoreError::Auth(err.to_string()))?;
                request.bearer_auth(token.as_str())
            }
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FirestoreError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

fn certificate_project_id(cert: &str) -> Result<String, AppError> {
    let parsed: Value = serde_json::from_str(cert).map_err(|err| {
        AppError::with_source(
            ErrorCategory::ConfigError,
            "service account certificate is not valid JSON",
            Box::new(err),
        )
        .with_code("FIRESTORE-012")
    })?;
    parsed
        .get("project_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::new(
                ErrorCategory::ConfigError,
                "service account certificate has no project_id",
            )
            .with_code("FIRESTORE-012")
            .with_suggestion("set FIREBASE_PROJECT_ID")
        })
}

/// Split `games/g1/names` into its parent document and collection id.
fn split_collection_path(collection_path: &str) -> Result<(Option<DocumentPath>, String), AppError> {
    let trimmed = collection_path.trim_matches('/');
    match trimmed.rsplit_once('/') {
        None => Ok((None, trimmed.to_string())),
        Some((parent, collection_id)) => {
            Ok((Some(DocumentPath::parse(parent)?), collection_id.to_string()))
        }
    }
}

impl ReferenceFactory for FirestoreStore {
    fn document_ref(&self, path: &str) -> Result<DocumentPath, AppError> {
        DocumentPath::parse(path)
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn set(&self, path: &DocumentPath, record: &TargetRecord) -> Result<(), AppError> {
        let request = self
            .http
            .patch(self.document_url(path))
            .json(&encode_document(record, &self.names));
        self.send(request)
            .await
            .map_err(|err| AppError::from(err).with_context(format!("set {}", path)))?;
        tracing::debug!(path = %path, fields = record.len(), "document written");
        Ok(())
    }

    async fn update(&self, path: &DocumentPath, fields: &TargetRecord) -> Result<(), AppError> {
        let mut params: Vec<(&str, String)> = fields
            .fields
            .keys()
            .map(|field| ("updateMask.fieldPaths", quote_field_path(field)))
            .collect();
        params.push(("currentDocument.exists", "true".to_string()));

        let request = self
            .http
            .patch(self.document_url(path))
            .query(&params)
            .json(&encode_document(fields, &self.names));
        self.send(request)
            .await
            .map_err(|err| AppError::from(err).with_context(format!("update {}", path)))?;
        tracing::debug!(path = %path, fields = fields.len(), "document updated");
        Ok(())
    }

    async fn list(&self, query: &CollectionQuery) -> Result<Vec<StoredDocument>, AppError> {
        let (parent, collection_id) = split_collection_path(&query.collection_path)?;

        let mut structured = json!({ "from": [{ "collectionId": collection_id }] });
        let filters: Vec<Value> = query
            .filters
            .iter()
            .map(|filter| {
                json!({
                    "fieldFilter": {
                        "field": { "fieldPath": quote_field_path(&filter.field) },
                        "op": "EQUAL",
                        "value": encode_value(&filter.value, &self.names),
                    }
                })
            })
            .collect();
        match filters.len() {
            0 => {}
            1 => structured["where"] = filters[0].clone(),
            _ => {
                structured["where"] = json!({
                    "compositeFilter": { "op": "AND", "filters": filters }
                })
            }
        }
        if !query.order_by.is_empty() {
            let orders: Vec<Value> = query
                .order_by
                .iter()
                .map(|order| {
                    let direction = match order.direction {
                        SortDirection::Ascending => "ASCENDING",
                        SortDirection::Descending => "DESCENDING",
                    };
                    json!({
                        "field": { "fieldPath": quote_field_path(&order.field) },
                        "direction": direction,
                    })
                })
                .collect();
            structured["orderBy"] = Value::Array(orders);
        }
        if let Some(limit) = query.limit {
            structured["limit"] = json!(limit);
        }

        let request = self
            .http
            .post(self.query_url(parent.as_ref()))
            .json(&json!({ "structuredQuery": structured }));
        let context = format!("list {}", query.collection_path);
        let response = self
            .send(request)
            .await
            .map_err(|err| AppError::from(err).with_context(context.clone()))?;
        let body: Value = response
            .json()
            .await
            .map_err(|err| AppError::from(FirestoreError::from(err)).with_context(context.clone()))?;
        let documents = decode_query_response(&body, &self.names)
            .map_err(|err| AppError::from(err).with_context(context))?;
        tracing::debug!(collection = %query.collection_path, count = documents.len(), "collection listed");
        Ok(documents)
    }
}
