use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod loader;
pub mod validation;

pub use loader::ConfigLoader;
pub use validation::ConfigValidator;

/// Default file name looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "firemigrate.toml";

/// Credentials are percent-encoded except for RFC 3986 unreserved characters.
const USERINFO_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Migration configuration loaded from firemigrate.toml
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct MigrationConfig {
    #[serde(default)]
    pub mongo: MongoConfig,

    #[serde(default)]
    pub firestore: FirestoreConfig,

    #[serde(default)]
    pub migration: MigrationSettings,
}

/// Source database connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MongoConfig {
    #[serde(default = "default_mongo_host")]
    pub host: String,

    /// Port 0 leaves the port out of the URI.
    #[serde(default = "default_mongo_port")]
    pub port: u16,

    #[serde(default)]
    pub database: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// Target project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FirestoreConfig {
    /// Service account certificate (JSON key file)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_path: Option<PathBuf>,

    /// Falls back to the certificate's project_id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,

    #[serde(default = "default_database")]
    pub database: String,

    /// `host:port` of a local emulator; disables authentication.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emulator_host: Option<String>,
}

/// Run behaviour
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MigrationSettings {
    /// Collections processed first, in this order.
    #[serde(default = "default_collection_order")]
    pub collection_order: Vec<String>,

    /// Collections never migrated.
    #[serde(default = "default_blacklist")]
    pub blacklist: Vec<String>,

    #[serde(default = "default_post_process")]
    pub post_process: bool,
}

fn default_mongo_host() -> String {
    "localhost".to_string()
}

fn default_mongo_port() -> u16 {
    27017
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_collection_order() -> Vec<String> {
    [
        "users",
        "tags",
        "gamemetadatas",
        "games",
        "names",
        "namevotes",
        "teams",
        "invites",
        "histories",
        "notes",
    ]
    .iter()
    .map(|name| name.to_string())
    .collect()
}

fn default_blacklist() -> Vec<String> {
    ["system.indexes", "contacts", "dbinfos"]
        .iter()
        .map(|name| name.to_string())
        .collect()
}

fn default_post_process() -> bool {
    true
}

impl Default for MongoConfig {
    fn default() -> Self {
        MongoConfig {
            host: default_mongo_host(),
            port: default_mongo_port(),
            database: String::new(),
            username: None,
            password: None,
        }
    }
}

impl Default for FirestoreConfig {
    fn default() -> Self {
        FirestoreConfig {
            cert_path: None,
            project_id: None,
            database: default_database(),
            emulator_host: None,
        }
    }
}

impl Default for MigrationSettings {
    fn default() -> Self {
        MigrationSettings {
            collection_order: default_collection_order(),
            blacklist: default_blacklist(),
            post_process: default_post_process(),
        }
    }
}

impl MongoConfig {
    /// Connection URI assembled from the parts; credentials authenticate
    /// against the configured database.
    pub fn uri(&self) -> String {
        self.build_uri(self.password.as_deref().map(encode_userinfo))
    }

    /// Same as [`uri`](Self::uri) with the password masked, for logs.
    pub fn redacted_uri(&self) -> String {
        self.build_uri(self.password.as_ref().map(|_| "****".to_string()))
    }

    fn build_uri(&self, password: Option<String>) -> String {
        let mut uri = String::from("mongodb://");
        if let Some(username) = self.username.as_deref().filter(|user| !user.is_empty()) {
            uri.push_str(&encode_userinfo(username));
            if let Some(password) = password {
                uri.push(':');
                uri.push_str(&password);
            }
            uri.push('@');
        }
        uri.push_str(&self.host);
        if self.port != 0 {
            uri.push_str(&format!(":{}", self.port));
        }
        uri.push('/');
        if self.username.as_deref().is_some_and(|user| !user.is_empty()) && !self.database.is_empty() {
            uri.push_str(&format!("?authSource={}", encode_userinfo(&self.database)));
        }
        uri
    }
}

fn encode_userinfo(value: &str) -> String {
    utf8_percent_encode(value, USERINFO_ENCODE_SET).to_string()
}
