#![allow(clippy::result_large_err)]

use super::{MigrationConfig, CONFIG_FILE_NAME};
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use crate::utils::EnvReader;
use std::path::{Path, PathBuf};

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config from the working directory (`./firemigrate.toml`) or an
    /// explicit file. Environment variables override file values.
    ///
    /// A missing default file is fine; a missing explicit file is an error.
    pub fn load(explicit: Option<&Path>, working_dir: &Path) -> Result<MigrationConfig, AppError> {
        let config_file = match explicit {
            Some(path) => Some(Self::load_from_file(path)?.ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ConfigError,
                    format!("config file {} does not exist", path.display()),
                )
                .with_code("CONFIG-001")
            })?),
            None => Self::load_from_file(&Self::default_path(working_dir))?,
        };

        let mut config = config_file.unwrap_or_default();
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    pub fn default_path(working_dir: &Path) -> PathBuf {
        working_dir.join(CONFIG_FILE_NAME)
    }

    /// Load config from specific file path
    /// Returns Ok(None) if file doesn't exist
    pub fn load_from_file(path: &Path) -> Result<Option<MigrationConfig>, AppError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            AppError::new(
                ErrorCategory::IoError,
                format!("Failed to read config file {}: {}", path.display(), e),
            )
        })?;

        let config: MigrationConfig = toml::from_str(&content).map_err(|e| {
            AppError::new(
                ErrorCategory::ConfigError,
                format!("Failed to parse config file {}: {}", path.display(), e),
            )
            .with_code("CONFIG-002")
        })?;

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(Some(config))
    }

    /// Apply environment variable overrides to the configuration
    fn apply_env_overrides(config: &mut MigrationConfig) {
        EnvReader::override_string("MONGO_HOST", &mut config.mongo.host);
        if let Some(port) = EnvReader::parse::<u16>("MONGO_PORT") {
            config.mongo.port = port;
        }
        EnvReader::override_string("MONGO_DB", &mut config.mongo.database);
        EnvReader::override_option("MONGO_USER", &mut config.mongo.username);
        EnvReader::override_option("MONGO_PASS", &mut config.mongo.password);

        if let Some(cert) = EnvReader::string("FIREBASE_CERT") {
            config.firestore.cert_path = Some(PathBuf::from(cert));
        }
        EnvReader::override_option("FIREBASE_PROJECT_ID", &mut config.firestore.project_id);
        EnvReader::override_string("FIRESTORE_DATABASE", &mut config.firestore.database);
        EnvReader::override_option("FIRESTORE_EMULATOR_HOST", &mut config.firestore.emulator_host);
    }

    /// Get documentation for supported environment variables
    pub fn env_var_documentation() -> &'static [&'static str] {
        &[
            "MONGO_HOST - Source database host (default: localhost rather than empty)",
            "MONGO_PORT - Source database port (default: 27017; 0 leaves the port to the driver)",
            "MONGO_DB - Source database name, also used as the auth database (required)",
            "MONGO_USER - Source database user",
            "MONGO_PASS - Source database password",
            "FIREBASE_CERT - Path to the service account certificate (JSON)",
            "FIREBASE_PROJECT_ID - Target project (default: the certificate's project_id)",
            "FIRESTORE_DATABASE - Target database id (default: (default))",
            "FIRESTORE_EMULATOR_HOST - host:port of a local emulator; disables authentication",
            "FIREMIGRATE_LOG_LEVEL - Default tracing level when RUST_LOG is unset",
            "FIREMIGRATE_LOG_DIR - Directory for firemigrate.log",
        ]
    }
}
