#![allow(clippy::result_large_err)]

use super::MigrationConfig;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use std::collections::HashSet;

pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration rules
    pub fn validate(config: &MigrationConfig) -> Result<(), AppError> {
        let mut seen = HashSet::new();
        for collection in &config.migration.collection_order {
            if !seen.insert(collection.as_str()) {
                return Err(invalid(format!(
                    "migration.collection_order lists '{}' more than once",
                    collection
                )));
            }
            if config.migration.blacklist.contains(collection) {
                return Err(invalid(format!(
                    "'{}' is both in migration.collection_order and migration.blacklist",
                    collection
                )));
            }
        }

        if let Some(host) = &config.firestore.emulator_host {
            if host.contains("://") {
                return Err(invalid(format!(
                    "firestore.emulator_host must be host:port without a scheme, got '{}'",
                    host
                ))
                .with_suggestion("e.g. FIRESTORE_EMULATOR_HOST=localhost:8080"));
            }
        }

        if config.firestore.database.trim().is_empty() {
            return Err(invalid("firestore.database cannot be empty"));
        }

        Ok(())
    }
}

fn invalid<T: Into<String>>(message: T) -> AppError {
    AppError::new(ErrorCategory::ConfigError, message).with_code("CONFIG-003")
}
