use std::env;
use std::str::FromStr;

/// Typed access to process environment variables.
///
/// Blank values count as unset, so an empty `.env` entry never clobbers a
/// configured value.
pub struct EnvReader;

impl EnvReader {
    /// Trimmed value of `key`, or `None` when unset or blank.
    pub fn string(key: &str) -> Option<String> {
        env::var(key)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// Parsed value of `key`. Unparseable values are logged and ignored.
    pub fn parse<T: FromStr>(key: &str) -> Option<T> {
        let raw = Self::string(key)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(variable = key, value = %raw, "ignoring unparseable environment variable");
                None
            }
        }
    }

    /// Apply `key` onto `target` when set.
    pub fn override_string(key: &str, target: &mut String) {
        if let Some(value) = Self::string(key) {
            *target = value;
        }
    }

    pub fn override_option(key: &str, target: &mut Option<String>) {
        if let Some(value) = Self::string(key) {
            *target = Some(value);
        }
    }
}
