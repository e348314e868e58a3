//! Process configuration
//!
//! Settings are read once at startup, after the local `.env` file has been
//! merged into the process environment, and are immutable afterwards.

use std::fmt;
use std::path::Path;
use std::sync::OnceLock;

use tracing::info;

use crate::{Error, Result};

/// Credential for the Gemini API
pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
/// Model name override
pub const MODEL_VAR: &str = "GEMINI_MODEL";
/// API root override
pub const BASE_URL_VAR: &str = "GEMINI_BASE_URL";

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

static SETTINGS: OnceLock<Settings> = OnceLock::new();

/// Settings needed to construct a model client
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    /// API key, if one was configured
    pub api_key: Option<String>,
    /// Model name
    pub model: String,
    /// API root, without a trailing slash
    pub base_url: String,
}

impl Settings {
    /// Build settings from an arbitrary variable lookup
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            api_key: get(API_KEY_VAR),
            model: get(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: get(BASE_URL_VAR)
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        }
    }

    /// Build settings from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Get the API key or fail with `MissingCredential`
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::MissingCredential(API_KEY_VAR.to_string()))
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

/// Environment file read at startup, relative to the working directory
pub const ENV_FILE: &str = ".env";

/// Merge exactly `path` into the process environment; parent directories
/// are not searched
///
/// Any failure, including a missing file, is a configuration error.
pub fn load_env_file(path: &Path) -> Result<()> {
    dotenvy::from_path(path)
        .map_err(|e| Error::Config(format!("Failed loading .env file: {}", e)))?;
    info!("Loaded environment from {:?}", path);
    Ok(())
}

/// Load `./.env` and freeze the process settings
pub fn init() -> Result<&'static Settings> {
    init_from(Path::new(ENV_FILE))
}

/// Load `env_file` and freeze the process settings
///
/// Later calls return the settings captured by the first successful call
/// without reading any file.
pub fn init_from(env_file: &Path) -> Result<&'static Settings> {
    if let Some(settings) = SETTINGS.get() {
        return Ok(settings);
    }

    load_env_file(env_file)?;
    let settings = SETTINGS.get_or_init(Settings::from_env);
    info!("Configuration loaded: {:?}", settings);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_overrides() {
        let settings = Settings::from_lookup(lookup(&[
            (API_KEY_VAR, "secret"),
            (MODEL_VAR, "gemini-2.5-pro"),
            (BASE_URL_VAR, "http://127.0.0.1:9000/v1beta/"),
        ]));
        assert_eq!(settings.api_key().unwrap(), "secret");
        assert_eq!(settings.model, "gemini-2.5-pro");
        assert_eq!(settings.base_url, "http://127.0.0.1:9000/v1beta");
    }

    #[test]
    fn test_blank_values_are_unset() {
        let settings = Settings::from_lookup(lookup(&[(API_KEY_VAR, "  "), (MODEL_VAR, "")]));
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn test_missing_api_key() {
        let settings = Settings::from_lookup(lookup(&[]));
        match settings.api_key() {
            Err(Error::MissingCredential(name)) => assert_eq!(name, API_KEY_VAR),
            other => panic!("Expected MissingCredential, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = Settings::from_lookup(lookup(&[(API_KEY_VAR, "super-secret")]));
        let debug = format!("{:?}", settings);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_missing_env_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(ENV_FILE);

        match load_env_file(&missing) {
            Err(Error::Config(message)) => assert!(message.starts_with("Failed loading .env file")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_init_first_success_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(ENV_FILE);
        std::fs::write(&path, "SA_CORE_TEST_LOADED=yes\n").unwrap();

        let first = init_from(&path).unwrap();
        assert_eq!(std::env::var("SA_CORE_TEST_LOADED").as_deref(), Ok("yes"));

        // No file is read once settings are frozen
        let second = init_from(&dir.path().join("missing.env")).unwrap();
        assert!(std::ptr::eq(first, second));
    }
}
