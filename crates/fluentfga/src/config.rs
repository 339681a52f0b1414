//! Client configuration.
//!
//! Configuration is layered:
//! 1. Default values
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! Environment variables use the `FGA_` prefix and `__` as the nested key
//! separator, so `FGA_ENGINE__STORE_ID` overrides `engine.store_id`.
//!
//! # Example
//!
//! ```yaml
//! engine:
//!   api_url: http://localhost:8080
//!   store_id: 01HVMMBCMGZNT3SED4Z17ECXCA
//!   authorization_model_id: 01HVMMBD06BHRA5AQ4WYS4MN8S
//! mutation:
//!   disable_transactions: false
//! ```

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "FGA";

/// Client configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct FgaConfig {
    /// Authorization engine connection
    #[serde(default)]
    pub engine: EngineSettings,

    /// Mutation builder behaviour
    #[serde(default)]
    pub mutation: MutationSettings,
}

/// Authorization engine connection settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct EngineSettings {
    /// Base URL of the OpenFGA HTTP API.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Store holding the tuples. Required before any tuple operation.
    pub store_id: Option<String>,

    /// Model to evaluate against. When absent the store's latest model is used.
    pub authorization_model_id: Option<String>,

    /// Bearer token sent with every request.
    pub api_token: Option<String>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            store_id: None,
            authorization_model_id: None,
            api_token: None,
        }
    }
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

/// Mutation builder settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct MutationSettings {
    /// Send writes and deletes as independent requests instead of one atomic
    /// request. Allows a tuple to be added and removed in the same commit.
    #[serde(default)]
    pub disable_transactions: bool,
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

impl FgaConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&FgaConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(env_source())
            .build()?;

        let fga_config: FgaConfig = config.try_deserialize()?;
        fga_config.validate()?;

        Ok(fga_config)
    }

    /// Load configuration from environment variables only.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&FgaConfig::default())?)
            .add_source(env_source())
            .build()?;

        let fga_config: FgaConfig = config.try_deserialize()?;
        fga_config.validate()?;

        Ok(fga_config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        let url = self.engine.api_url.trim();
        if url.is_empty() {
            return Err(invalid("engine.api_url must not be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(invalid(format!(
                "engine.api_url must start with http:// or https://, got: {url}"
            )));
        }

        let optional = [
            ("engine.store_id", &self.engine.store_id),
            (
                "engine.authorization_model_id",
                &self.engine.authorization_model_id,
            ),
            ("engine.api_token", &self.engine.api_token),
        ];
        for (key, value) in optional {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(invalid(format!("{key} must not be blank when set")));
            }
        }

        Ok(())
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

fn invalid(message: impl Into<String>) -> ConfigLoadError {
    ConfigLoadError::Invalid {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_can_load_config_from_yaml_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
engine:
  api_url: "https://fga.example.com"
  store_id: "01HVMMBCMGZNT3SED4Z17ECXCA"
  authorization_model_id: "01HVMMBD06BHRA5AQ4WYS4MN8S"

mutation:
  disable_transactions: true
"#
        )
        .unwrap();

        let config = FgaConfig::load(file.path()).unwrap();

        assert_eq!(config.engine.api_url, "https://fga.example.com");
        assert_eq!(
            config.engine.store_id.as_deref(),
            Some("01HVMMBCMGZNT3SED4Z17ECXCA")
        );
        assert_eq!(
            config.engine.authorization_model_id.as_deref(),
            Some("01HVMMBD06BHRA5AQ4WYS4MN8S")
        );
        assert_eq!(config.engine.api_token, None);
        assert!(config.mutation.disable_transactions);
    }

    #[test]
    #[serial]
    fn test_can_override_config_with_env_vars() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
engine:
  api_url: "http://127.0.0.1:8080"
  store_id: "from-file"
"#
        )
        .unwrap();

        std::env::set_var("FGA_ENGINE__STORE_ID", "from-env");
        std::env::set_var("FGA_MUTATION__DISABLE_TRANSACTIONS", "true");

        let config = FgaConfig::load(file.path());

        std::env::remove_var("FGA_ENGINE__STORE_ID");
        std::env::remove_var("FGA_MUTATION__DISABLE_TRANSACTIONS");

        let config = config.unwrap();
        assert_eq!(config.engine.store_id.as_deref(), Some("from-env"));
        assert_eq!(config.engine.api_url, "http://127.0.0.1:8080");
        assert!(config.mutation.disable_transactions);
    }

    #[test]
    #[serial]
    fn test_from_env_uses_defaults() {
        let config = FgaConfig::from_env().unwrap();
        assert_eq!(config.engine.api_url, "http://localhost:8080");
        assert!(!config.mutation.disable_transactions);
    }

    #[test]
    fn test_config_validation_catches_errors() {
        let mut config = FgaConfig::default();
        config.engine.api_url = "  ".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("engine.api_url"));

        let mut config = FgaConfig::default();
        config.engine.api_url = "localhost:8080".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("http://"));

        for key in ["store_id", "authorization_model_id", "api_token"] {
            let mut config = FgaConfig::default();
            match key {
                "store_id" => config.engine.store_id = Some(" ".to_string()),
                "authorization_model_id" => {
                    config.engine.authorization_model_id = Some(String::new())
                }
                _ => config.engine.api_token = Some("\t".to_string()),
            }
            let err = config.validate().unwrap_err();
            assert!(
                err.to_string().contains(key),
                "error for blank {key} should name it"
            );
        }
    }

    #[test]
    fn test_invalid_config_returns_clear_error() {
        let result = FgaConfig::load("/nonexistent/path/fga.yaml");
        let err = result.unwrap_err();
        assert!(matches!(err, ConfigLoadError::FileNotFound { .. }));
        assert!(err.to_string().contains("not found"));

        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid: yaml: syntax: [").unwrap();
        let err = FgaConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigLoadError::Load(_)));
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FgaConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.api_url, "http://localhost:8080");
        assert_eq!(config.engine.store_id, None);
        assert!(!config.mutation.disable_transactions);
    }
}
