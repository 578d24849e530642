//! Server settings for mockdir.
//!
//! Settings come from an optional YAML file; every field has a default so
//! an empty file (or no file) is a valid configuration. CLI flags override
//! individual values after loading.

use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read settings file: {0}")]
    Read(#[from] std::io::Error),
    #[error("invalid settings file: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid setting '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: ListenConfig,
    pub response_log: ResponseLogConfig,
    pub scripting: ScriptingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9876,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseLogConfig {
    /// Number of recent responses kept for the admin API (0 disables).
    pub capacity: usize,
}

impl Default for ResponseLogConfig {
    fn default() -> Self {
        Self { capacity: 100 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScriptingConfig {
    /// Share compiled scripts across requests, keyed by preprocessed source.
    pub cache_compiled: bool,
    pub cache_capacity: usize,
    /// Rhai operation limit per evaluation (0 = unlimited).
    pub max_operations: u64,
}

impl Default for ScriptingConfig {
    fn default() -> Self {
        Self {
            cache_compiled: false,
            cache_capacity: 256,
            max_operations: 0,
        }
    }
}

impl ServerConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as null; treat it as all defaults
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ServerConfig = serde_yaml::from_str(contents)?;
        // Port 0 is only meaningful as a command-line override
        if config.listen.port == 0 {
            return Err(ConfigError::Invalid {
                field: "listen.port",
                message: "port must be non-zero".to_string(),
            });
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen.host.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "listen.host",
                message: "host must not be empty".to_string(),
            });
        }
        if self.scripting.cache_compiled && self.scripting.cache_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "scripting.cache_capacity",
                message: "must be non-zero when cache_compiled is enabled".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_yaml("").unwrap();
        assert_eq!(config.listen.host, "127.0.0.1");
        assert_eq!(config.listen.port, 9876);
        assert_eq!(config.response_log.capacity, 100);
        assert!(!config.scripting.cache_compiled);
        assert_eq!(config.scripting.max_operations, 0);
    }

    #[test]
    fn test_partial_file() {
        let yaml = r#"
listen:
  port: 8080
scripting:
  cache_compiled: true
"#;
        let config = ServerConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.listen.host, "127.0.0.1");
        assert_eq!(config.listen.port, 8080);
        assert!(config.scripting.cache_compiled);
        assert_eq!(config.scripting.cache_capacity, 256);
    }

    #[test]
    fn test_zero_port_rejected() {
        let err = ServerConfig::from_yaml("listen:\n  port: 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "listen.port",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_port_override_is_valid() {
        let mut config = ServerConfig::default();
        config.listen.port = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_cache_capacity_rejected() {
        let yaml = "scripting:\n  cache_compiled: true\n  cache_capacity: 0\n";
        assert!(ServerConfig::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            ServerConfig::from_yaml("listen: [unclosed"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mockdir.yaml");
        std::fs::write(&path, "response_log:\n  capacity: 5\n").unwrap();

        let config = ServerConfig::from_file(&path).unwrap();
        assert_eq!(config.response_log.capacity, 5);
    }
}
