use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV: &str = "NATIVEAPI_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NativeApiConfig {
    pub logging: LoggingConfig,
    pub events: EventsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directive; `NATIVEAPI_LOG` overrides it.
    pub filter: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".into(),
            ansi: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Log every delivered notification at debug level.
    pub log_deliveries: bool,
}

impl NativeApiConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `NATIVEAPI_CONFIG` if set, defaults otherwise.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV) {
            Some(path) if !path.is_empty() => Self::load(&PathBuf::from(path)),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config: NativeApiConfig = toml::from_str("").unwrap();
        assert_eq!(config, NativeApiConfig::default());
        assert_eq!(config.logging.filter, "info");
        assert!(!config.events.log_deliveries);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: NativeApiConfig = toml::from_str(
            r#"
            [events]
            log_deliveries = true
            "#,
        )
        .unwrap();
        assert!(config.events.log_deliveries);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn load_reports_missing_file_with_path() {
        let path = Path::new("/nonexistent/nativeapi.toml");
        let err = NativeApiConfig::load(path).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/nativeapi.toml"));
    }

    #[test]
    fn load_reports_parse_errors() {
        let path = std::env::temp_dir().join(format!("nativeapi-config-{}.toml", std::process::id()));
        std::fs::write(&path, "[logging]\nfilter = 3\n").unwrap();
        let err = NativeApiConfig::load(&path).unwrap_err();
        std::fs::remove_file(&path).ok();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
