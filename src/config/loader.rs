//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use crate::config::schema::GateConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GateConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: GateConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parses_with_defaults() {
        let config: GateConfig = toml::from_str(
            r#"
            [upstream]
            address = "http://10.0.0.5:3000/app"

            [session]
            ignored_paths = ["/health"]
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.address, "http://10.0.0.5:3000/app");
        assert_eq!(config.session.ignored_paths, vec!["/health"]);
        // Untouched sections fall back to defaults.
        assert!(config.session.require_session);
        assert_eq!(config.session.header_name, "X-Forwarded-User");
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/authgate.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
