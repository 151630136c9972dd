//! Configuration validation.
//!
//! Semantic checks on top of what serde already guarantees syntactically.
//! Validation is a pure function `GateConfig -> Result<(), Vec<ValidationError>>`
//! that collects all errors instead of stopping at the first, and runs
//! before a config is accepted into the system (startup and hot reload).

use std::net::SocketAddr;

use axum::http::header::HeaderName;
use url::Url;

use crate::config::schema::GateConfig;

/// A single semantic configuration error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field (e.g. "upstream.address").
    pub field: &'static str,
    /// Human-readable description of the problem.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a configuration, returning every error found.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError {
            field: "listener.bind_address",
            message: format!("not a valid socket address: {:?}", config.listener.bind_address),
        });
    }

    check_http_url(&mut errors, "upstream.address", &config.upstream.address);
    check_http_url(&mut errors, "session.service_url", &config.session.service_url);

    if HeaderName::from_bytes(config.session.header_name.as_bytes()).is_err() {
        errors.push(ValidationError {
            field: "session.header_name",
            message: format!("not a valid header name: {:?}", config.session.header_name),
        });
    }

    for path in &config.session.ignored_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError {
                field: "session.ignored_paths",
                message: format!("path {:?} must start with '/' to ever match a request", path),
            });
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(zero_timeout("timeouts.request_secs"));
    }
    if config.timeouts.connect_secs == 0 {
        errors.push(zero_timeout("timeouts.connect_secs"));
    }
    if config.timeouts.session_secs == 0 {
        errors.push(zero_timeout("timeouts.session_secs"));
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError {
            field: "observability.log_level",
            message: format!(
                "unknown level {:?}, expected one of {}",
                config.observability.log_level,
                LOG_LEVELS.join(", ")
            ),
        });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError {
            field: "observability.metrics_address",
            message: format!(
                "not a valid socket address: {:?}",
                config.observability.metrics_address
            ),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_http_url(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    match Url::parse(value) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                errors.push(ValidationError {
                    field,
                    message: format!("scheme must be http or https, got {:?}", url.scheme()),
                });
            } else if url.host_str().is_none() {
                errors.push(ValidationError {
                    field,
                    message: "URL has no host".to_string(),
                });
            }
        }
        Err(e) => {
            errors.push(ValidationError {
                field,
                message: format!("not a valid URL: {}", e),
            });
        }
    }
}

fn zero_timeout(field: &'static str) -> ValidationError {
    ValidationError {
        field,
        message: "must be greater than zero".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&GateConfig::default()).is_ok());
    }

    #[test]
    fn test_malformed_upstream_address() {
        let mut config = GateConfig::default();
        config.upstream.address = "not a url".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "upstream.address"));
    }

    #[test]
    fn test_upstream_scheme_must_be_http() {
        let mut config = GateConfig::default();
        config.upstream.address = "ftp://example.com/".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "upstream.address"));
    }

    #[test]
    fn test_invalid_header_name() {
        let mut config = GateConfig::default();
        config.session.header_name = "X Forwarded User".into();

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "session.header_name"));
    }

    #[test]
    fn test_ignored_path_must_be_absolute() {
        let mut config = GateConfig::default();
        config.session.ignored_paths = vec!["/health".into(), "metrics".into()];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "session.ignored_paths");
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = GateConfig::default();
        config.timeouts.request_secs = 0;
        config.timeouts.session_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "timeouts.request_secs"));
        assert!(errors.iter().any(|e| e.field == "timeouts.session_secs"));
    }

    #[test]
    fn test_all_errors_reported_not_just_first() {
        let mut config = GateConfig::default();
        config.listener.bind_address = "nope".into();
        config.upstream.address = "::::".into();
        config.observability.log_level = "loud".into();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_metrics_address_only_checked_when_enabled() {
        let mut config = GateConfig::default();
        config.observability.metrics_address = "nope".into();

        config.observability.metrics_enabled = true;
        assert!(validate_config(&config).is_err());

        config.observability.metrics_enabled = false;
        assert!(validate_config(&config).is_ok());
    }
}
