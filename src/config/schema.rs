//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the authenticating gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Upstream target the gate forwards to.
    pub upstream: UpstreamConfig,

    /// Session gating settings.
    pub session: SessionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Upstream target configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Absolute URL of the upstream service. May carry a base path and a
    /// fixed query string; both are merged into every forwarded request.
    pub address: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            address: "http://127.0.0.1:3000".to_string(),
        }
    }
}

/// Session gating configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Require a valid session to forward requests. When false every
    /// request is forwarded, though the identity header is still injected.
    pub require_session: bool,

    /// Header used to carry identity claims to the upstream.
    pub header_name: String,

    /// Paths exempt from the session requirement (exact match).
    pub ignored_paths: Vec<String>,

    /// Endpoint of the external session service.
    pub service_url: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            require_session: true,
            header_name: "X-Forwarded-User".to_string(),
            ignored_paths: Vec::new(),
            service_url: "http://127.0.0.1:4180/session".to_string(),
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,

    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Session lookup timeout in seconds.
    pub session_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            connect_secs: 5,
            session_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
