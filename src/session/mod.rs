//! Session lookup collaborator.
//!
//! The gate never issues or validates sessions itself; it asks an external
//! session service to resolve each inbound request to a `SessionInfo`. The
//! collaborator is behind the [`SessionStore`] trait so tests can substitute
//! a fake and the production adapter ([`remote::RemoteSessionStore`]) stays
//! a thin HTTP client.

pub mod remote;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use serde::{Deserialize, Serialize};

pub use remote::RemoteSessionStore;

/// Result of a session lookup for one request.
///
/// An empty `whitelisted` list means "no valid session" for gating
/// purposes, even when the lookup itself succeeded.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Granted scopes/identities, in the order the session service returned
    /// them. Joined with commas to form the identity header value.
    #[serde(default)]
    pub whitelisted: Vec<String>,
}

impl SessionInfo {
    /// True when the session grants nothing and gating should treat the
    /// request as unauthenticated.
    pub fn is_empty(&self) -> bool {
        self.whitelisted.is_empty()
    }
}

/// Error type for session lookups.
///
/// Lookup failures are never surfaced to the client as errors; the caller
/// degrades to a login redirect or an empty identity header.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("session service request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("session service returned status {0}")]
    Status(reqwest::StatusCode),
}

/// External session collaborator.
///
/// Must be callable concurrently for disjoint requests.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Resolve the inbound request to session information.
    async fn get_session(&self, req: &Request<Body>) -> Result<SessionInfo, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_info_decodes_whitelist() {
        let info: SessionInfo = serde_json::from_str(r#"{"whitelisted":["a","b"]}"#).unwrap();
        assert_eq!(info.whitelisted, vec!["a", "b"]);
        assert!(!info.is_empty());
    }

    #[test]
    fn test_missing_whitelist_defaults_to_empty() {
        let info: SessionInfo = serde_json::from_str("{}").unwrap();
        assert!(info.is_empty());
    }
}
