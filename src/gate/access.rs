//! Admission decisions for inbound requests.
//!
//! # Responsibilities
//! - Decide per request: forward to upstream, or redirect to login
//! - Exempt configured paths from the session requirement
//! - Treat lookup failures and empty whitelists identically
//!
//! # Design Decisions
//! - Exact path match for exemptions to guarantee O(1) lookup, no regex
//! - Gating never produces an error response; auth failures and missing
//!   sessions both collapse into the same redirect so nothing about
//!   internal state leaks to unauthenticated clients

use std::collections::HashSet;

use crate::session::SessionInfo;

/// Fixed path unauthenticated clients are redirected to.
pub const LOGIN_PATH: &str = "/oauth/login";

/// Outcome of gating a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Hand the request to the rewriter and the upstream executor.
    Forward,
    /// Respond 302 Found toward [`LOGIN_PATH`]; the upstream is never called.
    RedirectToLogin,
}

/// Paths exempt from the session requirement.
#[derive(Debug, Clone, Default)]
pub struct IgnoredPaths {
    paths: HashSet<String>,
}

impl IgnoredPaths {
    pub fn new(paths: impl IntoIterator<Item = String>) -> Self {
        Self {
            paths: paths.into_iter().collect(),
        }
    }

    /// Exact string match only.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

/// Decides whether a request may be forwarded.
#[derive(Debug, Clone)]
pub struct AccessGate {
    require_session: bool,
    ignored: IgnoredPaths,
}

impl AccessGate {
    pub fn new(require_session: bool, ignored_paths: impl IntoIterator<Item = String>) -> Self {
        Self {
            require_session,
            ignored: IgnoredPaths::new(ignored_paths),
        }
    }

    /// Gate one request.
    ///
    /// `session` is `None` when the lookup failed; a successful lookup with
    /// an empty whitelist gates the same way.
    pub fn admit(&self, path: &str, session: Option<&SessionInfo>) -> Decision {
        if !self.require_session {
            return Decision::Forward;
        }
        if self.ignored.contains(path) {
            return Decision::Forward;
        }
        match session {
            Some(info) if !info.is_empty() => Decision::Forward,
            _ => Decision::RedirectToLogin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(whitelisted: &[&str]) -> SessionInfo {
        SessionInfo {
            whitelisted: whitelisted.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_forwards_when_session_not_required() {
        let gate = AccessGate::new(false, []);
        assert_eq!(gate.admit("/private", None), Decision::Forward);
        assert_eq!(gate.admit("/private", Some(&session(&[]))), Decision::Forward);
    }

    #[test]
    fn test_ignored_path_forwards_regardless_of_session() {
        let gate = AccessGate::new(true, ["/health".to_string()]);
        assert_eq!(gate.admit("/health", None), Decision::Forward);
        assert_eq!(gate.admit("/health", Some(&session(&[]))), Decision::Forward);
        assert_eq!(gate.admit("/health", Some(&session(&["a"]))), Decision::Forward);
    }

    #[test]
    fn test_ignored_path_is_exact_match() {
        let gate = AccessGate::new(true, ["/health".to_string()]);
        assert_eq!(gate.admit("/health/live", None), Decision::RedirectToLogin);
        assert_eq!(gate.admit("/Health", None), Decision::RedirectToLogin);
    }

    #[test]
    fn test_lookup_failure_redirects() {
        let gate = AccessGate::new(true, []);
        assert_eq!(gate.admit("/", None), Decision::RedirectToLogin);
    }

    #[test]
    fn test_empty_whitelist_redirects() {
        let gate = AccessGate::new(true, []);
        assert_eq!(gate.admit("/", Some(&session(&[]))), Decision::RedirectToLogin);
    }

    #[test]
    fn test_valid_session_forwards() {
        let gate = AccessGate::new(true, []);
        assert_eq!(gate.admit("/", Some(&session(&["user@example.com"]))), Decision::Forward);
    }
}
