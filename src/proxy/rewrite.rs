//! Request rewriting (the director).
//!
//! # Responsibilities
//! - Point the request at the upstream: scheme and host replaced
//! - Join the upstream base path and the request path with one slash
//! - Prepend the upstream's fixed query string to the request query
//! - Normalize an absent User-Agent to an explicit empty header
//! - Inject the identity header from the session lookup result
//!
//! # Design Decisions
//! - The target URL is parsed once at construction; per-request work is
//!   pure string/URI composition
//! - The identity header is always written, overwriting whatever the
//!   client sent, so it cannot be spoofed by omission
//! - An empty User-Agent suppresses the HTTP client library's default
//!   value instead of letting the upstream fingerprint it

use axum::http::header::{self, HeaderName, HeaderValue, InvalidHeaderValue};
use axum::http::uri::{Authority, InvalidUri, InvalidUriParts, PathAndQuery, Scheme, Uri};
use axum::http::Request;
use url::Url;

use crate::session::SessionInfo;

/// Error type for request rewriting.
#[derive(Debug, thiserror::Error)]
pub enum RewriteError {
    #[error("invalid upstream target: {0}")]
    Target(#[source] InvalidUri),

    #[error("rebuilding the request URI failed: {0}")]
    Uri(#[from] InvalidUri),

    #[error("rebuilding the request URI failed: {0}")]
    UriParts(#[from] InvalidUriParts),

    #[error("identity header value is not representable: {0}")]
    Identity(#[from] InvalidHeaderValue),
}

/// Rewrites admitted requests for forwarding to the upstream.
///
/// Constructed once from the validated upstream URL; `rewrite` is invoked
/// once per forwarded request, immediately before the executor runs it.
#[derive(Debug, Clone)]
pub struct RequestRewriter {
    scheme: Scheme,
    authority: Authority,
    base_path: String,
    base_query: String,
    header_name: HeaderName,
}

impl RequestRewriter {
    /// Build a rewriter targeting `target`, injecting identity claims under
    /// `header_name`.
    pub fn new(target: &Url, header_name: HeaderName) -> Result<Self, RewriteError> {
        let scheme = Scheme::try_from(target.scheme()).map_err(RewriteError::Target)?;

        let host = target.host_str().unwrap_or_default();
        let authority = match target.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };
        let authority = Authority::try_from(authority.as_str()).map_err(RewriteError::Target)?;

        Ok(Self {
            scheme,
            authority,
            base_path: target.path().to_string(),
            base_query: target.query().unwrap_or_default().to_string(),
            header_name,
        })
    }

    /// Rewrite `req` in place for the upstream.
    ///
    /// `session` is the (single) per-request lookup result; `None` means
    /// the lookup failed and the identity header is set to the empty string.
    pub fn rewrite<B>(
        &self,
        req: &mut Request<B>,
        session: Option<&SessionInfo>,
    ) -> Result<(), RewriteError> {
        let path = single_joining_slash(&self.base_path, req.uri().path());
        let query = merge_query(&self.base_query, req.uri().query().unwrap_or_default());
        let path_and_query = if query.is_empty() {
            path
        } else {
            format!("{}?{}", path, query)
        };

        let mut parts = req.uri().clone().into_parts();
        parts.scheme = Some(self.scheme.clone());
        parts.authority = Some(self.authority.clone());
        parts.path_and_query = Some(PathAndQuery::try_from(path_and_query.as_str())?);
        *req.uri_mut() = Uri::from_parts(parts)?;

        if !req.headers().contains_key(header::USER_AGENT) {
            // Explicitly empty, so the client library's default never leaks.
            req.headers_mut()
                .insert(header::USER_AGENT, HeaderValue::from_static(""));
        }

        let identity = match session {
            Some(info) => info.whitelisted.join(","),
            None => String::new(),
        };
        req.headers_mut()
            .insert(self.header_name.clone(), HeaderValue::from_str(&identity)?);

        Ok(())
    }
}

/// Join `a` and `b` with exactly one separating slash.
fn single_joining_slash(a: &str, b: &str) -> String {
    let aslash = a.ends_with('/');
    let bslash = b.starts_with('/');
    match (aslash, bslash) {
        (true, true) => format!("{}{}", a, &b[1..]),
        (false, false) => format!("{}/{}", a, b),
        _ => format!("{}{}", a, b),
    }
}

/// Prepend the upstream's fixed query to the request query.
fn merge_query(target: &str, request: &str) -> String {
    if target.is_empty() || request.is_empty() {
        format!("{}{}", target, request)
    } else {
        format!("{}&{}", target, request)
    }
}
