//! Upstream call execution.
//!
//! # Responsibilities
//! - Run the rewritten request against the upstream
//! - Strip hop-by-hop headers in both directions
//! - Own connection pooling and connect timeouts
//!
//! # Design Decisions
//! - The trait keeps gating policy decoupled from transport mechanics;
//!   tests substitute a fake engine
//! - Transport failures surface as `ExecuteError` and map to 502 in the
//!   handler; no retries at this layer

use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{self, HeaderMap, HeaderName};
use axum::http::{Request, Response};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

/// Error type for upstream execution.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] hyper_util::client::legacy::Error),
}

/// Proxy execution collaborator.
///
/// Accepts a fully rewritten request and performs the actual upstream HTTP
/// call, streaming the response body back.
#[async_trait]
pub trait ProxyExecutor: Send + Sync {
    async fn execute(&self, req: Request<Body>) -> Result<Response<Body>, ExecuteError>;
}

/// Production executor over the pooled hyper client.
pub struct HyperProxyExecutor {
    client: Client<HttpConnector, Body>,
}

impl HyperProxyExecutor {
    pub fn new(connect_timeout: Duration) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(connect_timeout));

        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

#[async_trait]
impl ProxyExecutor for HyperProxyExecutor {
    async fn execute(&self, mut req: Request<Body>) -> Result<Response<Body>, ExecuteError> {
        strip_hop_by_hop(req.headers_mut());

        let response = self.client.request(req).await?;

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

const HOP_BY_HOP: [HeaderName; 7] = [
    header::CONNECTION,
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Remove hop-by-hop headers, including any named by `Connection`.
fn strip_hop_by_hop(headers: &mut HeaderMap) {
    let connection_named: Vec<HeaderName> = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .filter_map(|token| HeaderName::from_bytes(token.trim().as_bytes()).ok())
        .collect();

    for name in connection_named {
        headers.remove(name);
    }
    for name in HOP_BY_HOP {
        headers.remove(name);
    }
    headers.remove(HeaderName::from_static("keep-alive"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_strips_standard_hop_by_hop_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::UPGRADE, HeaderValue::from_static("websocket"));
        headers.insert(header::HOST, HeaderValue::from_static("example.com"));

        strip_hop_by_hop(&mut headers);

        assert!(!headers.contains_key(header::CONNECTION));
        assert!(!headers.contains_key(header::TRANSFER_ENCODING));
        assert!(!headers.contains_key(header::UPGRADE));
        assert!(headers.contains_key(header::HOST));
    }

    #[test]
    fn test_strips_connection_named_headers() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONNECTION,
            HeaderValue::from_static("close, x-internal-token"),
        );
        headers.insert(
            HeaderName::from_static("x-internal-token"),
            HeaderValue::from_static("secret"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        strip_hop_by_hop(&mut headers);

        assert!(!headers.contains_key("x-internal-token"));
        assert!(!headers.contains_key(header::CONNECTION));
        assert!(headers.contains_key(header::ACCEPT));
    }
}
