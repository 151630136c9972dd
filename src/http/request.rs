//! Request ID generation and propagation.
//!
//! # Responsibilities
//! - Assign each inbound request a unique ID (UUID v4) as early as possible
//! - Respect an `x-request-id` the client already carries
//! - Expose the ID to handlers via a request extension
//!
//! # Design Decisions
//! - The ID lives both in the headers (so it travels upstream) and in the
//!   extensions (so handlers never re-parse the header)

use std::task::{Context, Poll};

use axum::http::{HeaderValue, Request};
use tower::{Layer, Service};
use uuid::Uuid;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Request extension holding the correlation ID.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Layer that installs [`RequestIdService`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestIdLayer;

impl<S> Layer<S> for RequestIdLayer {
    type Service = RequestIdService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequestIdService { inner }
    }
}

/// Middleware assigning the request ID.
#[derive(Debug, Clone)]
pub struct RequestIdService<S> {
    inner: S,
}

impl<S, B> Service<Request<B>> for RequestIdService<S>
where
    S: Service<Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<B>) -> Self::Future {
        let id = req
            .headers()
            .get(X_REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        if let Ok(value) = HeaderValue::from_str(&id) {
            req.headers_mut().insert(X_REQUEST_ID, value);
        }
        req.extensions_mut().insert(RequestId(id));

        self.inner.call(req)
    }
}

/// Convenience accessor for the request ID extension.
pub trait RequestIdExt {
    fn request_id(&self) -> &str;
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> &str {
        self.extensions()
            .get::<RequestId>()
            .map(|id| id.0.as_str())
            .unwrap_or("unknown")
    }
}
