//! HTTP introspection adapter for the session service.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request};
use url::Url;

use crate::session::{SessionError, SessionInfo, SessionStore};

/// Session store backed by a remote introspection endpoint.
///
/// The request's `Cookie` and `Authorization` headers are forwarded to the
/// session service, which answers with a JSON `SessionInfo`. Any non-success
/// status, transport failure or undecodable body is a lookup failure.
pub struct RemoteSessionStore {
    client: reqwest::Client,
    endpoint: Url,
}

impl RemoteSessionStore {
    /// Create a store pointing at the given introspection endpoint.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, SessionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl SessionStore for RemoteSessionStore {
    // Manually desugared so the `&Request<Body>` (whose body is not `Sync`)
    // is consumed before the boxed future is built, keeping it `Send`.
    fn get_session<'life0, 'life1, 'async_trait>(
        &'life0 self,
        req: &'life1 Request<Body>,
    ) -> Pin<Box<dyn Future<Output = Result<SessionInfo, SessionError>> + Send + 'async_trait>>
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        let mut lookup = self.client.get(self.endpoint.clone());

        // Credentials travel as the client sent them; the session service
        // owns their interpretation.
        if let Some(cookie) = req.headers().get(header::COOKIE) {
            lookup = lookup.header(reqwest::header::COOKIE, cookie.as_bytes());
        }
        if let Some(auth) = req.headers().get(header::AUTHORIZATION) {
            lookup = lookup.header(reqwest::header::AUTHORIZATION, auth.as_bytes());
        }

        Box::pin(async move {
            let response = lookup.send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(SessionError::Status(status));
            }

            let info = response.json::<SessionInfo>().await?;
            Ok(info)
        })
    }
}
