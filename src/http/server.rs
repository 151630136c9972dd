//! HTTP server setup and the gate handler.
//!
//! # Responsibilities
//! - Create the Axum Router with catch-all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Orchestrate per request: session lookup → admit → redirect | rewrite
//!   → upstream execution
//! - Swap in reloaded configurations without dropping in-flight requests
//!
//! # Design Decisions
//! - One session lookup per request; its result feeds both the gate
//!   decision and the identity header
//! - Gate state is an immutable snapshot behind ArcSwap, so a reload is
//!   atomic and no request observes a half-updated config

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, HeaderName, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use url::Url;

use crate::config::GateConfig;
use crate::gate::{AccessGate, Decision, LOGIN_PATH};
use crate::http::request::{RequestIdExt, RequestIdLayer};
use crate::observability::metrics;
use crate::proxy::{HyperProxyExecutor, ProxyExecutor, RequestRewriter, RewriteError};
use crate::session::{RemoteSessionStore, SessionError, SessionStore};

/// Error building the server from a validated configuration.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("invalid URL in configuration: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid identity header name: {0}")]
    HeaderName(#[from] axum::http::header::InvalidHeaderName),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Immutable per-request view of the gate.
///
/// Rebuilt wholesale on config reload and swapped in atomically.
struct GateSnapshot {
    gate: AccessGate,
    rewriter: RequestRewriter,
    sessions: Arc<dyn SessionStore>,
}

impl GateSnapshot {
    fn from_config(config: &GateConfig) -> Result<Self, ServerError> {
        let target = Url::parse(&config.upstream.address)?;
        let header_name = HeaderName::from_bytes(config.session.header_name.as_bytes())?;

        let sessions = RemoteSessionStore::new(
            Url::parse(&config.session.service_url)?,
            Duration::from_secs(config.timeouts.session_secs),
        )?;

        Ok(Self {
            gate: AccessGate::new(
                config.session.require_session,
                config.session.ignored_paths.iter().cloned(),
            ),
            rewriter: RequestRewriter::new(&target, header_name)?,
            sessions: Arc::new(sessions),
        })
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
struct AppState {
    snapshot: Arc<ArcSwap<GateSnapshot>>,
    executor: Arc<dyn ProxyExecutor>,
}

/// HTTP server for the authenticating gate.
pub struct HttpServer {
    router: Router,
    snapshot: Arc<ArcSwap<GateSnapshot>>,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GateConfig) -> Result<Self, ServerError> {
        let snapshot = Arc::new(ArcSwap::from_pointee(GateSnapshot::from_config(&config)?));
        let executor = Arc::new(HyperProxyExecutor::new(Duration::from_secs(
            config.timeouts.connect_secs,
        )));

        let state = AppState {
            snapshot: snapshot.clone(),
            executor,
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, snapshot })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GateConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(gate_handler))
            .route("/", any(gate_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configuration updates arriving on `config_updates` replace the gate
    /// snapshot atomically; an update that fails to build is logged and the
    /// running snapshot stays in place.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let snapshot = self.snapshot.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                match GateSnapshot::from_config(&new_config) {
                    Ok(new_snapshot) => {
                        snapshot.store(Arc::new(new_snapshot));
                        tracing::info!(
                            upstream = %new_config.upstream.address,
                            require_session = new_config.session.require_session,
                            "Gate configuration reloaded"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "Rejected configuration update, keeping current gate"
                        );
                    }
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown requested, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main gate handler.
///
/// Looks up the session once, gates the request, then rewrites and forwards
/// it. A lookup failure is never an error response: it redirects when a
/// session is required and degrades to an empty identity header otherwise.
async fn gate_handler(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
) -> Response {
    let start = Instant::now();
    let request_id = request.request_id().to_string();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();

    let snapshot = state.snapshot.load_full();

    let session = match snapshot.sessions.get_session(&request).await {
        Ok(info) => {
            metrics::record_session_lookup(if info.is_empty() { "miss" } else { "hit" });
            Some(info)
        }
        Err(e) => {
            tracing::warn!(request_id = %request_id, error = %e, "Session lookup failed");
            metrics::record_session_lookup("error");
            None
        }
    };

    match snapshot.gate.admit(&path, session.as_ref()) {
        Decision::RedirectToLogin => {
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                "Redirecting to login"
            );
            metrics::record_request(&method, StatusCode::FOUND.as_u16(), "redirected", start);
            return redirect_to_login();
        }
        Decision::Forward => {}
    }

    append_forwarded_for(&mut request, peer);

    if let Err(e) = snapshot.rewriter.rewrite(&mut request, session.as_ref()) {
        tracing::error!(request_id = %request_id, error = %e, "Failed to rewrite request");
        metrics::record_request(&method, StatusCode::BAD_GATEWAY.as_u16(), "upstream_error", start);
        return (StatusCode::BAD_GATEWAY, "Failed to prepare upstream request").into_response();
    }

    tracing::debug!(
        request_id = %request_id,
        method = %method,
        path = %path,
        target = %request.uri(),
        "Forwarding request"
    );

    match state.executor.execute(request).await {
        Ok(response) => {
            metrics::record_request(&method, response.status().as_u16(), "forwarded", start);
            response.into_response()
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Upstream error");
            metrics::record_request(
                &method,
                StatusCode::BAD_GATEWAY.as_u16(),
                "upstream_error",
                start,
            );
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}

/// 302 Found toward the fixed login path.
fn redirect_to_login() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::FOUND;
    response
        .headers_mut()
        .insert(header::LOCATION, HeaderValue::from_static(LOGIN_PATH));
    response
}

const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Append the peer IP to X-Forwarded-For.
fn append_forwarded_for(request: &mut Request<Body>, peer: SocketAddr) {
    let ip = peer.ip().to_string();
    let value = match request
        .headers()
        .get(X_FORWARDED_FOR)
        .and_then(|v| v.to_str().ok())
    {
        Some(prior) => format!("{}, {}", prior, ip),
        None => ip,
    };
    if let Ok(value) = HeaderValue::from_str(&value) {
        request.headers_mut().insert(X_FORWARDED_FOR, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redirect_is_302_to_login_path() {
        let response = redirect_to_login();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/oauth/login"
        );
    }

    #[test]
    fn test_forwarded_for_set_from_peer() {
        let mut request = Request::builder().body(Body::empty()).unwrap();
        let peer: SocketAddr = "10.1.2.3:55000".parse().unwrap();

        append_forwarded_for(&mut request, peer);

        assert_eq!(request.headers().get(X_FORWARDED_FOR).unwrap(), "10.1.2.3");
    }

    #[test]
    fn test_forwarded_for_appends_to_existing_chain() {
        let mut request = Request::builder()
            .header(X_FORWARDED_FOR, "198.51.100.7")
            .body(Body::empty())
            .unwrap();
        let peer: SocketAddr = "10.1.2.3:55000".parse().unwrap();

        append_forwarded_for(&mut request, peer);

        assert_eq!(
            request.headers().get(X_FORWARDED_FOR).unwrap(),
            "198.51.100.7, 10.1.2.3"
        );
    }
}
