//! Authenticated Reverse-Proxy Gate
//!
//! A session-gated reverse proxy built with Tokio and Axum. Every inbound
//! request is checked against an external session service; requests without
//! a valid session are redirected to the login flow, everything else is
//! rewritten and forwarded to a single upstream.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────┐
//!                      │                   AUTHGATE                    │
//!                      │                                               │
//!   Client Request     │  ┌─────────┐   ┌──────────┐   ┌───────────┐  │
//!   ──────────────────▶│  │  http   │──▶│   gate   │──▶│   proxy   │  │
//!                      │  │ server  │   │  admit   │   │ rewrite + │  │
//!                      │  └─────────┘   └────┬─────┘   │  execute  │──┼──▶ Upstream
//!                      │                     │         └───────────┘  │
//!                      │           302 Found │                        │
//!   ◀──────────────────┼─────────────────────┘   ┌───────────┐        │
//!   Location:          │                         │  session  │        │
//!   /oauth/login       │                         │   store   │────────┼──▶ Session
//!                      │                         └───────────┘        │    Service
//!                      │                                               │
//!                      │  ┌─────────────────────────────────────────┐ │
//!                      │  │          Cross-Cutting Concerns          │ │
//!                      │  │  ┌────────┐ ┌───────────┐ ┌───────────┐ │ │
//!                      │  │  │ config │ │observa-   │ │ lifecycle │ │ │
//!                      │  │  │ reload │ │ bility    │ │ shutdown  │ │ │
//!                      │  │  └────────┘ └───────────┘ └───────────┘ │ │
//!                      │  └─────────────────────────────────────────┘ │
//!                      └──────────────────────────────────────────────┘
//! ```
//!
//! # Decision Flow
//!
//! - Session lookup runs once per request; the result feeds both the gate
//!   decision and the identity header injected toward the upstream.
//! - Paths listed in `session.ignored_paths` bypass the session requirement.
//! - A session-lookup failure never surfaces as an error response; it only
//!   produces the login redirect (or an empty identity header on forward).

// Core subsystems
pub mod config;
pub mod gate;
pub mod http;
pub mod proxy;
pub mod session;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::schema::GateConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
