//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID assignment)
//!     → gate handler (session lookup, admit, rewrite, execute)
//!     → redirect or proxied upstream response to the client
//! ```

pub mod request;
pub mod server;

pub use request::{RequestId, RequestIdExt, RequestIdLayer, X_REQUEST_ID};
pub use server::{HttpServer, ServerError};
