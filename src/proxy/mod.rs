//! Upstream forwarding subsystem.
//!
//! # Data Flow
//! ```text
//! admitted request
//!     → rewrite.rs (scheme/host swap, path join, query merge,
//!                   User-Agent normalization, identity header)
//!     → executor.rs (hop-by-hop hygiene, upstream HTTP call)
//!     → response streamed back to the client
//! ```
//!
//! # Design Decisions
//! - The rewriter mutates the request in place; transport mechanics live
//!   entirely behind the ProxyExecutor trait
//! - Connection pooling, streaming and upstream timeouts belong to the
//!   executor's HTTP client, not to the gating policy

pub mod executor;
pub mod rewrite;

pub use executor::{ExecuteError, HyperProxyExecutor, ProxyExecutor};
pub use rewrite::{RequestRewriter, RewriteError};
