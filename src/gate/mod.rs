//! Admission decision subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request + session lookup result
//!     → access.rs (AccessGate::admit)
//!     → Decision::Forward        → rewrite + upstream call
//!     → Decision::RedirectToLogin → 302 Found, Location: /oauth/login
//! ```
//!
//! # Design Decisions
//! - Ignored paths use exact string match; no prefixes, no patterns
//! - Lookup failure and empty whitelist gate identically ("no session")
//! - The redirect target is a fixed constant, not configuration

pub mod access;

pub use access::{AccessGate, Decision, IgnoredPaths, LOGIN_PATH};
