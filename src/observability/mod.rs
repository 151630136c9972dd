//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging via tracing; request ID flows through handler logs
//! - Metrics are cheap (atomic increments), labeled by method, status and
//!   gating outcome

pub mod logging;
pub mod metrics;
