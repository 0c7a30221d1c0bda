//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Routing, dispatch, middleware, server
//!     → logging.rs (structured events via tracing)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (fmt subscriber)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID is attached to every per-request event
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
