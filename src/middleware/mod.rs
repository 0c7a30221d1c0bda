//! Bundled middleware.
//!
//! # Data Flow
//! ```text
//! Request
//!     → record.rs (access log + metrics, outermost)
//!     → recovery.rs (errors and panics → 500)
//!     → redirect.rs (canonical scheme/host, 308)
//!     → cors.rs (allow headers, preflight 204)
//!     → throttle.rs (per client+path window, 429)
//!     → route middleware → handler
//! ```
//!
//! # Design Decisions
//! - Every layer is plain `Middleware`; order is whatever `App::use_middleware` saw
//! - Short-circuits leave a complete response in the buffer and return `Ok(())`

pub mod cors;
pub mod record;
pub mod recovery;
pub mod redirect;
pub mod throttle;

pub use cors::Cors;
pub use record::Record;
pub use recovery::Recovery;
pub use redirect::Redirect;
pub use throttle::Throttle;
