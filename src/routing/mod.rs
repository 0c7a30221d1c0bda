//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     template + methods + handler + middleware
//!     → path.rs (normalize, compile to literal or anchored pattern)
//!     → router.rs (apply group prefixes and middleware)
//!     → table.rs (static map or ordered dynamic list per method)
//!     → Router::build freezes the RouteTable
//!
//! Incoming request (method, path):
//!     → static lookup → dynamic scan → fallback
//!     → Return: (Route, Params)
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - Static routes never touch the regex engine
//! - Deterministic: same input always matches same route
//! - First registered dynamic match wins

pub mod path;
pub mod route;
pub mod router;
pub mod table;

pub use route::Route;
pub use router::{Group, Router, Routes};
pub use table::{Params, RouteTable};
