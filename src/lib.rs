//! Request-dispatch core of a lightweight HTTP framework.
//!
//! Routes are compiled once into an immutable [`RouteTable`]. Each request is
//! resolved to one route, wrapped in a [`Context`], driven through an onion of
//! middleware with [`Context::next`], and committed to its transport by a
//! single [`ResponseBuffer::send`].
//!
//! ```text
//!   Router ──build──▶ RouteTable ──Arc──▶ App
//!                                          │
//!   Request ──▶ resolve ──▶ Context ──▶ global mw → group mw → route mw → handler
//!                                          │
//!                               ResponseBuffer::send ──▶ Transport
//! ```

// Core
pub mod dispatch;
pub mod error;
pub mod routing;

// Collaborators
pub mod cache;
pub mod http;
pub mod middleware;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use cache::{Cache, MemoryCache};
pub use config::AppConfig;
pub use dispatch::{
    from_fn, App, Context, Cookie, HandlerResult, Middleware, Outcome, Payload, Request,
    ResponseBuffer, Transport,
};
pub use error::{DispatchError, DispatchResult, RouteError, SendError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{Group, Params, RouteTable, Router, Routes};
