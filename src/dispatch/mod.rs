//! Request dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Request
//!     → App::context (resolve route, assemble chain)
//!     → Context::next (global → group → route middleware → HandlerAdapter)
//!     → ResponseBuffer (status, headers, body held in memory)
//!     → ResponseBuffer::send → Transport (exactly once)
//! ```

pub mod app;
pub mod chain;
pub mod context;
pub mod handler;
pub mod request;
pub mod response;

pub use app::App;
pub use chain::{from_fn, Middleware};
pub use context::Context;
pub use handler::{BoxedHandler, HandlerResult, Outcome, Payload};
pub use request::Request;
pub use response::{Cookie, ResponseBuffer, Transport};
