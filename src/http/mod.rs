//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, body buffering, request view)
//!     → App::handle (routing, middleware chain, handler)
//!     → transport.rs (collect the single flush)
//!     → axum Response → client
//! ```

pub mod server;
pub mod transport;

pub use server::HttpServer;
pub use transport::BufferedTransport;
