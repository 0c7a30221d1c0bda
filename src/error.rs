//! Error types shared by the routing and dispatch subsystems.
//!
//! # Design Decisions
//! - Template faults are `RouteError` and surface at registration time
//! - Request-time faults are `DispatchError` values propagated through `Context::next`
//! - Short-circuits are not errors: a middleware that stops the chain returns `Ok(())`

use thiserror::Error;

/// Boxed error accepted from application handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised while compiling or registering a route.
#[derive(Debug, Error)]
pub enum RouteError {
    /// A `{` or `}` that does not form a valid `{name}` placeholder.
    #[error("malformed placeholder in route template `{template}` at byte {offset}")]
    MalformedPlaceholder { template: String, offset: usize },

    /// The same placeholder name appears twice in one template.
    #[error("duplicate parameter `{name}` in route template `{template}`")]
    DuplicateParam { template: String, name: String },

    /// The compiled pattern does not capture one group per placeholder.
    #[error("route template `{template}` declares {expected} parameters but its pattern captures {actual}")]
    CaptureMismatch {
        template: String,
        expected: usize,
        actual: usize,
    },

    /// The generated pattern was rejected by the regex engine.
    #[error("invalid route pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Errors raised while a request travels through the middleware chain.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Application handler or middleware failure.
    #[error("handler failed: {0}")]
    Handler(BoxError),

    /// Copying a streamed payload into the response buffer failed.
    #[error("I/O error while writing response: {0}")]
    Io(#[from] std::io::Error),

    /// Structured payload could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A panic caught by the recovery middleware.
    #[error("panic in middleware chain: {0}")]
    Panic(String),
}

impl DispatchError {
    /// Wrap any application error as a handler fault.
    pub fn handler(err: impl Into<BoxError>) -> Self {
        Self::Handler(err.into())
    }
}

/// Errors raised when flushing a response buffer to its transport.
#[derive(Debug, Error)]
pub enum SendError {
    /// `send` was already called for this response.
    #[error("response already sent")]
    AlreadySent,

    /// The underlying transport refused the write.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type for middleware and chain execution.
pub type DispatchResult<T = ()> = Result<T, DispatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RouteError::DuplicateParam {
            template: "/a/{id}/{id}".into(),
            name: "id".into(),
        };
        assert_eq!(
            err.to_string(),
            "duplicate parameter `id` in route template `/a/{id}/{id}`"
        );

        let err = DispatchError::handler("database unreachable");
        assert_eq!(err.to_string(), "handler failed: database unreachable");

        assert_eq!(SendError::AlreadySent.to_string(), "response already sent");
    }
}
