//! Middleware continuation.
//!
//! # Responsibilities
//! - Define the `Middleware` contract shared by global, group and route layers
//! - Adapt plain closures into middleware
//!
//! # Design Decisions
//! - The chain itself is a cursor owned by [`Context`]; a middleware continues
//!   by calling `ctx.next()` and short-circuits by returning without calling it
//! - Middleware runs synchronously inside one request task

use std::sync::Arc;

use crate::dispatch::context::Context;
use crate::error::DispatchResult;

/// One link of the request chain.
///
/// Code before `ctx.next()` runs on the way in, code after it runs on the way
/// out and may rewrite the buffered response.
pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: &mut Context) -> DispatchResult;
}

impl<F> Middleware for F
where
    F: Fn(&mut Context) -> DispatchResult + Send + Sync,
{
    fn handle(&self, ctx: &mut Context) -> DispatchResult {
        self(ctx)
    }
}

/// Wrap a closure as shareable middleware.
pub fn from_fn<F>(f: F) -> Arc<dyn Middleware>
where
    F: Fn(&mut Context) -> DispatchResult + Send + Sync + 'static,
{
    Arc::new(f)
}
