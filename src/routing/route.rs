//! Compiled routes.

use std::fmt;
use std::sync::Arc;

use axum::http::Method;

use crate::dispatch::chain::Middleware;
use crate::dispatch::handler::BoxedHandler;
use crate::routing::path::Matcher;

/// A route after compilation: immutable once inserted into a [`RouteTable`].
///
/// [`RouteTable`]: crate::routing::RouteTable
#[derive(Clone)]
pub struct Route {
    /// `None` is the wildcard used by the fallback route.
    method: Option<Method>,
    template: String,
    matcher: Matcher,
    handler: BoxedHandler,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Route {
    pub(crate) fn new(
        method: Option<Method>,
        template: impl Into<String>,
        matcher: Matcher,
        handler: BoxedHandler,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Self {
        Self {
            method,
            template: template.into(),
            matcher,
            handler,
            middleware,
        }
    }

    /// Registered method, or `None` for the wildcard fallback.
    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// The template as registered (after group prefixes were applied).
    pub fn template(&self) -> &str {
        &self.template
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn is_static(&self) -> bool {
        self.matcher.is_static()
    }

    pub fn handler(&self) -> &BoxedHandler {
        &self.handler
    }

    /// Group and route middleware, outermost first.
    pub fn middleware(&self) -> &[Arc<dyn Middleware>] {
        &self.middleware
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.template)
            .field("static", &self.is_static())
            .field("middleware", &self.middleware.len())
            .finish()
    }
}
