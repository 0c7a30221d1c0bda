//! Per-request state and chain cursor.
//!
//! # Responsibilities
//! - Own the request view, response buffer, route parameters and scratch values
//! - Drive the middleware chain one entry per `next()` call
//!
//! # Design Decisions
//! - The cursor advances before an entry runs, so an entry that calls `next()`
//!   reaches the one after it and never re-enters itself
//! - `next()` past the end of the chain is a no-op
//! - A context belongs to exactly one request task; nothing in it is shared
//!   except the cache handle

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::cache::Cache;
use crate::dispatch::chain::Middleware;
use crate::dispatch::request::Request;
use crate::dispatch::response::ResponseBuffer;
use crate::error::DispatchResult;
use crate::routing::Params;

/// Everything one request needs while it travels through the chain.
pub struct Context {
    request: Request,
    response: ResponseBuffer,
    route: String,
    params: Params,
    values: HashMap<String, Box<dyn Any + Send + Sync>>,
    cache: Arc<dyn Cache>,
    chain: Vec<Arc<dyn Middleware>>,
    cursor: usize,
}

impl Context {
    pub fn new(
        request: Request,
        params: Params,
        cache: Arc<dyn Cache>,
        chain: Vec<Arc<dyn Middleware>>,
    ) -> Self {
        Self {
            request,
            response: ResponseBuffer::new(),
            route: String::new(),
            params,
            values: HashMap::new(),
            cache,
            chain,
            cursor: 0,
        }
    }

    /// Record the template of the matched route.
    pub fn with_route(mut self, template: impl Into<String>) -> Self {
        self.route = template.into();
        self
    }

    /// Template of the matched route; empty if never recorded.
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Run the next chain entry, if any.
    pub fn next(&mut self) -> DispatchResult {
        let Some(entry) = self.chain.get(self.cursor).cloned() else {
            return Ok(());
        };
        self.cursor += 1;
        entry.handle(self)
    }

    /// Entries not yet started.
    pub fn remaining(&self) -> usize {
        self.chain.len() - self.cursor
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> &ResponseBuffer {
        &self.response
    }

    pub fn response_mut(&mut self) -> &mut ResponseBuffer {
        &mut self.response
    }

    /// Path parameter captured by the matched route.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Typed scratch value set by an earlier middleware.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.values.get(key).and_then(|v| v.downcast_ref::<T>())
    }

    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    pub fn cache(&self) -> &dyn Cache {
        self.cache.as_ref()
    }

    /// Fill `{name}` placeholders in `template`.
    ///
    /// Absolute paths are prefixed with the request host; other values
    /// without a scheme get `http://`.
    pub fn url(&self, template: &str, params: &[(&str, &str)]) -> String {
        let mut url = template.to_string();
        for (name, value) in params {
            url = url.replace(&format!("{{{name}}}"), value);
        }

        if url.starts_with("http://") || url.starts_with("https://") {
            return url;
        }
        let scheme = if self.request.is_tls() { "https" } else { "http" };
        match (url.starts_with('/'), self.request.host()) {
            (true, Some(host)) => format!("{scheme}://{host}{url}"),
            (true, None) => url,
            (false, _) => format!("{scheme}://{url}"),
        }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("request_id", &self.request.id())
            .field("path", &self.request.path())
            .field("route", &self.route)
            .field("params", &self.params)
            .field("chain", &self.chain.len())
            .field("cursor", &self.cursor)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use crate::dispatch::chain::from_fn;
    use axum::http::{HeaderMap, HeaderValue, Method};

    fn context(chain: Vec<Arc<dyn Middleware>>) -> Context {
        let mut headers = HeaderMap::new();
        headers.insert("host", HeaderValue::from_static("example.com"));
        let request = Request::new(Method::GET, "/".parse().unwrap(), headers, "");
        Context::new(request, Params::new(), Arc::new(MemoryCache::new()), chain)
    }

    fn tag(label: &'static str) -> Arc<dyn Middleware> {
        from_fn(move |ctx| {
            ctx.response_mut().write_str(label);
            ctx.next()?;
            ctx.response_mut().write_str(&label.to_lowercase());
            Ok(())
        })
    }

    #[test]
    fn test_next_runs_onion_order() {
        let mut ctx = context(vec![tag("A"), tag("B"), tag("C")]);
        ctx.next().unwrap();
        assert_eq!(ctx.response().buffered(), b"ABCcba");
        assert_eq!(ctx.remaining(), 0);
    }

    #[test]
    fn test_short_circuit_skips_rest() {
        let stop = from_fn(|ctx| {
            ctx.response_mut().write_str("stop");
            Ok(())
        });
        let mut ctx = context(vec![tag("A"), stop, tag("C")]);
        ctx.next().unwrap();
        assert_eq!(ctx.response().buffered(), b"Astopa");
        assert_eq!(ctx.remaining(), 1);
    }

    #[test]
    fn test_next_past_end_is_noop() {
        let twice = from_fn(|ctx| {
            ctx.next()?;
            ctx.next()
        });
        let mut ctx = context(vec![twice, tag("X")]);
        ctx.next().unwrap();
        assert_eq!(ctx.response().buffered(), b"Xx");
        ctx.next().unwrap();
        assert_eq!(ctx.response().buffered(), b"Xx");
    }

    #[test]
    fn test_scratch_values_are_typed() {
        let mut ctx = context(vec![]);
        ctx.set("user_id", 42_u64);
        assert_eq!(ctx.get::<u64>("user_id"), Some(&42));
        assert_eq!(ctx.get::<String>("user_id"), None);
        assert_eq!(ctx.get::<u64>("missing"), None);
    }

    #[test]
    fn test_url_fills_placeholders() {
        let ctx = context(vec![]);
        assert_eq!(
            ctx.url("/users/{id}/posts/{post}", &[("id", "7"), ("post", "3")]),
            "http://example.com/users/7/posts/3"
        );
        assert_eq!(ctx.url("https://cdn.test/{f}", &[("f", "a.png")]), "https://cdn.test/a.png");
        assert_eq!(ctx.url("other.host/x", &[]), "http://other.host/x");
    }
}
