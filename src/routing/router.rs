//! Route registration.
//!
//! # Responsibilities
//! - Compile templates once and insert one route per requested method
//! - Scope routes under nested group prefixes and group middleware
//! - Hand the finished, immutable table to the application
//!
//! # Design Decisions
//! - Registration is fallible: malformed templates stop startup
//! - A grouped route's middleware is ancestors' (outer to inner) then its own
//! - `build` consumes the router, so the table cannot change after startup

use std::sync::Arc;

use axum::http::{Method, StatusCode};

use crate::dispatch::chain::Middleware;
use crate::dispatch::context::Context;
use crate::dispatch::handler::{BoxedHandler, HandlerResult, Outcome};
use crate::error::RouteError;
use crate::routing::path::{self, Matcher};
use crate::routing::route::Route;
use crate::routing::table::RouteTable;

/// Methods registered by [`Routes::any`].
pub const ANY_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// Registration surface shared by the root [`Router`] and nested [`Group`]s.
pub trait Routes {
    /// Register `handler` for every method in `methods`.
    fn route<F>(
        &mut self,
        methods: &[Method],
        template: &str,
        handler: F,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static;

    fn get<F>(
        &mut self,
        template: &str,
        handler: F,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(&[Method::GET], template, handler, middleware)
    }

    fn post<F>(
        &mut self,
        template: &str,
        handler: F,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(&[Method::POST], template, handler, middleware)
    }

    fn put<F>(
        &mut self,
        template: &str,
        handler: F,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(&[Method::PUT], template, handler, middleware)
    }

    fn delete<F>(
        &mut self,
        template: &str,
        handler: F,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(&[Method::DELETE], template, handler, middleware)
    }

    /// Register `handler` for GET, POST, PUT and DELETE.
    fn any<F>(
        &mut self,
        template: &str,
        handler: F,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        self.route(&ANY_METHODS, template, handler, middleware)
    }
}

/// Root route registry. Consumed by [`Router::build`].
#[derive(Debug)]
pub struct Router {
    table: RouteTable,
}

impl Router {
    /// Create an empty router whose fallback answers `404 Not Found`.
    pub fn new() -> Self {
        Self {
            table: RouteTable::new(fallback_route(Arc::new(
                |_: &mut Context| -> HandlerResult { Ok(Outcome::from(StatusCode::NOT_FOUND)) },
            ))),
        }
    }

    /// Replace the handler used when no route matches.
    pub fn fallback<F>(&mut self, handler: F) -> &mut Self
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        self.table.set_fallback(fallback_route(Arc::new(handler)));
        self
    }

    /// Register routes under `prefix`, wrapped by `middleware`.
    pub fn group<F>(
        &mut self,
        prefix: &str,
        middleware: Vec<Arc<dyn Middleware>>,
        build: F,
    ) -> Result<&mut Self, RouteError>
    where
        F: FnOnce(&mut Group<'_>) -> Result<(), RouteError>,
    {
        let mut group = Group {
            router: &mut *self,
            prefixes: Vec::new(),
            middleware,
        };
        group.push_prefix(prefix);
        build(&mut group)?;
        Ok(self)
    }

    /// Freeze the registered routes.
    pub fn build(self) -> RouteTable {
        tracing::debug!(routes = self.table.len(), "Route table built");
        self.table
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Routes for Router {
    fn route<F>(
        &mut self,
        methods: &[Method],
        template: &str,
        handler: F,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        let matcher = path::compile(template)?;
        let template = path::normalize(template);
        let handler: BoxedHandler = Arc::new(handler);

        for method in methods {
            tracing::debug!(
                method = %method,
                template = %template,
                static_route = matcher.is_static(),
                middleware = middleware.len(),
                "Registering route"
            );
            self.table.insert(Route::new(
                Some(method.clone()),
                template.clone(),
                matcher.clone(),
                handler.clone(),
                middleware.clone(),
            ));
        }

        Ok(self)
    }
}

/// A prefix + middleware scope opened by [`Router::group`].
pub struct Group<'r> {
    router: &'r mut Router,
    prefixes: Vec<String>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl Group<'_> {
    /// Append middleware for routes registered after this call.
    pub fn use_middleware(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    /// Open a nested scope: prefixes and middleware extend this group's.
    pub fn group<F>(
        &mut self,
        prefix: &str,
        middleware: Vec<Arc<dyn Middleware>>,
        build: F,
    ) -> Result<&mut Self, RouteError>
    where
        F: FnOnce(&mut Group<'_>) -> Result<(), RouteError>,
    {
        let mut stack = self.middleware.clone();
        stack.extend(middleware);

        let mut nested = Group {
            router: &mut *self.router,
            prefixes: self.prefixes.clone(),
            middleware: stack,
        };
        nested.push_prefix(prefix);
        build(&mut nested)?;
        Ok(self)
    }

    /// The current prefix, always starting with `/`.
    pub fn prefix(&self) -> String {
        format!("/{}", self.prefixes.join("/"))
    }

    fn push_prefix(&mut self, prefix: &str) {
        let prefix = prefix.trim_matches(|c| c == '/' || c == ' ');
        if !prefix.is_empty() {
            self.prefixes.push(prefix.to_string());
        }
    }

    fn scoped(&self, template: &str) -> String {
        let template = template.trim_matches(|c| c == '/' || c == ' ');
        let mut parts: Vec<&str> = self.prefixes.iter().map(String::as_str).collect();
        if !template.is_empty() {
            parts.push(template);
        }
        format!("/{}", parts.join("/"))
    }
}

impl Routes for Group<'_> {
    fn route<F>(
        &mut self,
        methods: &[Method],
        template: &str,
        handler: F,
        middleware: Vec<Arc<dyn Middleware>>,
    ) -> Result<&mut Self, RouteError>
    where
        F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
    {
        let template = self.scoped(template);
        let mut stack = self.middleware.clone();
        stack.extend(middleware);

        self.router.route(methods, &template, handler, stack)?;
        Ok(self)
    }
}

fn fallback_route(handler: BoxedHandler) -> Route {
    Route::new(None, "/", Matcher::Exact("/".to_string()), handler, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::chain::from_fn;

    fn ok(_: &mut Context) -> HandlerResult {
        Ok(Outcome::from(StatusCode::OK))
    }

    #[test]
    fn test_group_prefixes_routes() {
        let mut router = Router::new();
        router
            .group("/api", vec![], |api| {
                api.get("/users", ok, vec![])?;
                api.get("/", ok, vec![])?;
                Ok(())
            })
            .unwrap();
        let table = router.build();

        let (route, _) = table.resolve(&Method::GET, "/api/users");
        assert_eq!(route.template(), "/api/users");
        let (route, _) = table.resolve(&Method::GET, "/api");
        assert_eq!(route.template(), "/api");
        let (route, _) = table.resolve(&Method::GET, "/users");
        assert!(route.method().is_none());
    }

    #[test]
    fn test_nested_groups_concatenate_prefix_and_middleware() {
        let outer = from_fn(|ctx| ctx.next());
        let inner = from_fn(|ctx| ctx.next());
        let own = from_fn(|ctx| ctx.next());

        let mut router = Router::new();
        router
            .group(" /api/ ", vec![outer.clone()], |api| {
                api.group("v1", vec![inner.clone()], |v1| {
                    v1.get("/users/{id}", ok, vec![own.clone()])?;
                    assert_eq!(v1.prefix(), "/api/v1");
                    Ok(())
                })?;
                Ok(())
            })
            .unwrap();
        let table = router.build();

        let (route, params) = table.resolve(&Method::GET, "/api/v1/users/9");
        assert_eq!(route.template(), "/api/v1/users/{id}");
        assert_eq!(params["id"], "9");

        let stack = route.middleware();
        assert_eq!(stack.len(), 3);
        assert!(Arc::ptr_eq(&stack[0], &outer));
        assert!(Arc::ptr_eq(&stack[1], &inner));
        assert!(Arc::ptr_eq(&stack[2], &own));
    }

    #[test]
    fn test_any_registers_each_method() {
        let mut router = Router::new();
        router.any("/ping", ok, vec![]).unwrap();
        let table = router.build();

        assert_eq!(table.len(), ANY_METHODS.len());
        for method in ANY_METHODS {
            let (route, _) = table.resolve(&method, "/ping");
            assert_eq!(route.method(), Some(&method));
        }
        let (route, _) = table.resolve(&Method::PATCH, "/ping");
        assert!(route.method().is_none());
    }

    #[test]
    fn test_malformed_template_fails_registration() {
        let mut router = Router::new();
        let err = router.get("/users/{id", ok, vec![]).unwrap_err();
        assert!(matches!(err, RouteError::MalformedPlaceholder { .. }));

        let result = router.group("/api", vec![], |api| {
            api.get("/{a}/{a}", ok, vec![])?;
            Ok(())
        });
        assert!(matches!(result, Err(RouteError::DuplicateParam { .. })));
        assert!(router.build().is_empty());
    }
}
