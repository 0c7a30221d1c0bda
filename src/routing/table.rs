//! Immutable route table and request resolution.
//!
//! # Responsibilities
//! - Partition compiled routes by method into static and dynamic pools
//! - Resolve a method + path to exactly one route and its parameters
//!
//! # Design Decisions
//! - Static pool is a hash map keyed by the normalized literal: O(1) lookup
//! - Dynamic pool keeps registration order; the first matching pattern wins,
//!   even when a later, more specific template would also match
//! - No-match resolves to the fallback route, never to an error

use std::collections::HashMap;

use axum::http::Method;

use crate::routing::path::Matcher;
use crate::routing::route::Route;

/// Parameters extracted from a dynamic route, keyed by placeholder name.
pub type Params = HashMap<String, String>;

/// Method-partitioned collection of compiled routes plus one fallback.
#[derive(Debug)]
pub struct RouteTable {
    statics: HashMap<Method, HashMap<String, Route>>,
    dynamics: HashMap<Method, Vec<Route>>,
    fallback: Route,
}

impl RouteTable {
    pub(crate) fn new(fallback: Route) -> Self {
        Self {
            statics: HashMap::new(),
            dynamics: HashMap::new(),
            fallback,
        }
    }

    pub(crate) fn set_fallback(&mut self, fallback: Route) {
        self.fallback = fallback;
    }

    /// Insert a route under its method. Routes without a method are ignored.
    pub(crate) fn insert(&mut self, route: Route) {
        let Some(method) = route.method().cloned() else {
            tracing::warn!(template = %route.template(), "Ignoring route without method");
            return;
        };

        match route.matcher() {
            Matcher::Exact(path) => {
                let pool = self.statics.entry(method.clone()).or_default();
                if pool.contains_key(path) {
                    // first registration wins, same as the dynamic pool
                    tracing::warn!(
                        method = %method,
                        path = %path,
                        "Static route already registered; later registration is unreachable"
                    );
                    return;
                }
                pool.insert(path.clone(), route);
            }
            Matcher::Pattern(_) => {
                self.dynamics.entry(method).or_default().push(route);
            }
        }
    }

    /// Resolve `method` + `path` to a route and its extracted parameters.
    pub fn resolve(&self, method: &Method, path: &str) -> (&Route, Params) {
        if let Some(route) = self.statics.get(method).and_then(|pool| pool.get(path)) {
            return (route, Params::new());
        }

        if let Some(pool) = self.dynamics.get(method) {
            for route in pool {
                let Matcher::Pattern(pattern) = route.matcher() else {
                    continue;
                };
                let Some(values) = pattern.captures(path) else {
                    continue;
                };
                if values.len() != pattern.names().len() {
                    continue;
                }

                let params = pattern
                    .names()
                    .iter()
                    .cloned()
                    .zip(values.into_iter().map(str::to_string))
                    .collect();
                return (route, params);
            }
        }

        (&self.fallback, Params::new())
    }

    pub fn fallback(&self) -> &Route {
        &self.fallback
    }

    /// Number of registered routes, excluding the fallback.
    pub fn len(&self) -> usize {
        self.statics.values().map(HashMap::len).sum::<usize>()
            + self.dynamics.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::router::{Router, Routes};

    use crate::dispatch::handler::Outcome;
    use axum::http::StatusCode;

    fn table(register: impl FnOnce(&mut Router)) -> RouteTable {
        let mut router = Router::new();
        register(&mut router);
        router.build()
    }

    fn ok(router: &mut Router, method: Method, template: &str) {
        router
            .route(&[method], template, |_| Ok(Outcome::from(StatusCode::OK)), vec![])
            .unwrap();
    }

    #[test]
    fn test_dynamic_match_extracts_params() {
        let table = table(|r| ok(r, Method::GET, "/users/{id}"));

        let (route, params) = table.resolve(&Method::GET, "/users/42");
        assert_eq!(route.template(), "/users/{id}");
        assert_eq!(params.get("id").map(String::as_str), Some("42"));

        let (route, params) = table.resolve(&Method::GET, "/users/42/x");
        assert!(route.method().is_none(), "expected fallback");
        assert!(params.is_empty());
    }

    #[test]
    fn test_registration_order_wins_between_dynamic_routes() {
        // `/users/new` on its own would be a static route; two overlapping
        // patterns keep the lookup inside the dynamic pool.
        let table = table(|r| {
            ok(r, Method::GET, "/users/{id}");
            ok(r, Method::GET, "/users/{name}");
        });

        let (route, params) = table.resolve(&Method::GET, "/users/new");
        assert_eq!(route.template(), "/users/{id}");
        assert_eq!(params.get("id").map(String::as_str), Some("new"));
    }

    #[test]
    fn test_static_beats_dynamic_regardless_of_order() {
        let table = table(|r| {
            ok(r, Method::GET, "/users/{id}");
            ok(r, Method::GET, "/users/new");
        });

        let (route, params) = table.resolve(&Method::GET, "/users/new");
        assert!(route.is_static());
        assert_eq!(route.template(), "/users/new");
        assert!(params.is_empty());

        let (route, _) = table.resolve(&Method::GET, "/users/7");
        assert_eq!(route.template(), "/users/{id}");
    }

    #[test]
    fn test_methods_are_partitioned() {
        let table = table(|r| ok(r, Method::POST, "/items"));

        let (route, _) = table.resolve(&Method::POST, "/items");
        assert_eq!(route.method(), Some(&Method::POST));

        let (route, _) = table.resolve(&Method::GET, "/items");
        assert!(route.method().is_none());
    }

    #[test]
    fn test_duplicate_static_keeps_first() {
        let mut router = Router::new();
        router
            .get("/dup", |_| Ok(Outcome::from((StatusCode::OK, "first"))), vec![])
            .unwrap()
            .get("/dup", |_| Ok(Outcome::from((StatusCode::OK, "second"))), vec![])
            .unwrap();
        let table = router.build();

        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_unknown_path_resolves_fallback() {
        let table = table(|r| ok(r, Method::GET, "/"));
        let (route, params) = table.resolve(&Method::GET, "/unknown");
        assert!(route.method().is_none());
        assert_eq!(route.template(), "/");
        assert!(params.is_empty());
        assert!(!table.is_empty());
    }
}
