//! Cross-origin resource sharing headers.

use axum::http::header::{
    InvalidHeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderValue, Method, StatusCode};

use crate::config::CorsConfig;
use crate::dispatch::chain::Middleware;
use crate::dispatch::context::Context;
use crate::error::DispatchResult;

/// Adds `Access-Control-Allow-*` headers and answers preflight requests.
#[derive(Debug, Clone)]
pub struct Cors {
    origin: HeaderValue,
    methods: HeaderValue,
    headers: HeaderValue,
}

impl Cors {
    pub fn new(config: &CorsConfig) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            origin: HeaderValue::from_str(&config.origin)?,
            methods: HeaderValue::from_str(&config.methods)?,
            headers: HeaderValue::from_str(&config.headers)?,
        })
    }
}

impl Middleware for Cors {
    fn handle(&self, ctx: &mut Context) -> DispatchResult {
        let headers = ctx.response_mut().headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.headers.clone());

        if *ctx.request().method() == Method::OPTIONS {
            ctx.response_mut().set_status(StatusCode::NO_CONTENT);
            return Ok(());
        }
        ctx.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler::Outcome;
    use crate::dispatch::App;
    use crate::middleware::testing::{request, run};
    use crate::routing::{Router, Routes};
    use std::sync::Arc;

    fn app() -> App {
        let mut router = Router::new();
        router
            .any("/data", |_| Ok(Outcome::new(StatusCode::OK, "data")), vec![])
            .unwrap();
        let config = CorsConfig {
            enabled: true,
            origin: "https://app.example".into(),
            ..Default::default()
        };
        let mut app = App::new(router.build());
        app.use_middleware(Arc::new(Cors::new(&config).unwrap()));
        app
    }

    #[test]
    fn test_headers_added() {
        let sent = run(&app(), request(Method::GET, "/data", &[]));
        let headers = sent.headers().unwrap();
        assert_eq!(sent.status(), Some(StatusCode::OK));
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, PUT, DELETE, OPTIONS");
        assert_eq!(sent.body(), b"data");
    }

    #[test]
    fn test_preflight_short_circuits() {
        let sent = run(&app(), request(Method::OPTIONS, "/data", &[]));
        assert_eq!(sent.status(), Some(StatusCode::NO_CONTENT));
        assert!(sent.body().is_empty());
        assert!(sent.headers().unwrap().contains_key(ACCESS_CONTROL_ALLOW_HEADERS));
    }

    #[test]
    fn test_invalid_header_rejected() {
        let config = CorsConfig {
            origin: "bad\norigin".into(),
            ..Default::default()
        };
        assert!(Cors::new(&config).is_err());
    }
}
