//! Canonical scheme and host redirects.

use axum::http::StatusCode;

use crate::config::RedirectConfig;
use crate::dispatch::chain::Middleware;
use crate::dispatch::context::Context;
use crate::error::{DispatchError, DispatchResult};

/// Answers `308 Permanent Redirect` when the request uses the wrong host or
/// arrives over plain HTTP while HTTPS is required.
#[derive(Debug, Clone, Default)]
pub struct Redirect {
    must_https: bool,
    must_host: Option<String>,
}

impl Redirect {
    pub fn new(config: &RedirectConfig) -> Self {
        Self {
            must_https: config.must_https,
            must_host: config.must_host.clone(),
        }
    }

    fn target(&self, ctx: &Context) -> Option<String> {
        let request = ctx.request();
        let path = request
            .uri()
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        if let Some(host) = &self.must_host {
            if request.host() != Some(host.as_str()) {
                let scheme = if self.must_https { "https" } else { "http" };
                return Some(format!("{scheme}://{host}{path}"));
            }
        }

        if self.must_https && !request.is_tls() {
            let host = request.host()?;
            return Some(format!("https://{host}{path}"));
        }

        None
    }
}

impl Middleware for Redirect {
    fn handle(&self, ctx: &mut Context) -> DispatchResult {
        let Some(target) = self.target(ctx) else {
            return ctx.next();
        };

        tracing::debug!(request_id = %ctx.request().id(), location = %target, "Redirecting");
        ctx.response_mut()
            .redirect(&target, StatusCode::PERMANENT_REDIRECT)
            .map_err(DispatchError::handler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::handler::Outcome;
    use crate::dispatch::App;
    use crate::middleware::testing::{request, run};
    use crate::routing::{Router, Routes};
    use axum::http::header::LOCATION;
    use axum::http::Method;
    use std::sync::Arc;

    fn app(config: RedirectConfig) -> App {
        let mut router = Router::new();
        router
            .get("/page", |_| Ok(Outcome::new(StatusCode::OK, "page")), vec![])
            .unwrap();
        let mut app = App::new(router.build());
        app.use_middleware(Arc::new(Redirect::new(&config)));
        app
    }

    #[test]
    fn test_must_https() {
        let app = app(RedirectConfig {
            must_https: true,
            must_host: None,
        });

        let sent = run(&app, request(Method::GET, "/page?x=1", &[("host", "site.test")]));
        assert_eq!(sent.status(), Some(StatusCode::PERMANENT_REDIRECT));
        assert_eq!(sent.headers().unwrap()[LOCATION], "https://site.test/page?x=1");

        let sent = run(
            &app,
            request(
                Method::GET,
                "/page",
                &[("host", "site.test"), ("x-forwarded-proto", "https")],
            ),
        );
        assert_eq!(sent.status(), Some(StatusCode::OK));
        assert_eq!(sent.body(), b"page");
    }

    #[test]
    fn test_must_host() {
        let app = app(RedirectConfig {
            must_https: false,
            must_host: Some("www.site.test".into()),
        });

        let sent = run(&app, request(Method::GET, "/page", &[("host", "site.test")]));
        assert_eq!(sent.status(), Some(StatusCode::PERMANENT_REDIRECT));
        assert_eq!(sent.headers().unwrap()[LOCATION], "http://www.site.test/page");

        let sent = run(&app, request(Method::GET, "/page", &[("host", "www.site.test")]));
        assert_eq!(sent.status(), Some(StatusCode::OK));
    }
}
