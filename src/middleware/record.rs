//! Access log.

use std::time::Instant;

use axum::http::StatusCode;

use crate::dispatch::chain::Middleware;
use crate::dispatch::context::Context;
use crate::error::DispatchResult;
use crate::observability::metrics;

/// Logs one line per request after the inner chain returns and records
/// request metrics. Install it first so its timing covers every other layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct Record;

impl Middleware for Record {
    fn handle(&self, ctx: &mut Context) -> DispatchResult {
        let start = Instant::now();
        let result = ctx.next();

        let status = match &result {
            Ok(()) => ctx.response().status(),
            Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let request = ctx.request();
        let client = request
            .ip()
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "-".to_string());

        tracing::info!(
            request_id = %request.id(),
            client = %client,
            method = %request.method(),
            uri = %request.uri(),
            route = %ctx.route(),
            status = status.as_u16(),
            bytes = ctx.response().size(),
            elapsed = ?start.elapsed(),
            "Request completed"
        );
        metrics::record_request(request.method().as_str(), status.as_u16(), ctx.route(), start);

        result
    }
}
