//! Fault boundary.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;

use crate::dispatch::chain::Middleware;
use crate::dispatch::context::Context;
use crate::error::{DispatchError, DispatchResult};
use crate::observability::metrics;

/// Converts errors and panics from inner layers into an empty `500`.
///
/// The body and the headers describing it are discarded so a half-written
/// response never reaches the client. Other headers set by inner layers are kept.
#[derive(Debug, Default, Clone, Copy)]
pub struct Recovery;

impl Middleware for Recovery {
    fn handle(&self, ctx: &mut Context) -> DispatchResult {
        let fault = match panic::catch_unwind(AssertUnwindSafe(|| ctx.next())) {
            Ok(Ok(())) => return Ok(()),
            Ok(Err(err)) => {
                metrics::record_recovered("error");
                err
            }
            Err(payload) => {
                metrics::record_recovered("panic");
                DispatchError::Panic(panic_message(&*payload))
            }
        };

        tracing::warn!(
            request_id = %ctx.request().id(),
            method = %ctx.request().method(),
            path = %ctx.request().raw_path(),
            error = %fault,
            "Recovered from request fault"
        );

        let response = ctx.response_mut();
        response.clear();
        response.headers_mut().remove(CONTENT_TYPE);
        response.headers_mut().remove(CONTENT_DISPOSITION);
        response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
