//! Request dispatch entry point.
//!
//! # Responsibilities
//! - Resolve the route for an incoming request
//! - Assemble the chain: global middleware, then the route's group and own
//!   middleware, then the handler adapter
//! - Drive the chain and flush the response exactly once
//!
//! # Design Decisions
//! - The route table is shared read-only behind an `Arc`
//! - An error escaping the chain discards the partial response and sends an
//!   empty `500`; the error text never reaches the client

use std::sync::Arc;

use axum::http::StatusCode;

use crate::cache::{Cache, MemoryCache};
use crate::dispatch::chain::Middleware;
use crate::dispatch::context::Context;
use crate::dispatch::handler::HandlerAdapter;
use crate::dispatch::request::Request;
use crate::dispatch::response::Transport;
use crate::error::SendError;
use crate::routing::route::Route;
use crate::routing::{Params, RouteTable};

/// A built route table plus global middleware and the shared cache.
#[derive(Clone)]
pub struct App {
    table: Arc<RouteTable>,
    middleware: Vec<Arc<dyn Middleware>>,
    cache: Arc<dyn Cache>,
}

impl App {
    /// Application over `table` with an in-memory cache.
    pub fn new(table: RouteTable) -> Self {
        Self {
            table: Arc::new(table),
            middleware: Vec::new(),
            cache: Arc::new(MemoryCache::new()),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn Cache>) -> Self {
        self.cache = cache;
        self
    }

    /// Append middleware that runs for every request, matched or not.
    pub fn use_middleware(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.middleware.push(middleware);
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    pub fn cache(&self) -> &Arc<dyn Cache> {
        &self.cache
    }

    pub fn resolve(&self, request: &Request) -> (&Route, Params) {
        self.table.resolve(request.method(), request.path())
    }

    /// Build the context and chain for `request`.
    pub fn context(&self, request: Request) -> Context {
        let (route, params) = self.resolve(&request);
        tracing::trace!(
            request_id = %request.id(),
            method = %request.method(),
            path = %request.raw_path(),
            route = %route.template(),
            "Route resolved"
        );

        let mut chain = Vec::with_capacity(self.middleware.len() + route.middleware().len() + 1);
        chain.extend(self.middleware.iter().cloned());
        chain.extend(route.middleware().iter().cloned());
        chain.push(Arc::new(HandlerAdapter::new(route.handler().clone())) as Arc<dyn Middleware>);

        let template = route.template().to_string();
        Context::new(request, params, self.cache.clone(), chain).with_route(template)
    }

    /// Run the chain in `ctx` and flush its response to `transport`.
    pub fn dispatch<T: Transport + ?Sized>(
        &self,
        mut ctx: Context,
        transport: &mut T,
    ) -> Result<(), SendError> {
        if let Err(err) = ctx.next() {
            tracing::error!(
                request_id = %ctx.request().id(),
                path = %ctx.request().raw_path(),
                error = %err,
                "Request failed"
            );
            let response = ctx.response_mut();
            response.clear();
            response.headers_mut().clear();
            response.set_status(StatusCode::INTERNAL_SERVER_ERROR);
        }

        ctx.response_mut().send(transport)
    }

    /// Resolve, dispatch and send one request.
    pub fn handle<T: Transport + ?Sized>(
        &self,
        request: Request,
        transport: &mut T,
    ) -> Result<(), SendError> {
        let ctx = self.context(request);
        self.dispatch(ctx, transport)
    }
}
