//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router that hands every request to the [`App`]
//! - Wire up tower layers (timeout, tracing)
//! - Buffer request bodies up to the configured limit
//! - Run the dispatch chain off the async executor
//! - Drive the periodic cache sweep
//! - Bind to a listener and shut down gracefully

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::cache::Cache;
use crate::config::AppConfig;
use crate::dispatch::{App, Request};
use crate::http::transport::BufferedTransport;

/// State injected into the dispatch handler.
#[derive(Clone)]
struct ServerState {
    app: Arc<App>,
    max_body_bytes: usize,
}

/// Hosts an [`App`] on axum.
pub struct HttpServer {
    router: Router,
    app: Arc<App>,
    config: AppConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(app: App, config: AppConfig) -> Self {
        let app = Arc::new(app);
        let state = ServerState {
            app: app.clone(),
            max_body_bytes: config.listener.max_body_bytes,
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            app,
            config,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: ServerState) -> Router {
        Router::new().fallback(dispatch_handler).with_state(state).layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` resolves.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.app.routes().len(),
            "HTTP server starting"
        );

        let gc = spawn_cache_gc(
            self.app.cache().clone(),
            Duration::from_secs(self.config.cache.gc_interval_secs.max(1)),
        );

        let service = self.router.into_make_service_with_connect_info::<SocketAddr>();
        let served = axum::serve(listener, service)
            .with_graceful_shutdown(shutdown)
            .await;

        gc.abort();
        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Sweep expired cache items every `period`.
fn spawn_cache_gc(cache: Arc<dyn Cache>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            cache.gc();
        }
    })
}

/// Single entry point for every request.
async fn dispatch_handler(
    State(state): State<ServerState>,
    request: axum::extract::Request,
) -> Response {
    // absent when driven without a socket
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);

    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(
                method = %parts.method,
                path = %parts.uri.path(),
                limit = state.max_body_bytes,
                error = %e,
                "Request body rejected"
            );
            return StatusCode::PAYLOAD_TOO_LARGE.into_response();
        }
    };

    let mut request = Request::new(parts.method, parts.uri, parts.headers, body);
    if let Some(addr) = remote {
        request = request.with_remote_addr(addr);
    }

    let app = state.app.clone();
    let dispatched = tokio::task::spawn_blocking(move || {
        let request_id = request.id().to_string();
        let mut transport = BufferedTransport::new();
        if let Err(e) = app.handle(request, &mut transport) {
            tracing::error!(request_id = %request_id, error = %e, "Failed to send response");
        }
        transport
    })
    .await;

    match dispatched {
        Ok(transport) => transport.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Dispatch task failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
