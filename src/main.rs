//! pulp server binary.
//!
//! Loads configuration, installs logging and metrics, registers the demo
//! routes and serves them until Ctrl+C or SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;

use axum::http::StatusCode;
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use pulp::config::{load_config, AppConfig};
use pulp::middleware::{Cors, Record, Recovery, Redirect, Throttle};
use pulp::observability::{logging, metrics};
use pulp::{App, Context, HandlerResult, HttpServer, Outcome, Payload, RouteError, RouteTable};
use pulp::{Router, Routes, Shutdown};

#[derive(Debug, Parser)]
#[command(name = "pulp", version, about = "Lightweight HTTP dispatch server")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    logging::init(&config.observability);
    tracing::info!("pulp v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_body_bytes = config.listener.max_body_bytes,
        request_timeout_secs = config.timeouts.request_secs,
        throttle = config.throttle.enabled,
        cors = config.cors.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let app = build_app(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(app, config);
    server.run(listener, shutdown.wait()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_app(config: &AppConfig) -> Result<App, Box<dyn std::error::Error>> {
    let mut app = App::new(routes()?);
    app.use_middleware(Arc::new(Record));
    app.use_middleware(Arc::new(Recovery));
    if config.redirect.is_active() {
        app.use_middleware(Arc::new(Redirect::new(&config.redirect)));
    }
    if config.cors.enabled {
        app.use_middleware(Arc::new(Cors::new(&config.cors)?));
    }
    if config.throttle.enabled {
        app.use_middleware(Arc::new(Throttle::from_config(&config.throttle)));
    }
    Ok(app)
}

fn routes() -> Result<RouteTable, RouteError> {
    let mut router = Router::new();
    router
        .get("/", |_| Ok(Outcome::new(StatusCode::OK, "pulp")), vec![])?
        .get("/greet/{name}", greet, vec![])?
        .get(
            "/health",
            |_| Ok(Outcome::new(StatusCode::OK, json!({ "status": "ok" }))),
            vec![],
        )?;

    router.group("/api", vec![], |api| {
        api.get("/cache/{key}", cache_get, vec![])?
            .put("/cache/{key}", cache_put, vec![])?
            .delete("/cache/{key}", cache_del, vec![])?
            .post("/queue/{name}", queue_push, vec![])?
            .delete("/queue/{name}", queue_pop, vec![])?;
        Ok(())
    })?;

    Ok(router.build())
}

fn greet(ctx: &mut Context) -> HandlerResult {
    let name = ctx.param("name").unwrap_or("stranger");
    Ok(Outcome::new(StatusCode::OK, format!("hello {name}")))
}

fn key(ctx: &Context, name: &str) -> String {
    ctx.param(name).unwrap_or_default().to_string()
}

fn cache_get(ctx: &mut Context) -> HandlerResult {
    match ctx.cache().get(&key(ctx, "key")) {
        Some(value) => Ok(Outcome::new(StatusCode::OK, value)),
        None => Ok(Outcome::from(StatusCode::NOT_FOUND)),
    }
}

fn cache_put(ctx: &mut Context) -> HandlerResult {
    let value: serde_json::Value = ctx.request().json()?;
    let ttl = ctx
        .request()
        .query("ttl")
        .and_then(|secs| secs.parse().ok())
        .map(std::time::Duration::from_secs);
    ctx.cache().set(&key(ctx, "key"), value, ttl);
    Ok(Outcome::from(StatusCode::NO_CONTENT))
}

fn cache_del(ctx: &mut Context) -> HandlerResult {
    let status = if ctx.cache().del(&key(ctx, "key")) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    };
    Ok(Outcome::from(status))
}

fn queue_push(ctx: &mut Context) -> HandlerResult {
    let value: serde_json::Value = ctx.request().json()?;
    ctx.cache().push(&key(ctx, "name"), value);
    Ok(Outcome::from(StatusCode::ACCEPTED))
}

fn queue_pop(ctx: &mut Context) -> HandlerResult {
    match ctx.cache().pop(&key(ctx, "name")) {
        Some(value) => Ok(Outcome::new(StatusCode::OK, Payload::Json(value))),
        None => Ok(Outcome::from(StatusCode::NO_CONTENT)),
    }
}
