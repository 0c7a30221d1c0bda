//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{HeaderMap, Method, StatusCode};
use tokio::net::TcpListener;

use pulp::{App, AppConfig, HttpServer, Request, SendError, Shutdown, Transport};

/// Transport that records every write it receives.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub status: Option<StatusCode>,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
    pub head_writes: usize,
    pub body_writes: usize,
}

impl RecordingTransport {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl Transport for RecordingTransport {
    fn write_head(&mut self, status: StatusCode, headers: &HeaderMap) -> Result<(), SendError> {
        self.head_writes += 1;
        self.status = Some(status);
        self.headers = headers.clone();
        Ok(())
    }

    fn write_body(&mut self, body: &[u8]) -> Result<(), SendError> {
        self.body_writes += 1;
        self.body.extend_from_slice(body);
        Ok(())
    }
}

pub fn request(method: Method, uri: &str, body: &'static str) -> Request {
    Request::new(method, uri.parse().unwrap(), HeaderMap::new(), body)
}

pub fn get(uri: &str) -> Request {
    request(Method::GET, uri, "")
}

/// Dispatch `request` through `app` and return what reached the transport.
pub fn send(app: &App, request: Request) -> RecordingTransport {
    let mut transport = RecordingTransport::default();
    app.handle(request, &mut transport).unwrap();
    transport
}

/// Serve `app` on an ephemeral local port.
pub async fn spawn_server(app: App, mut config: AppConfig) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(app, config);
    let stop = shutdown.wait();
    tokio::spawn(async move {
        let _ = server.run(listener, stop).await;
    });

    // give the accept loop a moment to start
    tokio::time::sleep(Duration::from_millis(50)).await;
    (addr, shutdown)
}
