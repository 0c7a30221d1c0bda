//! Transport that collects a flushed response for axum.

use axum::body::Body;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::dispatch::response::Transport;
use crate::error::SendError;

/// Captures the single `send` of a response buffer.
#[derive(Debug, Default)]
pub struct BufferedTransport {
    head: Option<(StatusCode, HeaderMap)>,
    body: Vec<u8>,
}

impl BufferedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a head has been written.
    pub fn is_committed(&self) -> bool {
        self.head.is_some()
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.head.as_ref().map(|(status, _)| *status)
    }

    pub fn headers(&self) -> Option<&HeaderMap> {
        self.head.as_ref().map(|(_, headers)| headers)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl Transport for BufferedTransport {
    fn write_head(&mut self, status: StatusCode, headers: &HeaderMap) -> Result<(), SendError> {
        if self.head.is_some() {
            return Err(SendError::Transport("head already written".into()));
        }
        self.head = Some((status, headers.clone()));
        Ok(())
    }

    fn write_body(&mut self, body: &[u8]) -> Result<(), SendError> {
        if self.head.is_none() {
            return Err(SendError::Transport("body written before head".into()));
        }
        self.body.extend_from_slice(body);
        Ok(())
    }
}

impl IntoResponse for BufferedTransport {
    /// An uncommitted transport becomes an empty `500`.
    fn into_response(self) -> Response {
        let Some((status, headers)) = self.head else {
            tracing::error!("Response was never sent");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        };

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;
        *response.headers_mut() = headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_into_response() {
        let mut headers = HeaderMap::new();
        headers.insert("x-id", HeaderValue::from_static("7"));

        let mut transport = BufferedTransport::new();
        transport.write_head(StatusCode::CREATED, &headers).unwrap();
        transport.write_body(b"done").unwrap();
        assert!(transport.is_committed());

        let response = transport.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["x-id"], "7");
    }

    #[test]
    fn test_ordering_enforced() {
        let mut transport = BufferedTransport::new();
        assert!(transport.write_body(b"early").is_err());
        transport.write_head(StatusCode::OK, &HeaderMap::new()).unwrap();
        assert!(transport.write_head(StatusCode::OK, &HeaderMap::new()).is_err());
        assert_eq!(BufferedTransport::new().into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
