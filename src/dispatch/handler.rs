//! Handler results and the terminal chain entry.
//!
//! # Responsibilities
//! - Model what a handler returns: an optional status plus one payload variant
//! - Write that result into the response buffer at the end of the chain
//!
//! # Design Decisions
//! - `Payload` is matched exhaustively; adding a variant is a compile error
//!   until the adapter knows how to write it
//! - `Content-Type` is only filled in when no earlier layer set one
//! - A `None` status keeps whatever status the buffer already carries

use std::fmt;
use std::io::{self, Read};
use std::sync::Arc;

use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderValue, StatusCode};
use serde::Serialize;

use crate::dispatch::chain::Middleware;
use crate::dispatch::context::Context;
use crate::dispatch::response::ResponseBuffer;
use crate::error::{DispatchError, DispatchResult};

const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const APPLICATION_JSON: &str = "application/json";

/// What a handler returns.
pub type HandlerResult = Result<Outcome, DispatchError>;

/// Type-erased, shareable route handler.
pub type BoxedHandler = Arc<dyn Fn(&mut Context) -> HandlerResult + Send + Sync>;

/// Body produced by a handler.
pub enum Payload {
    /// Leave the body untouched.
    Empty,
    Bytes(Vec<u8>),
    Text(String),
    /// Copied into the buffer until EOF.
    Stream(Box<dyn Read + Send>),
    Json(serde_json::Value),
    /// Send a `Location` header. Uses the outcome status when it is a
    /// redirection, `302 Found` otherwise.
    Redirect(String),
    /// Stream a download with a `Content-Disposition` filename.
    Attachment {
        filename: String,
        reader: Box<dyn Read + Send>,
    },
}

impl Payload {
    /// Serialize `value` into a JSON payload.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, DispatchError> {
        Ok(Payload::Json(serde_json::to_value(value)?))
    }

    pub fn stream(reader: impl Read + Send + 'static) -> Self {
        Payload::Stream(Box::new(reader))
    }

    pub fn attachment(filename: impl Into<String>, reader: impl Read + Send + 'static) -> Self {
        Payload::Attachment {
            filename: filename.into(),
            reader: Box::new(reader),
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => f.write_str("Empty"),
            Payload::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Payload::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Payload::Stream(_) => f.write_str("Stream(..)"),
            Payload::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Payload::Redirect(target) => f.debug_tuple("Redirect").field(target).finish(),
            Payload::Attachment { filename, .. } => f
                .debug_struct("Attachment")
                .field("filename", filename)
                .finish_non_exhaustive(),
        }
    }
}

impl From<()> for Payload {
    fn from(_: ()) -> Self {
        Payload::Empty
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<&'static [u8]> for Payload {
    fn from(bytes: &'static [u8]) -> Self {
        Payload::Bytes(bytes.to_vec())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Json(value)
    }
}

/// A handler's status and payload.
#[derive(Debug)]
pub struct Outcome {
    /// `None` keeps the current status.
    pub status: Option<StatusCode>,
    pub payload: Payload,
}

impl Outcome {
    pub fn new(status: StatusCode, payload: impl Into<Payload>) -> Self {
        Self {
            status: Some(status),
            payload: payload.into(),
        }
    }

    /// Write `payload` without touching the status.
    pub fn keep(payload: impl Into<Payload>) -> Self {
        Self {
            status: None,
            payload: payload.into(),
        }
    }
}

impl<P: Into<Payload>> From<(StatusCode, P)> for Outcome {
    fn from((status, payload): (StatusCode, P)) -> Self {
        Outcome::new(status, payload)
    }
}

impl From<StatusCode> for Outcome {
    fn from(status: StatusCode) -> Self {
        Outcome::new(status, Payload::Empty)
    }
}

/// Last entry of every chain: runs the route handler and writes its outcome.
pub struct HandlerAdapter {
    handler: BoxedHandler,
}

impl HandlerAdapter {
    pub fn new(handler: BoxedHandler) -> Self {
        Self { handler }
    }
}

impl Middleware for HandlerAdapter {
    fn handle(&self, ctx: &mut Context) -> DispatchResult {
        let Outcome { status, payload } = (self.handler)(ctx)?;
        write_outcome(ctx.response_mut(), status, payload)
    }
}

fn write_outcome(
    response: &mut ResponseBuffer,
    status: Option<StatusCode>,
    payload: Payload,
) -> DispatchResult {
    if let Some(status) = status {
        response.set_status(status);
    }

    match payload {
        Payload::Empty => {}
        Payload::Bytes(bytes) => {
            default_content_type(response, OCTET_STREAM);
            response.write(&bytes);
        }
        Payload::Text(text) => {
            default_content_type(response, TEXT_PLAIN);
            response.write_str(&text);
        }
        Payload::Stream(mut reader) => {
            default_content_type(response, OCTET_STREAM);
            io::copy(&mut reader, response)?;
        }
        Payload::Json(value) => {
            default_content_type(response, APPLICATION_JSON);
            response.write_json(&value)?;
        }
        Payload::Redirect(target) => {
            let code = status
                .filter(StatusCode::is_redirection)
                .unwrap_or(StatusCode::FOUND);
            response
                .redirect(&target, code)
                .map_err(DispatchError::handler)?;
        }
        Payload::Attachment {
            filename,
            mut reader,
        } => {
            let disposition = format!("attachment; filename=\"{}\"", filename.replace('"', ""));
            let disposition = HeaderValue::from_str(&disposition).map_err(DispatchError::handler)?;
            response.headers_mut().insert(CONTENT_DISPOSITION, disposition);
            default_content_type(response, OCTET_STREAM);
            io::copy(&mut reader, response)?;
        }
    }

    Ok(())
}

fn default_content_type(response: &mut ResponseBuffer, value: &'static str) {
    response
        .headers_mut()
        .entry(CONTENT_TYPE)
        .or_insert(HeaderValue::from_static(value));
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;
    use std::io::Cursor;

    fn write(status: Option<StatusCode>, payload: Payload) -> ResponseBuffer {
        let mut response = ResponseBuffer::new();
        write_outcome(&mut response, status, payload).unwrap();
        response
    }

    #[test]
    fn test_text_sets_status_and_content_type() {
        let response = write(Some(StatusCode::CREATED), "made".into());
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.buffered(), b"made");
        assert_eq!(response.headers()[CONTENT_TYPE], TEXT_PLAIN);
    }

    #[test]
    fn test_keep_status() {
        let mut response = ResponseBuffer::new();
        response.set_status(StatusCode::ACCEPTED);
        write_outcome(&mut response, None, Payload::Bytes(vec![1, 2, 3])).unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
        assert_eq!(response.size(), 3);
        assert_eq!(response.headers()[CONTENT_TYPE], OCTET_STREAM);
    }

    #[test]
    fn test_existing_content_type_is_kept() {
        let mut response = ResponseBuffer::new();
        response
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("text/html"));
        write_outcome(&mut response, None, "<p>hi</p>".into()).unwrap();
        assert_eq!(response.headers()[CONTENT_TYPE], "text/html");
    }

    #[test]
    fn test_json_payload() {
        let payload = Payload::json(&serde_json::json!({ "ok": true })).unwrap();
        let response = write(Some(StatusCode::OK), payload);
        assert_eq!(response.buffered(), br#"{"ok":true}"#);
        assert_eq!(response.headers()[CONTENT_TYPE], APPLICATION_JSON);
    }

    #[test]
    fn test_stream_and_attachment() {
        let response = write(None, Payload::stream(Cursor::new(b"chunked".to_vec())));
        assert_eq!(response.buffered(), b"chunked");

        let response = write(None, Payload::attachment("report.csv", Cursor::new(b"a,b".to_vec())));
        assert_eq!(response.buffered(), b"a,b");
        assert_eq!(
            response.headers()[CONTENT_DISPOSITION],
            "attachment; filename=\"report.csv\""
        );
    }

    #[test]
    fn test_redirect_status() {
        let response = write(
            Some(StatusCode::PERMANENT_REDIRECT),
            Payload::Redirect("/new".into()),
        );
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(response.headers()[LOCATION], "/new");

        let response = write(Some(StatusCode::OK), Payload::Redirect("/elsewhere".into()));
        assert_eq!(response.status(), StatusCode::FOUND);
    }
}
