//! Buffered response.
//!
//! # Responsibilities
//! - Hold status, headers and body in memory while the chain runs
//! - Let outer middleware inspect, rewrite or discard what inner layers wrote
//! - Commit everything to a [`Transport`] in a single `send`
//!
//! # Design Decisions
//! - No byte reaches the transport before `send`
//! - A second `send` is rejected with [`SendError::AlreadySent`]
//! - `clear` drops the body only; status and headers survive

use std::io;

use axum::http::header::{InvalidHeaderValue, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use serde::Serialize;

use crate::error::SendError;

/// Sink the buffer is flushed into.
pub trait Transport {
    fn write_head(&mut self, status: StatusCode, headers: &HeaderMap) -> Result<(), SendError>;
    fn write_body(&mut self, body: &[u8]) -> Result<(), SendError>;
}

/// A `Set-Cookie` entry.
#[derive(Debug, Clone, Default)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    /// Seconds; a negative value expires the cookie immediately.
    pub max_age: Option<i64>,
    pub secure: bool,
    pub http_only: bool,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Default::default()
        }
    }

    fn header_value(&self) -> Result<HeaderValue, InvalidHeaderValue> {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(path) = &self.path {
            out.push_str("; Path=");
            out.push_str(path);
        }
        if let Some(domain) = &self.domain {
            out.push_str("; Domain=");
            out.push_str(domain);
        }
        match self.max_age {
            Some(age) if age < 0 => out.push_str("; Max-Age=0"),
            Some(age) => out.push_str(&format!("; Max-Age={age}")),
            None => {}
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if self.secure {
            out.push_str("; Secure");
        }
        HeaderValue::from_str(&out)
    }
}

/// Status, headers and body held until [`ResponseBuffer::send`].
#[derive(Debug)]
pub struct ResponseBuffer {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
    sent: bool,
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuffer {
    /// Empty `200 OK` response.
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
            sent: false,
        }
    }

    /// Append raw bytes to the body.
    pub fn write(&mut self, bytes: &[u8]) {
        self.body.extend_from_slice(bytes);
    }

    pub fn write_str(&mut self, text: &str) {
        self.write(text.as_bytes());
    }

    /// Append `value` encoded as JSON.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        serde_json::to_writer(&mut self.body, value)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Discard the buffered body.
    pub fn clear(&mut self) {
        self.body.clear();
    }

    /// Buffered body length in bytes.
    pub fn size(&self) -> usize {
        self.body.len()
    }

    /// The body written so far.
    pub fn buffered(&self) -> &[u8] {
        &self.body
    }

    /// Move the body out, leaving the buffer empty.
    pub fn take_body(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.body)
    }

    /// Set `status` and the `Location` header.
    pub fn redirect(&mut self, to: &str, status: StatusCode) -> Result<(), InvalidHeaderValue> {
        let location = HeaderValue::from_str(to)?;
        self.status = status;
        self.headers.insert(LOCATION, location);
        Ok(())
    }

    pub fn set_cookie(&mut self, cookie: &Cookie) -> Result<(), InvalidHeaderValue> {
        let value = cookie.header_value()?;
        self.headers.append(SET_COOKIE, value);
        Ok(())
    }

    /// Expire cookie `name` on the client.
    pub fn del_cookie(&mut self, name: &str) -> Result<(), InvalidHeaderValue> {
        let mut cookie = Cookie::new(name, "");
        cookie.max_age = Some(-1);
        self.set_cookie(&cookie)
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Write status, headers and body to `transport`, then clear the body.
    ///
    /// The buffer counts as sent even when the transport fails, so a dropped
    /// connection is never written to twice.
    pub fn send<T: Transport + ?Sized>(&mut self, transport: &mut T) -> Result<(), SendError> {
        if self.sent {
            return Err(SendError::AlreadySent);
        }
        self.sent = true;

        let body = self.take_body();
        transport.write_head(self.status, &self.headers)?;
        if !body.is_empty() {
            transport.write_body(&body)?;
        }
        Ok(())
    }
}

impl io::Write for ResponseBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
