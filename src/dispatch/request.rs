//! Read-only request view handed to middleware and handlers.

use std::net::{IpAddr, SocketAddr};

use axum::body::Bytes;
use axum::http::header::{CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, Method, Uri};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::error::DispatchError;

const REQUEST_ID: &str = "x-request-id";
const FORWARDED_FOR: &str = "x-forwarded-for";
const FORWARDED_PROTO: &str = "x-forwarded-proto";

/// An incoming request with its body already buffered.
#[derive(Debug, Clone)]
pub struct Request {
    id: String,
    method: Method,
    uri: Uri,
    /// Percent-decoded `uri.path()`; what routes are matched against.
    path: String,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: Option<SocketAddr>,
}

impl Request {
    /// Build a request view. The id is taken from `x-request-id` when the
    /// client sent one, otherwise a fresh UUID v4.
    pub fn new(method: Method, uri: Uri, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        let id = headers
            .get(REQUEST_ID)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let path = decode_path(uri.path());

        Self {
            id,
            method,
            uri,
            path,
            headers,
            body: body.into(),
            remote_addr: None,
        }
    }

    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Percent-decoded path. `%2F` decodes to `/` and so splits segments.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path exactly as the client sent it.
    pub fn raw_path(&self) -> &str {
        self.uri.path()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// First query-string value for `key`.
    pub fn query(&self, key: &str) -> Option<String> {
        let query = self.uri.query()?;
        lookup(query.as_bytes(), key)
    }

    /// First urlencoded form value for `key`. Empty unless the body is
    /// `application/x-www-form-urlencoded`.
    pub fn form(&self, key: &str) -> Option<String> {
        let urlencoded = self
            .header(CONTENT_TYPE.as_str())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));
        if !urlencoded {
            return None;
        }
        lookup(&self.body, key)
    }

    /// Form value, falling back to the query string.
    pub fn input(&self, key: &str) -> Option<String> {
        self.form(key)
            .filter(|v| !v.is_empty())
            .or_else(|| self.query(key))
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, DispatchError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Client address. The first `X-Forwarded-For` entry wins when it parses.
    pub fn ip(&self) -> Option<IpAddr> {
        let forwarded = self
            .header(FORWARDED_FOR)
            .and_then(|v| v.split(',').next())
            .and_then(|v| v.trim().parse().ok());
        forwarded.or_else(|| self.remote_addr.map(|addr| addr.ip()))
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// `Host` header, or the authority of an absolute request URI.
    pub fn host(&self) -> Option<&str> {
        self.header(HOST.as_str())
            .or_else(|| self.uri.authority().map(|a| a.as_str()))
    }

    /// Whether the request arrived over TLS, directly or via a proxy.
    pub fn is_tls(&self) -> bool {
        if self.uri.scheme_str() == Some("https") {
            return true;
        }
        self.header(FORWARDED_PROTO)
            .is_some_and(|proto| proto.eq_ignore_ascii_case("https"))
    }
}

/// Falls back to the raw path when the decoded bytes are not UTF-8.
fn decode_path(raw: &str) -> String {
    match percent_decode_str(raw).decode_utf8() {
        Ok(path) => path.into_owned(),
        Err(_) => raw.to_string(),
    }
}

fn lookup(encoded: &[u8], key: &str) -> Option<String> {
    url::form_urlencoded::parse(encoded)
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn request(uri: &str, headers: &[(&'static str, &'static str)], body: &'static str) -> Request {
        let mut map = HeaderMap::new();
        for &(name, value) in headers {
            map.insert(name, HeaderValue::from_static(value));
        }
        Request::new(Method::POST, uri.parse().unwrap(), map, body)
    }

    #[test]
    fn test_query_form_input() {
        let req = request(
            "/search?q=rust&page=2",
            &[("content-type", "application/x-www-form-urlencoded")],
            "q=tokio&name=Ada+Lovelace",
        );
        assert_eq!(req.query("q").as_deref(), Some("rust"));
        assert_eq!(req.form("q").as_deref(), Some("tokio"));
        assert_eq!(req.form("name").as_deref(), Some("Ada Lovelace"));
        assert_eq!(req.input("q").as_deref(), Some("tokio"));
        assert_eq!(req.input("page").as_deref(), Some("2"));
        assert_eq!(req.input("missing"), None);
    }

    #[test]
    fn test_path_is_percent_decoded() {
        let req = request("/greet/Ada%20Lovelace", &[], "");
        assert_eq!(req.path(), "/greet/Ada Lovelace");
        assert_eq!(req.raw_path(), "/greet/Ada%20Lovelace");

        let req = request("/caf%C3%A9", &[], "");
        assert_eq!(req.path(), "/café");

        // not UTF-8 once decoded
        let req = request("/bin/%FF", &[], "");
        assert_eq!(req.path(), "/bin/%FF");
    }

    #[test]
    fn test_form_requires_urlencoded_body() {
        let req = request("/", &[("content-type", "application/json")], "q=1");
        assert_eq!(req.form("q"), None);
    }

    #[test]
    fn test_json_body() {
        #[derive(serde::Deserialize)]
        struct Greeting {
            name: String,
        }

        let req = request("/", &[], r#"{"name":"Ada"}"#);
        let greeting: Greeting = req.json().unwrap();
        assert_eq!(greeting.name, "Ada");

        let req = request("/", &[], "not json");
        assert!(matches!(req.json::<Greeting>(), Err(DispatchError::Json(_))));
    }

    #[test]
    fn test_ip_prefers_forwarded_for() {
        let remote: SocketAddr = "10.0.0.1:5000".parse().unwrap();

        let req = request("/", &[], "").with_remote_addr(remote);
        assert_eq!(req.ip(), Some(remote.ip()));

        let req = request("/", &[("x-forwarded-for", "203.0.113.7, 10.0.0.2")], "")
            .with_remote_addr(remote);
        assert_eq!(req.ip(), Some("203.0.113.7".parse().unwrap()));

        let req = request("/", &[("x-forwarded-for", "garbage")], "").with_remote_addr(remote);
        assert_eq!(req.ip(), Some(remote.ip()));
    }

    #[test]
    fn test_request_id_host_and_tls() {
        let req = request(
            "/",
            &[
                ("x-request-id", "abc-123"),
                ("host", "example.com"),
                ("x-forwarded-proto", "HTTPS"),
            ],
            "",
        );
        assert_eq!(req.id(), "abc-123");
        assert_eq!(req.host(), Some("example.com"));
        assert!(req.is_tls());

        let req = request("http://api.local/x", &[], "");
        assert_eq!(req.id().len(), 36);
        assert_eq!(req.host(), Some("api.local"));
        assert!(!req.is_tls());
    }
}
