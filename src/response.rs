//! Outgoing HTTP response sink.
//!
//! Handlers do not return a response. They receive a `&mut Response` and
//! write into it, which is what lets middleware set headers before the
//! handler runs or short-circuit without ever calling it.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`Response::bytes`].
pub enum ContentType {
    Csv,          // text/csv
    EventStream,  // text/event-stream  (SSE)
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream  (binary / file download)
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    fn as_static(&self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::EventStream => "text/event-stream",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// The response sink handed to every handler and middleware.
///
/// Starts out as `200 OK` with no headers and no body. A handler is expected
/// to write its result exactly once; nothing checks for double writes, the
/// last body written wins.
///
/// ```rust
/// use sprig::{ContentType, Response};
/// use http::StatusCode;
///
/// let mut res = Response::new();
/// res.set_status(StatusCode::CREATED);
/// res.set_header("location", "/users/42");
/// res.json(br#"{"id":42}"#.to_vec());
/// assert_eq!(res.status(), StatusCode::CREATED);
///
/// let mut res = Response::new();
/// res.bytes(ContentType::Xml, b"<ok/>".to_vec());
/// assert_eq!(res.header("content-type"), Some("application/xml"));
/// ```
#[derive(Debug, Default)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Sets a header, replacing any previous values under the same name.
    ///
    /// Returns `false` (and leaves the response untouched) if `name` or
    /// `value` is not valid HTTP.
    pub fn set_header(&mut self, name: &str, value: &str) -> bool {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
                true
            }
            _ => false,
        }
    }

    /// Writes an `application/json` body. Status is left as set.
    pub fn json(&mut self, body: Vec<u8>) {
        self.write(ContentType::Json, body);
    }

    /// Writes a `text/plain; charset=utf-8` body. Status is left as set.
    pub fn text(&mut self, body: impl Into<String>) {
        self.write(ContentType::Text, body.into().into_bytes());
    }

    /// Writes a typed body. Use this for XML, HTML, binary, SSE, etc.
    pub fn bytes(&mut self, content_type: ContentType, body: Vec<u8>) {
        self.write(content_type, body);
    }

    /// Replies with `status` and its canonical reason phrase as a text body.
    pub fn error(&mut self, status: StatusCode) {
        self.status = status;
        self.text(status.canonical_reason().unwrap_or_default());
    }

    /// The reply produced when no route matches.
    pub fn not_found(&mut self) {
        self.error(StatusCode::NOT_FOUND);
    }

    fn write(&mut self, content_type: ContentType, body: Vec<u8>) {
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(content_type.as_static()),
        );
        self.body = body;
    }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(Bytes::from(self.body)));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}
