//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! [`Response`] is the canonical shape everything ends up as: endpoints may
//! return it directly, and legacy endpoint output is normalized into it.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;

use crate::error::Error;

/// Header carrying the byte encoding a response body was meant to be written
/// with. `http` has no notion of a body charset, so the declared encoding
/// rides along as metadata for whoever writes the body to disk later.
pub const ENCODING_HEADER: HeaderName = HeaderName::from_static("x-astro-encoding");

// ── ContentType ───────────────────────────────────────────────────────────────

/// Common content-type values for use with [`ResponseBuilder::bytes`].
pub enum ContentType {
    Csv,          // text/csv
    Html,         // text/html; charset=utf-8
    Json,         // application/json
    OctetStream,  // application/octet-stream
    Text,         // text/plain; charset=utf-8
    Xml,          // application/xml
}

impl ContentType {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Csv         => "text/csv",
            Self::Html        => "text/html; charset=utf-8",
            Self::Json        => "application/json",
            Self::OctetStream => "application/octet-stream",
            Self::Text        => "text/plain; charset=utf-8",
            Self::Xml         => "application/xml",
        }
    }
}

// ── Body ──────────────────────────────────────────────────────────────────────

/// A response payload.
///
/// Almost always `Bytes`. `Text` survives only when a legacy endpoint asked
/// for an encoding nothing in this process can produce; the string is then
/// handed on untouched and the [`ENCODING_HEADER`] tells the writer what to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {
    Bytes(Bytes),
    Text(String),
}

impl Body {
    pub fn empty() -> Self {
        Self::Bytes(Bytes::new())
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Bytes(b) => b,
            Self::Text(s) => s.as_bytes(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_bytes(self) -> Bytes {
        match self {
            Self::Bytes(b) => b,
            Self::Text(s) => Bytes::from(s),
        }
    }
}

impl Default for Body {
    fn default() -> Self { Self::empty() }
}

impl From<Bytes> for Body {
    fn from(b: Bytes) -> Self { Self::Bytes(b) }
}

impl From<Vec<u8>> for Body {
    fn from(v: Vec<u8>) -> Self { Self::Bytes(Bytes::from(v)) }
}

impl From<&'static [u8]> for Body {
    fn from(b: &'static [u8]) -> Self { Self::Bytes(Bytes::from_static(b)) }
}

impl From<String> for Body {
    fn from(s: String) -> Self { Self::Bytes(Bytes::from(s)) }
}

impl From<&'static str> for Body {
    fn from(s: &'static str) -> Self { Self::Bytes(Bytes::from_static(s.as_bytes())) }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// # Shortcuts (200 OK, no custom headers needed)
///
/// ```rust
/// use http::StatusCode;
/// use tsu_endpoint::Response;
///
/// Response::json(br#"{"id":1}"#.to_vec());
/// Response::text("hello");
/// Response::status(StatusCode::NO_CONTENT);
/// ```
///
/// # Builder (custom status or headers)
///
/// ```rust
/// use http::{header, HeaderValue, StatusCode};
/// use tsu_endpoint::{ContentType, Response};
///
/// Response::builder()
///     .status(StatusCode::CREATED)
///     .header(header::LOCATION, HeaderValue::from_static("/users/42"))
///     .json(br#"{"id":42}"#.to_vec());
///
/// Response::builder().bytes(ContentType::Xml, b"<ok/>".to_vec());
/// ```
#[derive(Clone, Debug)]
pub struct Response {
    pub(crate) body: Body,
    pub(crate) headers: HeaderMap,
    pub(crate) status: StatusCode,
}

impl Response {
    /// `200 OK` — `application/json`.
    pub fn json(body: Vec<u8>) -> Self {
        Self::builder().json(body)
    }

    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { body: Body::empty(), headers: HeaderMap::new(), status: code }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    /// Empty-bodied redirect to `path`. `status` defaults to `302 Found`.
    pub fn redirect(path: &str, status: Option<StatusCode>) -> Result<Self, Error> {
        let location = HeaderValue::from_str(path)?;
        Ok(Self::builder()
            .status(status.unwrap_or(StatusCode::FOUND))
            .header(header::LOCATION, location)
            .no_body())
    }

    /// Builds the same response `init.body(body)` would, then records
    /// `encoding` under [`ENCODING_HEADER`].
    pub fn with_encoding(
        body: impl Into<Body>,
        init: ResponseBuilder,
        encoding: &str,
    ) -> Result<Self, Error> {
        let value = HeaderValue::from_str(encoding)?;
        let mut res = init.body(body);
        res.headers.insert(ENCODING_HEADER, value);
        Ok(res)
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn headers_mut(&mut self) -> &mut HeaderMap { &mut self.headers }
    pub fn body(&self) -> &Body { &self.body }

    /// The declared byte encoding, if the response carries one.
    pub fn encoding(&self) -> Option<&str> {
        self.headers.get(&ENCODING_HEADER).and_then(|v| v.to_str().ok())
    }

    /// Converts into the `http` response hyper sends on the wire.
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body.into_bytes()));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method — you always know what you're sending.
#[derive(Clone, Debug)]
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Appends a header; repeated names are kept, not replaced.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.append(name, value);
        self
    }

    /// Terminate with a JSON body (`application/json`).
    pub fn json(self, body: Vec<u8>) -> Response {
        self.finish(ContentType::Json.as_str(), body.into())
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        let body: String = body.into();
        self.finish(ContentType::Text.as_str(), body.into())
    }

    /// Terminate with a typed body. Use this for XML, HTML, binary, etc.
    pub fn bytes(self, content_type: ContentType, body: Vec<u8>) -> Response {
        self.finish(content_type.as_str(), body.into())
    }

    /// Terminate with a body and whatever headers were set, nothing added.
    pub fn body(self, body: impl Into<Body>) -> Response {
        Response { body: body.into(), headers: self.headers, status: self.status }
    }

    /// Terminate with no body (e.g. `204 No Content`, redirects).
    pub fn no_body(self) -> Response {
        self.body(Body::empty())
    }

    fn finish(mut self, content_type: &'static str, body: Body) -> Response {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        self.body(body)
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
///
/// Implement on your own types to return them directly from endpoints.
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

/// Return a [`StatusCode`] directly: `return Ok(StatusCode::NOT_FOUND)`
impl IntoResponse for StatusCode {
    fn into_response(self) -> Response { Response::status(self) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_defaults_to_found() {
        let res = Response::redirect("/x", None).unwrap();
        assert_eq!(res.status_code(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/x");
        assert!(res.body().is_empty());
    }

    #[test]
    fn redirect_keeps_explicit_status() {
        let res = Response::redirect("/y", Some(StatusCode::MOVED_PERMANENTLY)).unwrap();
        assert_eq!(res.status_code(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(res.headers()[header::LOCATION], "/y");
    }

    #[test]
    fn redirect_rejects_control_characters() {
        assert!(matches!(
            Response::redirect("/bad\n", None),
            Err(Error::InvalidHeader(_))
        ));
    }

    #[test]
    fn with_encoding_only_adds_the_marker() {
        let init = Response::builder()
            .status(StatusCode::ACCEPTED)
            .header(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        let res = Response::with_encoding("abc", init, "latin1").unwrap();

        assert_eq!(res.status_code(), StatusCode::ACCEPTED);
        assert_eq!(res.headers()[header::CACHE_CONTROL], "no-store");
        assert_eq!(res.encoding(), Some("latin1"));
        assert_eq!(res.body().as_bytes(), b"abc");
        assert_eq!(res.headers().len(), 2);
    }

    #[test]
    fn text_sets_content_type() {
        let res = Response::text("hi");
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(res.encoding(), None);
    }

    #[test]
    fn into_http_carries_status_headers_and_body() {
        let res = Response::builder()
            .status(StatusCode::CREATED)
            .json(b"{}".to_vec())
            .into_http();
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/json");
    }

    #[test]
    fn status_codes_and_strings_convert() {
        assert_eq!(StatusCode::NOT_FOUND.into_response().status_code(), StatusCode::NOT_FOUND);
        assert_eq!("hi".into_response().body().as_bytes(), b"hi");
    }

    #[test]
    fn text_body_converts_to_its_utf8_bytes() {
        let body = Body::Text("héllo".to_owned());
        assert_eq!(body.len(), 6);
        assert_eq!(body.into_bytes(), Bytes::from_static("héllo".as_bytes()));
    }
}
