//! What an endpoint hands back before normalization.

use bytes::Bytes;
use http::{HeaderMap, StatusCode};

use crate::response::{IntoResponse, Response};

/// Raw endpoint output.
///
/// `Response` is the shape new code should return. `Legacy` is the older
/// body-plus-encoding object, still accepted and normalized into a
/// [`Response`] with a deprecation warning.
#[derive(Clone, Debug)]
pub enum EndpointOutput {
    Response(Response),
    Legacy(LegacyOutput),
}

impl From<Response> for EndpointOutput {
    fn from(res: Response) -> Self { Self::Response(res) }
}

impl From<LegacyOutput> for EndpointOutput {
    fn from(legacy: LegacyOutput) -> Self { Self::Legacy(legacy) }
}

// Shorthands endpoints can return directly; they go through `IntoResponse`.

impl From<StatusCode> for EndpointOutput {
    fn from(code: StatusCode) -> Self { Self::Response(code.into_response()) }
}

impl From<String> for EndpointOutput {
    fn from(s: String) -> Self { Self::Response(s.into_response()) }
}

impl From<&'static str> for EndpointOutput {
    fn from(s: &'static str) -> Self { Self::Response(s.into_response()) }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LegacyBody {
    Text(String),
    Bytes(Bytes),
}

impl From<String> for LegacyBody {
    fn from(s: String) -> Self { Self::Text(s) }
}

impl From<&str> for LegacyBody {
    fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<Bytes> for LegacyBody {
    fn from(b: Bytes) -> Self { Self::Bytes(b) }
}

impl From<Vec<u8>> for LegacyBody {
    fn from(v: Vec<u8>) -> Self { Self::Bytes(Bytes::from(v)) }
}

/// Deprecated endpoint output: a body, optionally headers, optionally the
/// name of the byte encoding the body should be written in.
///
/// ```rust
/// use tsu_endpoint::LegacyOutput;
///
/// let out = LegacyOutput::new("hello").encoding("utf8");
/// assert_eq!(out.encoding.as_deref(), Some("utf8"));
/// ```
#[derive(Clone, Debug)]
pub struct LegacyOutput {
    pub body: LegacyBody,
    /// Never applied to the response; only warned about under server rendering.
    pub headers: Option<HeaderMap>,
    pub encoding: Option<String>,
}

impl LegacyOutput {
    pub fn new(body: impl Into<LegacyBody>) -> Self {
        Self { body: body.into(), headers: None, encoding: None }
    }

    pub fn encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }
}
