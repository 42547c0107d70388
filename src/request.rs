//! Incoming HTTP request type.
//!
//! Besides the `http` parts, a request carries two pieces of out-of-band
//! metadata: the peer address recorded by the transport adapter (in its
//! [`http::Extensions`]) and the request-scoped locals slot. Both live on the
//! request instance itself, so they are dropped with it and can never be
//! observed by another request.

use std::net::IpAddr;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::RwLock;
use serde_json::{Map, Value};

/// Peer address recorded by a transport adapter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ClientAddress(pub(crate) IpAddr);

/// Shared storage behind `Context::locals`.
///
/// Cloning the slot clones the handle, not the data: every layer that sees
/// this request sees the same map.
#[derive(Clone, Debug, Default)]
pub(crate) struct LocalsSlot(Arc<RwLock<Option<Map<String, Value>>>>);

impl LocalsSlot {
    pub(crate) fn get(&self) -> Option<Map<String, Value>> {
        self.0.read().clone()
    }

    pub(crate) fn set(&self, locals: Map<String, Value>) {
        *self.0.write() = Some(locals);
    }
}

/// An incoming HTTP request with its body fully buffered.
#[derive(Debug)]
pub struct Request {
    inner: http::Request<Bytes>,
    locals: LocalsSlot,
}

impl Request {
    /// Wraps an `http` request with an empty locals slot of its own.
    pub fn new(inner: http::Request<Bytes>) -> Self {
        Self { inner, locals: LocalsSlot::default() }
    }

    /// Records the peer address. Transport adapters call this; endpoints read
    /// it back through `Context::client_address`.
    pub fn with_client_address(mut self, addr: IpAddr) -> Self {
        self.inner.extensions_mut().insert(ClientAddress(addr));
        self
    }

    pub fn method(&self) -> &http::Method { self.inner.method() }
    pub fn uri(&self) -> &http::Uri { self.inner.uri() }
    pub fn headers(&self) -> &http::HeaderMap { self.inner.headers() }
    pub fn body(&self) -> &Bytes { self.inner.body() }

    /// Case-insensitive header lookup. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers().get(name).and_then(|v| v.to_str().ok())
    }

    pub(crate) fn client_address(&self) -> Option<IpAddr> {
        self.inner.extensions().get::<ClientAddress>().map(|c| c.0)
    }

    pub(crate) fn locals(&self) -> &LocalsSlot {
        &self.locals
    }
}

impl From<http::Request<Bytes>> for Request {
    fn from(inner: http::Request<Bytes>) -> Self {
        Self::new(inner)
    }
}
