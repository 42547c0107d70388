//! Per-deployment settings shared by every endpoint invocation.

use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::encoding::{BufferEncoder, ByteEncoder};
use crate::error::Error;
use crate::mime::{ExtensionMime, MimeLookup};

/// Deployment configuration for endpoint invocation.
///
/// Built once at startup and shared (usually behind an `Arc`) by all
/// requests. Nothing in here changes while requests are served.
///
/// ```rust
/// use tsu_endpoint::Environment;
///
/// let env = Environment::new()
///     .site("https://example.com")
///     .unwrap()
///     .adapter_name("node")
///     .server_rendering(true);
/// assert!(env.is_server_rendering());
/// ```
#[derive(Clone)]
pub struct Environment {
    site: Option<Url>,
    adapter_name: Option<String>,
    server_rendering: bool,
    mime: Arc<dyn MimeLookup>,
    encoder: Option<Arc<dyn ByteEncoder>>,
}

impl Environment {
    /// Static rendering, no site, no adapter, extension-based MIME lookup and
    /// a [`BufferEncoder`].
    pub fn new() -> Self {
        Self {
            site: None,
            adapter_name: None,
            server_rendering: false,
            mime: Arc::new(ExtensionMime),
            encoder: Some(Arc::new(BufferEncoder)),
        }
    }

    /// The configured site origin. Must be an absolute URL.
    pub fn site(mut self, site: &str) -> Result<Self, Error> {
        self.site = Some(Url::parse(site)?);
        Ok(self)
    }

    pub fn adapter_name(mut self, name: impl Into<String>) -> Self {
        self.adapter_name = Some(name.into());
        self
    }

    /// Render on request (`true`) or ahead of time to static files (`false`).
    pub fn server_rendering(mut self, enabled: bool) -> Self {
        self.server_rendering = enabled;
        self
    }

    pub fn mime_lookup(mut self, lookup: impl MimeLookup) -> Self {
        self.mime = Arc::new(lookup);
        self
    }

    /// Replaces the byte encoder. `None` leaves only UTF-8 available.
    pub fn byte_encoder<E: ByteEncoder>(mut self, encoder: Option<E>) -> Self {
        self.encoder = encoder.map(|e| Arc::new(e) as Arc<dyn ByteEncoder>);
        self
    }

    pub fn site_url(&self) -> Option<&Url> { self.site.as_ref() }
    pub fn adapter(&self) -> Option<&str> { self.adapter_name.as_deref() }
    pub fn is_server_rendering(&self) -> bool { self.server_rendering }

    pub(crate) fn mime(&self) -> &dyn MimeLookup { self.mime.as_ref() }

    pub(crate) fn encoder(&self) -> Option<&dyn ByteEncoder> { self.encoder.as_deref() }
}

impl Default for Environment {
    fn default() -> Self { Self::new() }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Environment")
            .field("site", &self.site.as_ref().map(Url::as_str))
            .field("adapter_name", &self.adapter_name)
            .field("server_rendering", &self.server_rendering)
            .field("byte_encoder", &self.encoder.is_some())
            .finish_non_exhaustive()
    }
}
