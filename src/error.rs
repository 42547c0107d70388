//! Unified error type.

/// Errors raised by handlers and middleware.
///
/// Endpoint code returns whatever error it likes; tsu boxes it once at the
/// handler boundary and hands the very same box back to the caller.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The error type returned by tsu's fallible operations.
///
/// Application-level outcomes (404, redirects, etc.) are expressed as
/// [`Response`](crate::Response) values, not as `Error`s. This type surfaces
/// misuse of the request context and infrastructure failures.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An adapter is configured but it did not record the peer address.
    #[error(
        "client address is not available in the `{adapter}` adapter; \
         the adapter must record it on each request"
    )]
    ClientAddressNotAvailable { adapter: String },

    /// No adapter at all: statically rendered output has no client.
    #[error(
        "client address is not available when rendering statically; \
         switch the route to server rendering to read it"
    )]
    StaticClientAddressNotAvailable,

    #[error("locals can only be assigned an object")]
    LocalsNotAnObject,

    #[error("unsupported byte encoding `{0}`")]
    UnsupportedEncoding(String),

    #[error("body is not valid `{encoding}`: {reason}")]
    InvalidBody { encoding: String, reason: String },

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
