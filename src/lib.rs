//! # tsu-endpoint
//!
//! Endpoint invocation for tsu services: take a request and a resolved
//! handler, run it (optionally inside a middleware), and normalize whatever it
//! returned into one well-formed [`Response`].
//!
//! ## What happens per request
//!
//! 1. A [`Context`] is built from the request, route params and props, plus
//!    the site and adapter name from the [`Environment`].
//! 2. The [`Middleware`](middleware::Middleware), if any, is called with the
//!    context and a [`Next`](middleware::Next) that runs the handler on that
//!    same context. Without middleware the handler is called directly.
//! 3. The raw [`EndpointOutput`] is normalized: a native [`Response`] passes
//!    through, a deprecated [`LegacyOutput`] becomes a `200 OK` typed by the
//!    route's MIME type. Cookies queued on the context are attached once.
//!
//! Handler and middleware errors come back untouched as [`BoxError`]s.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tsu_endpoint::{BoxError, Context, Endpoint, Environment, Response, Server};
//!
//! #[tokio::main]
//! async fn main() {
//!     let endpoint = Endpoint::new(whoami);
//!     let env = Environment::new().server_rendering(true);
//!
//!     Server::bind("0.0.0.0:3000").serve(endpoint, env).await.unwrap();
//! }
//!
//! async fn whoami(ctx: Context) -> Result<Response, BoxError> {
//!     let addr = ctx.client_address()?;
//!     Ok(Response::text(format!("you are {addr}")))
//! }
//! ```

mod context;
mod cookies;
mod encoding;
mod endpoint;
mod environment;
mod error;
mod handler;
mod mime;
mod normalize;
mod output;
mod request;
mod response;
mod server;

pub mod middleware;

#[cfg(test)]
mod test_support;

pub use context::{Context, RenderContext};
pub use cookies::{Cookie, CookieJar, SameSite};
pub use encoding::{is_utf8, BufferEncoder, ByteEncoder, DEFAULT_ENCODING};
pub use endpoint::Endpoint;
pub use environment::Environment;
pub use error::{BoxError, Error};
pub use handler::{EndpointFuture, Handler};
pub use mime::{ExtensionMime, MimeLookup};
pub use normalize::normalize;
pub use output::{EndpointOutput, LegacyBody, LegacyOutput};
pub use request::Request;
pub use response::{Body, ContentType, IntoResponse, Response, ResponseBuilder, ENCODING_HEADER};
pub use server::{Server, ADAPTER_NAME};
