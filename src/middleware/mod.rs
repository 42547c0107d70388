//! Middleware boundary.
//!
//! A middleware wraps one endpoint handler. It receives the request
//! [`Context`] and a [`Next`] continuation; it may inspect or change the
//! context (set locals, queue cookies), short-circuit with its own output, or
//! call [`Next::run`] and pass on or replace what the handler produced.
//!
//! Composing several middleware into one is up to the caller: tsu only knows
//! the single wrapper it is given.
//!
//! ```rust
//! use serde_json::json;
//! use tsu_endpoint::middleware::Next;
//! use tsu_endpoint::{BoxError, Context, EndpointOutput};
//!
//! async fn auth(ctx: Context, next: Next) -> Result<EndpointOutput, BoxError> {
//!     ctx.set_locals(json!({ "user": "alice" }))?;
//!     next.run().await
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use crate::context::Context;
use crate::error::BoxError;
use crate::handler::{BoxedHandler, EndpointFuture};
use crate::output::EndpointOutput;

/// Continuation that invokes the wrapped handler against the same
/// [`Context`] the middleware received.
///
/// `run` consumes `Next`, so the handler runs at most once per request.
pub struct Next {
    handler: BoxedHandler,
    ctx: Context,
}

impl Next {
    pub(crate) fn new(handler: BoxedHandler, ctx: Context) -> Self {
        Self { handler, ctx }
    }

    pub async fn run(self) -> Result<EndpointOutput, BoxError> {
        self.handler.call(self.ctx).await
    }
}

/// A wrapper around one endpoint handler.
///
/// Implemented for every `Fn(Context, Next) -> impl Future<Output =
/// Result<R, E>>` where `R: Into<EndpointOutput>` and `E: Into<BoxError>`.
pub trait Middleware: Send + Sync + 'static {
    fn call(&self, ctx: Context, next: Next) -> EndpointFuture;
}

impl<F, Fut, R, E> Middleware for F
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Into<EndpointOutput> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    fn call(&self, ctx: Context, next: Next) -> EndpointFuture {
        let fut = self(ctx, next);
        Box::pin(async move { fut.await.map(Into::into).map_err(Into::into) })
    }
}

/// A type-erased middleware shared by every request to the endpoint.
pub type BoxedMiddleware = Arc<dyn Middleware>;
