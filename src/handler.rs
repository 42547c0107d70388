//! Handler trait and type erasure.
//!
//! # How async endpoint handlers are stored
//!
//! An [`Endpoint`](crate::Endpoint) must hold a handler of any concrete type
//! and a middleware must be able to call it without knowing that type, so
//! the handler is hidden behind a trait object (`dyn ErasedHandler`).
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! async fn feed(ctx: Context) -> Result<Response, E> { … }   ← user writes this
//!        ↓ Endpoint::new(feed)
//! feed.into_boxed_handler()                                  ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler(feed))                                  ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(ctx)  at request time                         ← one vtable dispatch
//!        ↓
//! Box::pin(async { feed(ctx).await.map(Into::into).map_err(Into::into) })
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::context::Context;
use crate::error::BoxError;
use crate::output::EndpointOutput;

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future resolving to raw endpoint output.
///
/// `Send + 'static` lets tokio move the future across worker threads.
pub type EndpointFuture =
    Pin<Box<dyn Future<Output = Result<EndpointOutput, BoxError>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, ctx: Context) -> EndpointFuture;
}

/// A type-erased handler shared by every request to the endpoint.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid endpoint handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` with the signature:
///
/// ```text
/// async fn name(ctx: Context) -> Result<impl Into<EndpointOutput>, impl Into<BoxError>>
/// ```
///
/// Both [`Response`](crate::Response) and [`LegacyOutput`](crate::LegacyOutput)
/// convert into [`EndpointOutput`]. The trait is **sealed**.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

// ── Blanket implementations ───────────────────────────────────────────────────

impl<F, Fut, R, E> private::Sealed for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Into<EndpointOutput> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
}

impl<F, Fut, R, E> Handler for F
where
    F: Fn(Context) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Into<EndpointOutput> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

// ── Concrete wrapper ──────────────────────────────────────────────────────────

/// Bridges a concrete handler `F` to [`ErasedHandler`].
struct FnHandler<F>(F);

impl<F, Fut, R, E> ErasedHandler for FnHandler<F>
where
    F: Fn(Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<R, E>> + Send + 'static,
    R: Into<EndpointOutput> + Send + 'static,
    E: Into<BoxError> + Send + 'static,
{
    fn call(&self, ctx: Context) -> EndpointFuture {
        let fut = (self.0)(ctx);
        // `Into<BoxError>` on an existing box is the identity, so errors the
        // handler already boxed reach the caller as the same allocation.
        Box::pin(async move { fut.await.map(Into::into).map_err(Into::into) })
    }
}
