//! Endpoint invocation.
//!
//! An [`Endpoint`] pairs one handler with an optional middleware. Invoking it
//! builds the request [`Context`], runs the middleware (which decides whether
//! and when the handler runs) or the handler alone, and normalizes whatever
//! came back into the final [`Response`].

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::context::{Context, RenderContext};
use crate::environment::Environment;
use crate::error::BoxError;
use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{BoxedMiddleware, Middleware, Next};
use crate::normalize::normalize;
use crate::response::Response;

/// A route handler plus the middleware wrapping it.
///
/// ```rust
/// use tsu_endpoint::{BoxError, Context, Endpoint, Response};
///
/// async fn hello(_ctx: Context) -> Result<Response, BoxError> {
///     Ok(Response::text("hello"))
/// }
///
/// let endpoint = Endpoint::new(hello);
/// ```
#[derive(Clone)]
pub struct Endpoint {
    handler: BoxedHandler,
    middleware: Option<BoxedMiddleware>,
}

impl Endpoint {
    pub fn new(handler: impl Handler) -> Self {
        Self { handler: handler.into_boxed_handler(), middleware: None }
    }

    pub fn with_middleware(mut self, middleware: impl Middleware) -> Self {
        self.middleware = Some(Arc::new(middleware));
        self
    }

    /// Answers one request.
    ///
    /// Errors from the handler or middleware are returned exactly as they
    /// produced them. Context and normalization failures are boxed
    /// [`Error`](crate::Error)s. Nothing is retried and no fallback response
    /// is substituted; mapping errors to a status code is the caller's job.
    pub async fn invoke(
        &self,
        env: &Environment,
        render: RenderContext,
    ) -> Result<Response, BoxError> {
        let RenderContext { request, params, props, route, prerendered } = render;
        let ctx = Context::new(request, params, props, env)?;

        debug!(
            route = %route,
            middleware = self.middleware.is_some(),
            "invoking endpoint"
        );

        let output = match &self.middleware {
            Some(middleware) => {
                let next = Next::new(Arc::clone(&self.handler), ctx.clone());
                middleware.call(ctx.clone(), next).await?
            }
            None => self.handler.call(ctx.clone()).await?,
        };

        let server_rendered = env.is_server_rendering() && !prerendered;
        Ok(normalize(output, &ctx, server_rendered, &route, env)?)
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("middleware", &self.middleware.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bytes::Bytes;
    use http::{header, StatusCode};
    use serde_json::json;

    use crate::cookies::Cookie;
    use crate::error::Error;
    use crate::output::{EndpointOutput, LegacyOutput};
    use crate::request::Request;
    use crate::test_support::{capture_warnings, get};

    #[derive(Debug, thiserror::Error)]
    #[error("database unavailable")]
    struct DbDown;

    fn render(route: &str) -> RenderContext {
        RenderContext::new(Request::new(get(route)), route)
    }

    fn set_cookies(res: &Response) -> Vec<&str> {
        res.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect()
    }

    async fn hello(_ctx: Context) -> Result<Response, BoxError> {
        Ok(Response::text("hello"))
    }

    #[tokio::test]
    async fn handler_without_middleware() {
        let res = Endpoint::new(hello)
            .invoke(&Environment::new(), render("/hello"))
            .await
            .unwrap();
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body().as_bytes(), b"hello");
    }

    #[tokio::test]
    async fn handler_can_return_a_bare_status() {
        let endpoint = Endpoint::new(|_ctx: Context| async {
            Ok::<_, BoxError>(StatusCode::NOT_FOUND)
        });
        let res = endpoint.invoke(&Environment::new(), render("/missing")).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn handler_can_return_a_bare_string() {
        let endpoint = Endpoint::new(|_ctx: Context| async { Ok::<_, BoxError>("hi") });
        let res = endpoint.invoke(&Environment::new(), render("/")).await.unwrap();
        assert_eq!(res.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(res.body().as_bytes(), b"hi");
    }

    #[tokio::test]
    async fn params_reach_the_handler() {
        let endpoint = Endpoint::new(|ctx: Context| async move {
            let id = ctx.param("id").unwrap_or("none").to_owned();
            Ok::<_, BoxError>(Response::text(id))
        });
        let res = endpoint
            .invoke(&Environment::new(), render("/users/7").param("id", "7"))
            .await
            .unwrap();
        assert_eq!(res.body().as_bytes(), b"7");
    }

    #[tokio::test]
    async fn handler_errors_propagate_unwrapped() {
        let endpoint = Endpoint::new(|_ctx: Context| async { Err::<Response, _>(DbDown) });
        let err = endpoint.invoke(&Environment::new(), render("/")).await.unwrap_err();
        assert!(err.downcast_ref::<DbDown>().is_some());
        assert_eq!(err.to_string(), "database unavailable");
    }

    #[tokio::test]
    async fn context_errors_surface_as_crate_errors() {
        let req = http::Request::get("/")
            .header("host", "bad host")
            .body(Bytes::new())
            .unwrap();
        let err = Endpoint::new(hello)
            .invoke(&Environment::new(), RenderContext::new(Request::new(req), "/"))
            .await
            .unwrap_err();
        assert!(matches!(err.downcast_ref::<Error>(), Some(Error::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn middleware_locals_are_visible_to_handler() {
        let endpoint = Endpoint::new(|ctx: Context| async move {
            let user = ctx
                .locals()
                .and_then(|l| l.get("user").and_then(|u| u.as_str()).map(str::to_owned))
                .unwrap_or_default();
            Ok::<_, BoxError>(Response::text(user))
        })
        .with_middleware(|ctx: Context, next: Next| async move {
            ctx.set_locals(json!({ "user": "alice" }))?;
            next.run().await
        });

        let res = endpoint.invoke(&Environment::new(), render("/")).await.unwrap();
        assert_eq!(res.body().as_bytes(), b"alice");
    }

    #[tokio::test]
    async fn middleware_can_short_circuit() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let endpoint = Endpoint::new(move |_ctx: Context| {
            seen.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, BoxError>(Response::text("handler")) }
        })
        .with_middleware(|ctx: Context, _next: Next| async move {
            ctx.redirect("/login", None)
        });

        let res = endpoint.invoke(&Environment::new(), render("/")).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/login");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn middleware_can_replace_handler_output() {
        let endpoint = Endpoint::new(hello).with_middleware(|_ctx: Context, next: Next| async move {
            let _ = next.run().await?;
            Ok::<_, BoxError>(EndpointOutput::from(Response::status(StatusCode::NO_CONTENT)))
        });
        let res = endpoint.invoke(&Environment::new(), render("/")).await.unwrap();
        assert_eq!(res.status_code(), StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn cookies_from_middleware_and_handler_attach_once() {
        let endpoint = Endpoint::new(|ctx: Context| async move {
            ctx.cookies().set(Cookie::new("handler", "1"));
            Ok::<_, BoxError>(LegacyOutput::new("ok"))
        })
        .with_middleware(|ctx: Context, next: Next| async move {
            ctx.cookies().set(Cookie::new("middleware", "1"));
            next.run().await
        });

        let res = endpoint.invoke(&Environment::new(), render("/a.txt")).await.unwrap();
        assert_eq!(set_cookies(&res), ["middleware=1", "handler=1"]);
    }

    #[tokio::test]
    async fn native_response_cookies_attach_once() {
        let endpoint = Endpoint::new(|ctx: Context| async move {
            ctx.cookies().set(Cookie::new("a", "1"));
            ctx.cookies().set(Cookie::new("b", "2"));
            Ok::<_, BoxError>(Response::text("ok"))
        });
        let res = endpoint.invoke(&Environment::new(), render("/")).await.unwrap();
        assert_eq!(set_cookies(&res), ["a=1", "b=2"]);
    }

    #[tokio::test]
    async fn prerendered_routes_skip_server_warnings() {
        let (_guard, warnings) = capture_warnings();
        let endpoint = Endpoint::new(|_ctx: Context| async {
            Ok::<_, BoxError>(LegacyOutput::new("x").encoding("utf8"))
        });
        let env = Environment::new().server_rendering(true);

        endpoint.invoke(&env, render("/a.txt").prerendered(true)).await.unwrap();
        assert_eq!(warnings.count(), 1);

        endpoint.invoke(&env, render("/a.txt")).await.unwrap();
        assert_eq!(warnings.count(), 3);
    }

    #[tokio::test]
    async fn client_address_flows_from_request() {
        let endpoint = Endpoint::new(|ctx: Context| async move {
            let addr = ctx.client_address()?;
            Ok::<_, BoxError>(Response::text(addr.to_string()))
        });
        let env = Environment::new().adapter_name("tsu");
        let req = Request::new(get("/")).with_client_address("192.0.2.1".parse().unwrap());

        let res = endpoint.invoke(&env, RenderContext::new(req, "/")).await.unwrap();
        assert_eq!(res.body().as_bytes(), b"192.0.2.1");

        let err = endpoint.invoke(&env, render("/")).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ClientAddressNotAvailable { .. })
        ));
    }
}
