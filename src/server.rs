//! HTTP transport adapter and graceful shutdown.
//!
//! [`Server`] serves a single [`Endpoint`] over HTTP/1.1 and HTTP/2. Every
//! request path is handed to the endpoint as its route identifier; choosing
//! between endpoints is left to whatever sits in front.
//!
//! The adapter records the peer IP on each request, so
//! `Context::client_address` works, and registers itself as adapter
//! [`ADAPTER_NAME`] unless the environment already names one.
//!
//! # Graceful shutdown
//!
//! On **SIGTERM** or Ctrl-C the server stops accepting connections, lets
//! every in-flight connection finish, then returns from [`Server::serve`].

use std::convert::Infallible;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::context::RenderContext;
use crate::endpoint::Endpoint;
use crate::environment::Environment;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

/// Adapter name reported in client-address errors.
pub const ADAPTER_NAME: &str = "tsu";

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and answering every request with
    /// `endpoint`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, endpoint: Endpoint, env: Environment) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        let shared = Arc::new((endpoint, adapter_environment(env)));

        info!(addr = %self.addr, "tsu listening");

        let mut tasks = tokio::task::JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Check shutdown first so a SIGTERM stops accepting at once,
                // even with connections queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let shared = Arc::clone(&shared);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // Called once per request on the connection.
                        let svc = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
                            let shared = Arc::clone(&shared);
                            async move {
                                let (endpoint, env) = &*shared;
                                dispatch(endpoint, env, req, remote_addr).await
                            }
                        });

                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet stays bounded.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        info!("tsu stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Names this adapter in `env` unless another adapter already is.
fn adapter_environment(env: Environment) -> Environment {
    match env.adapter() {
        Some(_) => env,
        None => env.adapter_name(ADAPTER_NAME),
    }
}

/// Buffers one request body, then hands the request to [`respond`].
///
/// A body that cannot be read becomes `400 Bad Request`; hyper never sees an
/// error.
async fn dispatch<B>(
    endpoint: &Endpoint,
    env: &Environment,
    req: http::Request<B>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible>
where
    B: hyper::body::Body<Data = Bytes>,
    B::Error: fmt::Display,
{
    let (parts, body) = req.into_parts();
    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            warn!(peer = %remote_addr, "failed to read request body: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_http());
        }
    };

    let req = http::Request::from_parts(parts, body);
    Ok(respond(endpoint, env, req, remote_addr).await.into_http())
}

/// Answers one buffered request. The path is the route identifier and the
/// peer IP is recorded for `Context::client_address`. Endpoint errors become
/// `500 Internal Server Error`.
async fn respond(
    endpoint: &Endpoint,
    env: &Environment,
    req: http::Request<Bytes>,
    remote_addr: SocketAddr,
) -> Response {
    let route = req.uri().path().to_owned();
    let request = Request::new(req).with_client_address(remote_addr.ip());

    match endpoint.invoke(env, RenderContext::new(request, route.as_str())).await {
        Ok(res) => res,
        Err(e) => {
            error!(route = %route, "endpoint failed: {e}");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first SIGTERM or SIGINT (Ctrl-C only on Windows).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::pin::Pin;
    use std::task::{Context as TaskContext, Poll};

    use hyper::body::Frame;

    use crate::context::Context;
    use crate::error::BoxError;
    use crate::test_support::get;

    fn peer() -> SocketAddr {
        "203.0.113.9:51000".parse().unwrap()
    }

    async fn echo_ip(ctx: Context) -> Result<Response, BoxError> {
        Ok(Response::text(ctx.client_address()?.to_string()))
    }

    /// A request body whose first read fails.
    struct BrokenBody;

    impl hyper::body::Body for BrokenBody {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut TaskContext<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::other("connection reset"))))
        }
    }

    #[test]
    fn adapter_name_defaults_to_tsu() {
        assert_eq!(adapter_environment(Environment::new()).adapter(), Some(ADAPTER_NAME));
        let named = Environment::new().adapter_name("edge");
        assert_eq!(adapter_environment(named).adapter(), Some("edge"));
    }

    #[tokio::test]
    async fn peer_ip_reaches_client_address() {
        let env = adapter_environment(Environment::new());
        let res = respond(&Endpoint::new(echo_ip), &env, get("/ip"), peer()).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body().as_bytes(), b"203.0.113.9");
    }

    #[tokio::test]
    async fn path_is_the_route_identifier() {
        let legacy = Endpoint::new(|_ctx: Context| async {
            Ok::<_, BoxError>(crate::output::LegacyOutput::new("{}"))
        });
        let res = respond(&legacy, &Environment::new(), get("/data.json"), peer()).await;
        assert_eq!(res.headers()[http::header::CONTENT_TYPE], "application/json;charset=utf-8");
    }

    #[tokio::test]
    async fn endpoint_errors_become_500() {
        let failing = Endpoint::new(|_ctx: Context| async {
            Err::<Response, BoxError>("boom".into())
        });
        let res = respond(&failing, &Environment::new(), get("/"), peer()).await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.body().is_empty());
    }

    #[tokio::test]
    async fn dispatch_buffers_the_body() {
        let echo = Endpoint::new(|ctx: Context| async move {
            Ok::<_, BoxError>(Response::builder().body(ctx.request().body().clone()))
        });
        let req = http::Request::post("/echo")
            .header("host", "example.com")
            .body(Full::new(Bytes::from_static(b"ping")))
            .unwrap();

        let res = dispatch(&echo, &Environment::new(), req, peer()).await.unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from_static(b"ping"));
    }

    #[tokio::test]
    async fn unreadable_body_becomes_400() {
        let req = http::Request::post("/").body(BrokenBody).unwrap();
        let res = dispatch(&Endpoint::new(echo_ip), &Environment::new(), req, peer())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
