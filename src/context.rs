//! The request context handed to middleware and endpoints.
//!
//! One [`Context`] is built per request. Cloning it is cheap and every clone
//! refers to the same request, cookie jar and locals, so middleware and the
//! endpoint it wraps observe each other's changes while other requests stay
//! invisible.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use http::StatusCode;
use serde_json::{Map, Value};
use url::Url;

use crate::cookies::CookieJar;
use crate::environment::Environment;
use crate::error::Error;
use crate::request::Request;
use crate::response::{Body, Response, ResponseBuilder};

/// Per-request input from whoever resolved the route.
#[derive(Debug)]
pub struct RenderContext {
    pub request: Request,
    pub params: HashMap<String, String>,
    pub props: Map<String, Value>,
    /// Route identifier, e.g. `/feed.xml` or `/api/[id].json`.
    pub route: String,
    /// The route was rendered ahead of time, even if the site renders on demand.
    pub prerendered: bool,
}

impl RenderContext {
    pub fn new(request: Request, route: impl Into<String>) -> Self {
        Self {
            request,
            params: HashMap::new(),
            props: Map::new(),
            route: route.into(),
            prerendered: false,
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn props(mut self, props: Map<String, Value>) -> Self {
        self.props = props;
        self
    }

    pub fn prerendered(mut self, prerendered: bool) -> Self {
        self.prerendered = prerendered;
        self
    }
}

#[derive(Debug)]
struct Inner {
    request: Request,
    params: HashMap<String, String>,
    props: Map<String, Value>,
    url: Url,
    site: Option<Url>,
    adapter_name: Option<String>,
    cookies: CookieJar,
}

/// Everything an endpoint needs to answer one request.
#[derive(Clone, Debug)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// Builds the context for `request`, taking site and adapter name from
    /// `env`.
    pub fn new(
        request: Request,
        params: HashMap<String, String>,
        props: Map<String, Value>,
        env: &Environment,
    ) -> Result<Self, Error> {
        let url = request_url(&request)?;
        let cookies = CookieJar::from_request(&request);
        Ok(Self {
            inner: Arc::new(Inner {
                request,
                params,
                props,
                url,
                site: env.site_url().cloned(),
                adapter_name: env.adapter().map(str::to_owned),
                cookies,
            }),
        })
    }

    pub fn request(&self) -> &Request { &self.inner.request }
    pub fn params(&self) -> &HashMap<String, String> { &self.inner.params }
    pub fn props(&self) -> &Map<String, Value> { &self.inner.props }
    pub fn url(&self) -> &Url { &self.inner.url }
    pub fn site(&self) -> Option<&Url> { self.inner.site.as_ref() }
    pub fn cookies(&self) -> &CookieJar { &self.inner.cookies }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.inner.params.get(name).map(String::as_str)
    }

    /// See [`Response::redirect`].
    pub fn redirect(&self, path: &str, status: Option<StatusCode>) -> Result<Response, Error> {
        Response::redirect(path, status)
    }

    /// See [`Response::with_encoding`].
    pub fn encoded_response(
        &self,
        body: impl Into<Body>,
        init: ResponseBuilder,
        encoding: &str,
    ) -> Result<Response, Error> {
        Response::with_encoding(body, init, encoding)
    }

    /// The peer address the transport adapter recorded, returned verbatim.
    pub fn client_address(&self) -> Result<IpAddr, Error> {
        if let Some(addr) = self.inner.request.client_address() {
            return Ok(addr);
        }
        Err(match &self.inner.adapter_name {
            Some(adapter) => Error::ClientAddressNotAvailable { adapter: adapter.clone() },
            None => Error::StaticClientAddressNotAvailable,
        })
    }

    /// Request-scoped data, `None` until something sets it.
    pub fn locals(&self) -> Option<Map<String, Value>> {
        self.inner.request.locals().get()
    }

    /// Replaces the request-scoped data. Only JSON objects are accepted.
    pub fn set_locals(&self, locals: Value) -> Result<(), Error> {
        match locals {
            Value::Object(map) => {
                self.inner.request.locals().set(map);
                Ok(())
            }
            _ => Err(Error::LocalsNotAnObject),
        }
    }
}

/// Absolute URL of `req`. Origin-form URIs are resolved against `Host`.
fn request_url(req: &Request) -> Result<Url, Error> {
    let uri = req.uri();
    if uri.scheme().is_some() {
        return Ok(Url::parse(&uri.to_string())?);
    }
    let host = req
        .header(http::header::HOST.as_str())
        .or_else(|| uri.authority().map(|a| a.as_str()))
        .unwrap_or("localhost");
    let path = uri.path_and_query().map_or("/", |p| p.as_str());
    Ok(Url::parse(&format!("http://{host}{path}"))?)
}
