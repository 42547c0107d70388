//! Response normalization.
//!
//! Whatever an endpoint returned, the caller gets one [`Response`] back with
//! the request's cookies attached. A native response passes through
//! untouched; a [`LegacyOutput`] is turned into a `200 OK` whose content type
//! comes from the route and whose body bytes follow the declared encoding.

use bytes::Bytes;
use http::header::{self, HeaderMap, HeaderValue};
use http::StatusCode;
use tracing::warn;

use crate::context::Context;
use crate::encoding::{is_utf8, DEFAULT_ENCODING};
use crate::environment::Environment;
use crate::error::Error;
use crate::output::{EndpointOutput, LegacyBody, LegacyOutput};
use crate::response::{Body, Response, ENCODING_HEADER};

/// Content type for legacy output whose route has no known MIME type.
const FALLBACK_MIME: &str = "text/plain";

/// Turns raw endpoint output into the response sent to the client.
///
/// `server_rendered` is true when the response is produced per request rather
/// than written to a static file; it only decides which compatibility
/// warnings apply. Cookies queued on `ctx` are attached exactly once, on
/// every path.
pub fn normalize(
    output: EndpointOutput,
    ctx: &Context,
    server_rendered: bool,
    route: &str,
    env: &Environment,
) -> Result<Response, Error> {
    let mut res = match output {
        EndpointOutput::Response(res) => {
            if server_rendered && res.headers().contains_key(&ENCODING_HEADER) {
                warn!(
                    route,
                    "encoding header has no effect on server-rendered endpoints; \
                     the body is sent as-is"
                );
            }
            res
        }
        EndpointOutput::Legacy(legacy) => legacy_response(legacy, server_rendered, route, env)?,
    };
    ctx.cookies().attach_to(&mut res)?;
    Ok(res)
}

fn legacy_response(
    legacy: LegacyOutput,
    server_rendered: bool,
    route: &str,
    env: &Environment,
) -> Result<Response, Error> {
    // An empty name counts as no encoding at all.
    let encoding = legacy.encoding.as_deref().filter(|e| !e.is_empty());

    warn!(
        route,
        "returning a plain object from an endpoint is deprecated; return a Response instead"
    );
    if server_rendered {
        if legacy.headers.is_some() {
            warn!(
                route,
                "`headers` on a plain endpoint object are not supported when rendering \
                 on demand; return a Response to set headers"
            );
        }
        if encoding.is_some() {
            warn!(
                route,
                "`encoding` on a plain endpoint object is ignored when rendering on \
                 demand; it only applies to statically written files"
            );
        }
    }

    let mime = env.mime().lookup(route);
    let mime = mime.as_deref().unwrap_or(FALLBACK_MIME);

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&format!("{mime};charset=utf-8"))?,
    );
    if let Some(encoding) = encoding {
        headers.insert(ENCODING_HEADER, HeaderValue::from_str(encoding)?);
    }

    let body = legacy_body(legacy.body, encoding, env)?;
    // A text body here is in an encoding this process cannot produce, so its
    // final length is unknown.
    if let Body::Bytes(bytes) = &body {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(bytes.len()));
    }

    Ok(Response { body, headers, status: StatusCode::OK })
}

fn legacy_body(body: LegacyBody, encoding: Option<&str>, env: &Environment) -> Result<Body, Error> {
    let text = match body {
        LegacyBody::Bytes(bytes) => return Ok(Body::Bytes(bytes)),
        LegacyBody::Text(text) => text,
    };
    if let Some(encoder) = env.encoder() {
        return Ok(Body::Bytes(encoder.encode(&text, encoding.unwrap_or(DEFAULT_ENCODING))?));
    }
    if encoding.is_none_or(is_utf8) {
        return Ok(Body::Bytes(Bytes::from(text)));
    }
    Ok(Body::Text(text))
}
