//! MIME type lookup for legacy endpoint output.
//!
//! Legacy endpoints return a bare body, so the content type comes from the
//! route itself: `/feed.xml` is served as `application/xml`.

/// Maps a route identifier to a MIME type.
pub trait MimeLookup: Send + Sync + 'static {
    fn lookup(&self, route: &str) -> Option<String>;
}

impl<F> MimeLookup for F
where
    F: Fn(&str) -> Option<String> + Send + Sync + 'static,
{
    fn lookup(&self, route: &str) -> Option<String> {
        self(route)
    }
}

/// Lookup by file extension of the route's last path segment.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExtensionMime;

impl MimeLookup for ExtensionMime {
    fn lookup(&self, route: &str) -> Option<String> {
        let segment = route.rsplit('/').next()?;
        let (_, ext) = segment.rsplit_once('.')?;
        let mime = match ext.to_ascii_lowercase().as_str() {
            "txt"         => "text/plain",
            "html" | "htm" => "text/html",
            "css"         => "text/css",
            "csv"         => "text/csv",
            "md"          => "text/markdown",
            "js" | "mjs"  => "text/javascript",
            "json"        => "application/json",
            "xml"         => "application/xml",
            "rss"         => "application/rss+xml",
            "webmanifest" => "application/manifest+json",
            "pdf"         => "application/pdf",
            "wasm"        => "application/wasm",
            "svg"         => "image/svg+xml",
            "png"         => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif"         => "image/gif",
            "webp"        => "image/webp",
            "ico"         => "image/x-icon",
            "woff2"       => "font/woff2",
            _ => return None,
        };
        Some(mime.to_owned())
    }
}
