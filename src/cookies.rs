//! Request-bound cookie jar.
//!
//! The jar reads the inbound `Cookie` header once and collects outgoing
//! cookies set by middleware and endpoint code. The collected cookies are
//! written to the response by [`CookieJar::attach_to`], which drains the jar:
//! calling it again adds nothing.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use http::header::{self, HeaderValue};
use parking_lot::Mutex;

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Strict => "Strict",
            Self::Lax => "Lax",
            Self::None => "None",
        })
    }
}

/// An outgoing cookie.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<Duration>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            path: None,
            domain: None,
            max_age: None,
            secure: false,
            http_only: false,
            same_site: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = Some(max_age);
        self
    }

    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    pub fn http_only(mut self, http_only: bool) -> Self {
        self.http_only = http_only;
        self
    }

    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }

    /// `Set-Cookie` header value.
    pub fn to_header_value(&self) -> String {
        let mut out = format!("{}={}", self.name, self.value);
        if let Some(path) = &self.path {
            out.push_str(&format!("; Path={path}"));
        }
        if let Some(domain) = &self.domain {
            out.push_str(&format!("; Domain={domain}"));
        }
        if let Some(max_age) = &self.max_age {
            out.push_str(&format!("; Max-Age={}", max_age.as_secs()));
        }
        if self.secure {
            out.push_str("; Secure");
        }
        if self.http_only {
            out.push_str("; HttpOnly");
        }
        if let Some(same_site) = &self.same_site {
            out.push_str(&format!("; SameSite={same_site}"));
        }
        out
    }
}

/// Cookies of one request. Cheap to clone; clones share the same jar.
#[derive(Clone, Debug, Default)]
pub struct CookieJar {
    incoming: Arc<HashMap<String, String>>,
    outgoing: Arc<Mutex<Vec<Cookie>>>,
}

impl CookieJar {
    pub fn from_request(req: &Request) -> Self {
        let incoming = req
            .headers()
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                Some((name.trim().to_owned(), value.trim().to_owned()))
            })
            .collect();
        Self { incoming: Arc::new(incoming), outgoing: Arc::default() }
    }

    /// Value of an inbound cookie.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.incoming.get(name).map(String::as_str)
    }

    pub fn has(&self, name: &str) -> bool {
        self.incoming.contains_key(name)
    }

    /// Queues `cookie` for the response. A later cookie with the same name
    /// replaces an earlier one.
    pub fn set(&self, cookie: Cookie) {
        let mut outgoing = self.outgoing.lock();
        outgoing.retain(|c| c.name != cookie.name);
        outgoing.push(cookie);
    }

    /// Queues an already-expired cookie so the client drops `name`.
    pub fn delete(&self, name: &str) {
        self.set(Cookie::new(name, "").with_max_age(Duration::ZERO));
    }

    /// Cookies queued so far, in the order they were set.
    pub fn pending(&self) -> Vec<Cookie> {
        self.outgoing.lock().clone()
    }

    /// Appends one `Set-Cookie` header per queued cookie and empties the jar.
    pub fn attach_to(&self, res: &mut Response) -> Result<(), Error> {
        let cookies = std::mem::take(&mut *self.outgoing.lock());
        for cookie in cookies {
            let value = HeaderValue::from_str(&cookie.to_header_value())?;
            res.headers_mut().append(header::SET_COOKIE, value);
        }
        Ok(())
    }
}
