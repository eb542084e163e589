//! Request and response values passed through the pipeline.
//!
//! Both types are transport-neutral: the `server` module builds a
//! [`HandlerRequest`] from a `may_minihttp` request and writes the
//! [`HandlerResponse`] back, while tests and the CLI construct them directly.

use std::borrow::Cow;
use std::io;
use std::sync::Arc;

use http::Method;
use smallvec::SmallVec;

use crate::error::WebFingerError;
use crate::ids::RequestId;

/// Maximum inline headers before heap allocation
pub const MAX_INLINE_HEADERS: usize = 16;

/// Maximum inline query parameters before heap allocation
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated header storage for the hot path
///
/// Header names use `Arc<str>`; most names are static strings set by
/// middleware and cloning them is an atomic increment.
pub type HeaderVec = SmallVec<[(Arc<str>, String); MAX_INLINE_HEADERS]>;

/// Decoded query parameters in request order, duplicates kept
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// An inbound request as seen by middleware, the dispatcher and handlers
#[derive(Debug, Clone)]
pub struct HandlerRequest {
    /// Unique request ID for tracing and correlation
    pub request_id: RequestId,
    /// HTTP method (GET, POST, etc.)
    pub method: Method,
    /// Request path without the query string
    pub path: String,
    /// Raw (still percent-encoded) query string, if any
    pub query: Option<String>,
    /// Decoded query parameters in the order they appeared
    pub query_params: ParamVec,
    /// HTTP headers
    pub headers: HeaderVec,
    /// Authority from an absolute request target, else the `Host` header
    pub host: Option<String>,
    /// Whether the request arrived over a TLS-secured connection
    pub tls: bool,
    /// Error recorded by the dispatcher before a terminal hand-off
    pub(crate) error: Option<Arc<WebFingerError>>,
}

impl HandlerRequest {
    /// Build a request from a method and a request target
    ///
    /// The target may be origin-form (`/path?query`) or absolute-form
    /// (`https://host/path?query`); an empty authority is accepted.
    pub fn new(method: Method, target: &str) -> Self {
        let (authority, path, query) = split_target(target);
        let query_params = query.map(parse_query).unwrap_or_default();
        Self {
            request_id: RequestId::new(),
            method,
            path: path.to_owned(),
            query: query.map(str::to_owned),
            query_params,
            headers: HeaderVec::new(),
            host: authority.filter(|a| !a.is_empty()).map(str::to_owned),
            tls: false,
            error: None,
        }
    }

    /// `GET` request for `target`
    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    /// Mark the request as received over TLS
    #[must_use]
    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Append a header; a `Host` header also fills `host` when unset
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        let value = value.into();
        if name.eq_ignore_ascii_case("host") && self.host.is_none() && !value.is_empty() {
            self.host = Some(value.clone());
        }
        self.headers.push((Arc::from(name), value));
        self
    }

    /// Get a header by name (case-insensitive per RFC 7230)
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Every value of the query parameter `name`, in request order
    pub fn query_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.query_params
            .iter()
            .filter(move |(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Reconstruct the request URL using `scheme`
    ///
    /// Path and query are reproduced exactly as received.
    #[must_use]
    pub fn url_with_scheme(&self, scheme: &str) -> String {
        let mut url = format!("{scheme}://{}{}", self.host.as_deref().unwrap_or(""), self.path);
        if let Some(query) = &self.query {
            url.push('?');
            url.push_str(query);
        }
        url
    }
}

/// Split a request target into (authority, path, query)
fn split_target(target: &str) -> (Option<&str>, &str, Option<&str>) {
    let (before_query, query) = match target.split_once('?') {
        Some((head, q)) => (head, Some(q)),
        None => (target, None),
    };
    let Some((_scheme, rest)) = before_query.split_once("://") else {
        return (None, before_query, query);
    };
    match rest.find('/') {
        Some(idx) => {
            let (authority, path) = rest.split_at(idx);
            (Some(authority), path, query)
        }
        None => (Some(rest), "/", query),
    }
}

fn parse_query(query: &str) -> ParamVec {
    url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
        .collect()
}

/// Response assembled by middleware and handlers
///
/// Starts as `200` with no headers and an empty body. The JSON encoder writes
/// into it through [`io::Write`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    /// HTTP status code (200, 404, 500, etc.)
    pub status: u16,
    /// HTTP response headers (stack-allocated for ≤16 headers)
    pub headers: HeaderVec,
    /// Raw response body
    pub body: Vec<u8>,
}

impl Default for HandlerResponse {
    fn default() -> Self {
        Self::new(200, HeaderVec::new(), Vec::new())
    }
}

impl HandlerResponse {
    /// Create a new response with the given status, headers, and body
    #[must_use]
    pub fn new(status: u16, headers: HeaderVec, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or update a header
    pub fn set_header(&mut self, name: &str, value: String) {
        // Remove existing header with same name (case-insensitive)
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value));
    }

    /// Set the status code, leaving headers and body untouched
    pub fn write_status(&mut self, status: http::StatusCode) {
        self.status = status.as_u16();
    }

    /// Body as text, for logging and tests
    #[must_use]
    pub fn body_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

impl io::Write for HandlerResponse {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.body.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
