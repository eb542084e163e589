use http::method::InvalidMethod;
use http::Method;
use may_minihttp::Request;
use tracing::debug;

use crate::dispatcher::HandlerRequest;
use crate::ids::{RequestId, REQUEST_ID_HEADER};

/// Header set by TLS-terminating proxies
pub const FORWARDED_PROTO_HEADER: &str = "x-forwarded-proto";

/// Convert a `may_minihttp::Request` into a [`HandlerRequest`]
///
/// `req.path()` is the raw request target, query included. The connection
/// itself is never TLS; with `trust_forwarded_proto` the request counts as
/// TLS when the proxy reports `X-Forwarded-Proto: https`.
///
/// # Errors
///
/// Returns an error when the method is not a valid HTTP token.
pub fn parse_request(
    req: &Request,
    trust_forwarded_proto: bool,
) -> Result<HandlerRequest, InvalidMethod> {
    build_request(
        req.method(),
        req.path(),
        req.headers().iter().map(|h| (h.name, h.value)),
        trust_forwarded_proto,
    )
}

/// Transport-independent half of [`parse_request`]
pub fn build_request<'a>(
    method: &str,
    target: &str,
    headers: impl IntoIterator<Item = (&'a str, &'a [u8])>,
    trust_forwarded_proto: bool,
) -> Result<HandlerRequest, InvalidMethod> {
    let method = Method::from_bytes(method.as_bytes())?;
    let mut req = HandlerRequest::new(method, target);
    for (name, value) in headers {
        req = req.with_header(name, String::from_utf8_lossy(value));
    }

    req.request_id = RequestId::from_header_or_new(req.get_header(REQUEST_ID_HEADER));
    req.tls = trust_forwarded_proto && forwarded_https(&req);

    debug!(
        request_id = %req.request_id,
        method = %req.method,
        path = %req.path,
        headers_count = req.headers.len(),
        tls = req.tls,
        "HTTP request parsed"
    );
    Ok(req)
}

/// First hop of `X-Forwarded-Proto` is `https`
fn forwarded_https(req: &HandlerRequest) -> bool {
    req.get_header(FORWARDED_PROTO_HEADER)
        .and_then(|v| v.split(',').next())
        .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"))
}
