use super::Middleware;
use crate::dispatcher::{HandlerRequest, HandlerResponse};

/// Media type of a JSON Resource Descriptor
pub const JRD_CONTENT_TYPE: &str = "application/jrd+json";

/// Marks every response as non-cacheable
///
/// WebFinger answers depend on the queried account and relation filter, so
/// intermediaries must revalidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCacheMiddleware;

impl Middleware for NoCacheMiddleware {
    fn before(&self, _req: &HandlerRequest, res: &mut HandlerResponse) {
        res.set_header("cache-control", "no-cache".to_owned());
        res.set_header("pragma", "no-cache".to_owned());
    }
}

/// Declares the JRD media type
///
/// Any `Accept` header on the request is ignored: JRD is the only
/// representation offered.
#[derive(Debug, Clone, Copy, Default)]
pub struct JrdContentTypeMiddleware;

impl Middleware for JrdContentTypeMiddleware {
    fn before(&self, _req: &HandlerRequest, res: &mut HandlerResponse) {
        res.set_header("content-type", JRD_CONTENT_TYPE.to_owned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_cache_headers() {
        let mut res = HandlerResponse::default();
        NoCacheMiddleware.before(&HandlerRequest::get("/"), &mut res);
        assert_eq!(res.get_header("Cache-Control"), Some("no-cache"));
        assert_eq!(res.get_header("Pragma"), Some("no-cache"));
        assert!(res.body.is_empty());
        assert_eq!(res.status, 200);
    }

    #[test]
    fn test_content_type_ignores_accept() {
        let req = HandlerRequest::get("/").with_header("Accept", "text/html");
        let mut res = HandlerResponse::default();
        JrdContentTypeMiddleware.before(&req, &mut res);
        assert_eq!(res.get_header("content-type"), Some(JRD_CONTENT_TYPE));
    }
}
