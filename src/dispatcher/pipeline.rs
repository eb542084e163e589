use std::io::Write;

use http::Method;
use tracing::{debug, error, info, warn};

use super::core::{HandlerRequest, HandlerResponse};
use crate::account::AccountIdentifier;
use crate::error::{with_error, WebFingerError};
use crate::resource::{Rel, RelationFilter, Resource};
use crate::service::Service;

/// Default path of the WebFinger handler
pub const WEBFINGER_PATH: &str = "/.well-known/webfinger";

/// Outcome of the primary and fallback lookups
enum Lookup {
    Found(Resource),
    NotFound,
    Failed(anyhow::Error),
}

impl Service {
    /// Route a request and return the finished response
    pub fn serve(&self, req: HandlerRequest) -> HandlerResponse {
        let mut res = HandlerResponse::default();
        self.serve_into(req, &mut res);
        res
    }

    /// Route a request: the WebFinger path goes to [`Service::webfinger`],
    /// everything else to the not-found handler
    pub fn serve_into(&self, req: HandlerRequest, res: &mut HandlerResponse) {
        if req.path == WEBFINGER_PATH {
            self.webfinger(req, res);
        } else {
            debug!(request_id = %req.request_id, path = %req.path, "No route for path");
            self.not_found_handler.handle(&req, res);
        }
    }

    /// The WebFinger handler
    ///
    /// Runs the pre-handlers, then checks transport, method and the
    /// `resource` parameter, resolves the account (falling back to the
    /// resolver's dummy user for unknown accounts) and encodes the JRD.
    /// Each failure is routed to its configured terminal handler.
    pub fn webfinger(&self, req: HandlerRequest, res: &mut HandlerResponse) {
        self.pre_handlers.run(&req, res);

        if !req.tls {
            if let Some(no_tls) = &self.no_tls_handler {
                debug!(request_id = %req.request_id, "Plain HTTP request, handing to no-TLS handler");
                no_tls.handle(&req, res);
                return;
            }
        }

        if req.method != Method::GET {
            debug!(request_id = %req.request_id, method = %req.method, "Method not supported");
            self.method_not_supported_handler.handle(&req, res);
            return;
        }

        let resource = {
            let mut values = req.query_values("resource");
            match (values.next(), values.next()) {
                (Some(value), None) => Some(value.to_owned()),
                _ => None,
            }
        };
        let Some(resource) = resource else {
            return self.malformed(req, res, WebFingerError::MalformedResource);
        };

        let account = match AccountIdentifier::parse(&resource) {
            Ok(account) => account,
            Err(failure) => return self.malformed(req, res, failure.into()),
        };

        let filter: RelationFilter = req.query_values("rel").map(Rel::from).collect();

        let mut rsc = match self.lookup(&req, &account, filter.rels()) {
            Lookup::Found(rsc) => rsc,
            Lookup::NotFound => {
                debug!(request_id = %req.request_id, "Account not found, dummy lookup not found either");
                let req = with_error(req, Some(WebFingerError::NotFound));
                self.not_found_handler.handle(&req, res);
                return;
            }
            Lookup::Failed(err) => {
                error!(request_id = %req.request_id, account = %account, error = %err, "Resolver failed");
                let req = with_error(req, Some(WebFingerError::Resolver(err)));
                self.error_handler.handle(&req, res);
                return;
            }
        };

        filter.apply(&mut rsc);

        if let Err(err) = encode(&mut *res, &rsc) {
            return self.encode_failed(req, res, err);
        }

        info!(
            request_id = %req.request_id,
            account = %account,
            links = rsc.links.len(),
            "WebFinger resource served"
        );
    }

    /// Primary lookup, then the anti-enumeration fallback
    fn lookup(&self, req: &HandlerRequest, account: &AccountIdentifier, rels: &[Rel]) -> Lookup {
        let resolver = &self.resolver;

        let err = match resolver.find_user(&account.name, &account.hostname, rels) {
            Ok(rsc) => return Lookup::Found(rsc),
            Err(err) if resolver.is_not_found_error(&err) => err,
            Err(err) => return Lookup::Failed(err),
        };
        debug!(request_id = %req.request_id, account = %account, reason = %err, "Account unknown, trying dummy user");

        match resolver.dummy_user(&account.name, &account.hostname, rels) {
            Ok(rsc) => Lookup::Found(rsc),
            Err(err) if resolver.is_not_found_error(&err) => Lookup::NotFound,
            Err(err) => Lookup::Failed(err),
        }
    }

    fn malformed(&self, req: HandlerRequest, res: &mut HandlerResponse, err: WebFingerError) {
        warn!(request_id = %req.request_id, query = ?req.query, error = %err, "Malformed WebFinger request");
        let req = with_error(req, Some(err));
        self.malformed_request_handler.handle(&req, res);
    }

    fn encode_failed(&self, req: HandlerRequest, res: &mut HandlerResponse, err: WebFingerError) {
        error!(request_id = %req.request_id, error = %err, "Failed to encode resource");
        let req = with_error(req, Some(err));
        self.error_handler.handle(&req, res);
    }
}

/// Stream `rsc` into `out`; bytes written before a failure are kept
fn encode<W: Write>(mut out: W, rsc: &Resource) -> Result<(), WebFingerError> {
    serde_json::to_writer(&mut out, rsc)?;
    out.write_all(b"\n").map_err(serde_json::Error::io)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::error::error_from;
    use crate::resolver::StaticDirectory;
    use crate::resource::Link;

    /// Accepts `limit` bytes, then fails
    struct ShortWriter {
        limit: usize,
        written: Vec<u8>,
    }

    impl Write for ShortWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let room = self.limit - self.written.len();
            if room == 0 {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "connection closed"));
            }
            let n = room.min(buf.len());
            self.written.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_encode_writes_jrd_and_newline() {
        let mut out = Vec::new();
        encode(&mut out, &Resource::with_links(vec![Link::new("x", "x")])).unwrap();
        assert_eq!(out, b"{\"links\":[{\"href\":\"x\",\"ref\":\"x\"}]}\n");
    }

    #[test]
    fn test_encode_failure_reaches_error_handler() {
        let mut writer = ShortWriter {
            limit: 8,
            written: Vec::new(),
        };
        let err = encode(&mut writer, &Resource::with_links(vec![Link::new("x", "x")])).unwrap_err();
        assert!(matches!(err, WebFingerError::Serialization(_)));
        assert_eq!(writer.written, b"{\"links\"");

        let seen = Arc::new(Mutex::new(None));
        let mut service = Service::new(Arc::new(StaticDirectory::default()));
        let captured = Arc::clone(&seen);
        service.error_handler = Arc::new(move |req: &HandlerRequest, res: &mut HandlerResponse| {
            *captured.lock().unwrap() = error_from(req).map(ToString::to_string);
            res.write_status(http::StatusCode::INTERNAL_SERVER_ERROR);
        });

        let mut res = HandlerResponse::default();
        service.encode_failed(HandlerRequest::get(WEBFINGER_PATH), &mut res, err);
        assert_eq!(res.status, 500);
        let cause = seen.lock().unwrap().clone().unwrap();
        assert!(cause.starts_with("failed to encode resource"), "{cause}");
    }
}
