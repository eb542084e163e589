use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use http::StatusCode;
use may_minihttp::{HttpService, Request, Response};
use tracing::{debug, error, info, warn};

use super::request::parse_request;
use super::response::write_handler_response;
use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::service::Service;

/// `may_minihttp` adapter for a [`Service`]
///
/// Cloned once per connection; clones share the service.
#[derive(Clone, Debug)]
pub struct WebFingerService {
    service: Arc<Service>,
    trust_forwarded_proto: bool,
}

impl WebFingerService {
    pub fn new(service: Arc<Service>) -> Self {
        Self {
            service,
            trust_forwarded_proto: false,
        }
    }

    /// Treat `X-Forwarded-Proto: https` as a TLS request
    #[must_use]
    pub fn trust_forwarded_proto(mut self, trust: bool) -> Self {
        self.trust_forwarded_proto = trust;
        self
    }

    /// Run the dispatcher, turning a panic into a `500`
    pub fn handle(&self, req: HandlerRequest) -> HandlerResponse {
        let start = Instant::now();
        let request_id = req.request_id;
        let method = req.method.clone();
        let path = req.path.clone();

        let service = &self.service;
        match panic::catch_unwind(AssertUnwindSafe(|| service.serve(req))) {
            Ok(res) => {
                let latency_us = start.elapsed().as_micros() as u64;
                if res.status >= 500 {
                    warn!(%request_id, %method, %path, status = res.status, latency_us, "Request failed");
                } else {
                    info!(%request_id, %method, %path, status = res.status, latency_us, "Request completed");
                }
                res
            }
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "non-string panic payload".to_string());
                error!(%request_id, %method, %path, panic = %message, "Handler panicked");
                let mut res = HandlerResponse::default();
                res.write_status(StatusCode::INTERNAL_SERVER_ERROR);
                res
            }
        }
    }
}

impl HttpService for WebFingerService {
    fn call(&mut self, req: Request, rsp: &mut Response) -> io::Result<()> {
        let res = match parse_request(&req, self.trust_forwarded_proto) {
            Ok(hreq) => self.handle(hreq),
            Err(err) => {
                debug!(method = req.method(), error = %err, "Rejecting request with invalid method");
                let mut res = HandlerResponse::default();
                res.write_status(StatusCode::BAD_REQUEST);
                res
            }
        };
        write_handler_response(rsp, res);
        Ok(())
    }
}
