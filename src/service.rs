//! # Service Configuration
//!
//! [`Service`] bundles everything the dispatcher needs: the resolver, the
//! pre-handler chain and one handler per terminal state. Every field is
//! public and may be replaced after [`Service::new`] and before serving
//! starts; replacing one handler leaves the other defaults untouched.
//!
//! | Field                          | Default                                   |
//! |--------------------------------|-------------------------------------------|
//! | `not_found_handler`            | 404, empty body                           |
//! | `method_not_supported_handler` | 405, empty body                           |
//! | `malformed_request_handler`    | 400, empty body                           |
//! | `error_handler`                | 500, empty body                           |
//! | `no_tls_handler`               | 303 to the `https` URL (`None` allows plain HTTP) |
//!
//! Terminal handlers can read the failure cause with
//! [`crate::error::error_from`]:
//!
//! ```rust
//! use std::sync::Arc;
//! use webfinger_service::dispatcher::{HandlerRequest, HandlerResponse};
//! use webfinger_service::error::error_from;
//! use webfinger_service::resolver::StaticDirectory;
//! use webfinger_service::Service;
//!
//! let mut service = Service::new(Arc::new(StaticDirectory::default()));
//! service.error_handler = Arc::new(|req: &HandlerRequest, res: &mut HandlerResponse| {
//!     if let Some(err) = error_from(req) {
//!         tracing::error!(error = %err, "webfinger lookup failed");
//!     }
//!     res.status = 500;
//! });
//! ```

use std::sync::Arc;

use http::StatusCode;

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::middleware::{self, MiddlewareChain};
use crate::resolver::Resolver;

/// Terminal handler for one dispatcher outcome
pub trait Handler: Send + Sync {
    fn handle(&self, req: &HandlerRequest, res: &mut HandlerResponse);
}

impl<F> Handler for F
where
    F: Fn(&HandlerRequest, &mut HandlerResponse) + Send + Sync,
{
    fn handle(&self, req: &HandlerRequest, res: &mut HandlerResponse) {
        self(req, res)
    }
}

/// The WebFinger service: resolver, middleware and terminal handlers
pub struct Service {
    /// Run before every WebFinger request, in order
    pub pre_handlers: MiddlewareChain,

    /// Unmatched paths, and unknown users whose dummy lookup is also
    /// not found
    pub not_found_handler: Arc<dyn Handler>,

    /// Any method other than `GET` on the WebFinger path
    pub method_not_supported_handler: Arc<dyn Handler>,

    /// Missing, repeated or unparseable `resource` parameter
    pub malformed_request_handler: Arc<dyn Handler>,

    /// Requests without TLS; `None` serves plain HTTP, which is not advised
    pub no_tls_handler: Option<Arc<dyn Handler>>,

    /// Resolver and encoding failures
    pub error_handler: Arc<dyn Handler>,

    /// Account lookup backend
    pub resolver: Arc<dyn Resolver>,
}

impl Service {
    /// Create a service with the default handlers and middleware
    pub fn new(resolver: Arc<dyn Resolver>) -> Self {
        Self {
            pre_handlers: middleware::default_chain(),
            not_found_handler: Arc::new(default_not_found_handler),
            method_not_supported_handler: Arc::new(default_method_not_supported_handler),
            malformed_request_handler: Arc::new(default_malformed_request_handler),
            no_tls_handler: Some(Arc::new(default_no_tls_handler)),
            error_handler: Arc::new(default_error_handler),
            resolver,
        }
    }
}

impl std::fmt::Debug for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("pre_handlers", &self.pre_handlers)
            .field("requires_tls", &self.no_tls_handler.is_some())
            .finish_non_exhaustive()
    }
}

pub fn default_error_handler(_req: &HandlerRequest, res: &mut HandlerResponse) {
    res.write_status(StatusCode::INTERNAL_SERVER_ERROR);
}

pub fn default_not_found_handler(_req: &HandlerRequest, res: &mut HandlerResponse) {
    res.write_status(StatusCode::NOT_FOUND);
}

pub fn default_method_not_supported_handler(_req: &HandlerRequest, res: &mut HandlerResponse) {
    res.write_status(StatusCode::METHOD_NOT_ALLOWED);
}

pub fn default_malformed_request_handler(_req: &HandlerRequest, res: &mut HandlerResponse) {
    res.write_status(StatusCode::BAD_REQUEST);
}

/// Redirect to the same URL over `https`
pub fn default_no_tls_handler(req: &HandlerRequest, res: &mut HandlerResponse) {
    res.set_header("location", req.url_with_scheme("https"));
    res.write_status(StatusCode::SEE_OTHER);
}
