mod builder;
mod error;

pub use builder::CorsMiddlewareBuilder;
pub use error::CorsConfigError;

use std::sync::Arc;

use http::Method;
use regex::Regex;
use tracing::{debug, warn};

use crate::dispatcher::{HandlerRequest, HandlerResponse};
use crate::middleware::Middleware;

/// Origin validation strategy
#[derive(Clone)]
pub enum OriginValidation {
    /// Wildcard (allow all origins)
    Wildcard,
    /// Exact origins plus regex patterns
    List {
        exact: Vec<String>,
        patterns: Vec<Regex>,
    },
    /// Custom validation function
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl std::fmt::Debug for OriginValidation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OriginValidation::Wildcard => write!(f, "Wildcard"),
            OriginValidation::List { exact, patterns } => f
                .debug_struct("List")
                .field("exact", exact)
                .field(
                    "patterns",
                    &patterns.iter().map(|re| re.as_str()).collect::<Vec<_>>(),
                )
                .finish(),
            OriginValidation::Custom(_) => write!(f, "Custom(<function>)"),
        }
    }
}

impl OriginValidation {
    fn is_allowed(&self, origin: &str) -> bool {
        match self {
            OriginValidation::Wildcard => true,
            OriginValidation::List { exact, patterns } => {
                exact.iter().any(|o| o == origin) || patterns.iter().any(|re| re.is_match(origin))
            }
            OriginValidation::Custom(validator) => validator(origin),
        }
    }

    fn is_wildcard(&self) -> bool {
        matches!(self, OriginValidation::Wildcard)
    }
}

/// Cross-origin resource sharing for WebFinger responses
///
/// RFC 7033 §5 asks servers to let browser clients query them, so the
/// default service installs [`CorsMiddleware::permissive`]. This middleware
/// only ever adds headers: it never rejects a request or changes the status,
/// leaving method handling to the dispatcher.
///
/// Headers are added whenever the request carries an allowed `Origin`,
/// including origins that share the request host. Preflight requests (`OPTIONS`
/// with `Access-Control-Request-Method`) also receive the allowed methods,
/// headers and max age.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    pub(crate) origin_validation: OriginValidation,
    pub(crate) allowed_headers: Vec<String>,
    pub(crate) allowed_methods: Vec<Method>,
    pub(crate) allow_credentials: bool,
    pub(crate) expose_headers: Vec<String>,
    pub(crate) max_age: Option<u32>,
}

impl CorsMiddleware {
    /// Allow every origin, without credentials
    ///
    /// Configuration:
    /// - `allowed_origins`: `*`
    /// - `allowed_headers`: `["Content-Type", "Authorization"]`
    /// - `allowed_methods`: `GET, OPTIONS`
    /// - `allow_credentials`: `false`
    /// - `max_age`: `None`
    pub fn permissive() -> Self {
        Self {
            origin_validation: OriginValidation::Wildcard,
            allowed_headers: vec!["Content-Type".into(), "Authorization".into()],
            allowed_methods: vec![Method::GET, Method::OPTIONS],
            allow_credentials: false,
            expose_headers: vec![],
            max_age: None,
        }
    }

    /// Allow origins accepted by `validator`
    pub fn with_custom_validator<F>(validator: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Self {
            origin_validation: OriginValidation::Custom(Arc::new(validator)),
            ..Self::permissive()
        }
    }

    /// Allowed value for `Access-Control-Allow-Origin`, or `None`
    fn validate_origin(&self, origin: &str) -> Option<String> {
        if !self.origin_validation.is_allowed(origin) {
            return None;
        }
        if self.origin_validation.is_wildcard() {
            Some("*".to_string())
        } else {
            Some(origin.to_string())
        }
    }

    fn add_preflight_headers(&self, req: &HandlerRequest, res: &mut HandlerResponse) {
        let Some(requested) = req.get_header("access-control-request-method") else {
            return;
        };
        match requested.parse::<Method>() {
            Ok(m) if self.allowed_methods.contains(&m) => {}
            _ => {
                warn!("CORS preflight: method {} not in allowed methods", requested);
                return;
            }
        }

        let methods = self
            .allowed_methods
            .iter()
            .map(|m| m.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        res.set_header("access-control-allow-methods", methods);
        res.set_header("access-control-allow-headers", self.allowed_headers.join(", "));
        if let Some(age) = self.max_age {
            res.set_header("access-control-max-age", age.to_string());
        }
    }
}

impl Middleware for CorsMiddleware {
    fn before(&self, req: &HandlerRequest, res: &mut HandlerResponse) {
        let Some(origin) = req.get_header("origin") else {
            // Not a CORS request
            return;
        };

        let Some(allowed) = self.validate_origin(origin) else {
            debug!(origin, "CORS: origin not allowed, no CORS headers added");
            return;
        };

        let wildcard = allowed == "*";
        res.set_header("access-control-allow-origin", allowed);
        if !wildcard {
            res.set_header("vary", "Origin".to_string());
        }
        if self.allow_credentials {
            res.set_header("access-control-allow-credentials", "true".to_string());
        }
        if !self.expose_headers.is_empty() {
            res.set_header("access-control-expose-headers", self.expose_headers.join(", "));
        }

        if req.method == Method::OPTIONS {
            self.add_preflight_headers(req, res);
        }
    }
}
