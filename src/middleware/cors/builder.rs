use http::Method;
use regex::Regex;

use super::{CorsConfigError, CorsMiddleware, OriginValidation};

/// Builder for creating `CorsMiddleware` with a fluent API
///
/// # Example
///
/// ```rust
/// use webfinger_service::middleware::CorsMiddlewareBuilder;
///
/// let cors = CorsMiddlewareBuilder::new()
///     .allowed_origins(&["https://example.com", "https://app.example.com"])
///     .expose_headers(&["X-Request-Id"])
///     .max_age(3600)
///     .build()
///     .expect("valid CORS configuration");
/// ```
pub struct CorsMiddlewareBuilder {
    allowed_origins: Vec<String>,
    origin_patterns: Vec<String>,
    allowed_headers: Vec<String>,
    allowed_methods: Vec<Method>,
    allow_credentials: bool,
    expose_headers: Vec<String>,
    max_age: Option<u32>,
}

impl CorsMiddlewareBuilder {
    /// Create a new builder with secure defaults
    ///
    /// Default configuration:
    /// - No origins allowed (empty list)
    /// - Headers: `["Content-Type", "Authorization"]`
    /// - Methods: `GET, OPTIONS`
    /// - Credentials: `false`
    /// - Exposed headers: empty
    /// - Max age: `None` (no preflight caching)
    pub fn new() -> Self {
        Self {
            allowed_origins: vec![],
            origin_patterns: vec![],
            allowed_headers: vec!["Content-Type".into(), "Authorization".into()],
            allowed_methods: vec![Method::GET, Method::OPTIONS],
            allow_credentials: false,
            expose_headers: vec![],
            max_age: None,
        }
    }

    /// Set allowed origins; `&["*"]` allows every origin
    pub fn allowed_origins(mut self, origins: &[&str]) -> Self {
        self.allowed_origins = origins.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Allow origins matching any of these regular expressions
    ///
    /// Patterns are combined with exact origins; an origin is allowed when it
    /// matches either.
    pub fn allowed_origin_patterns(mut self, patterns: &[&str]) -> Self {
        self.origin_patterns = patterns.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set allowed HTTP methods
    pub fn allowed_methods(mut self, methods: &[Method]) -> Self {
        self.allowed_methods = methods.to_vec();
        self
    }

    /// Set allowed headers; `&["*"]` allows all headers
    pub fn allowed_headers(mut self, headers: &[&str]) -> Self {
        self.allowed_headers = headers.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Enable or disable credentials (not combinable with `*`)
    pub fn allow_credentials(mut self, allow: bool) -> Self {
        self.allow_credentials = allow;
        self
    }

    /// Set headers readable by browser scripts
    pub fn expose_headers(mut self, headers: &[&str]) -> Self {
        self.expose_headers = headers.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Set preflight cache duration in seconds
    pub fn max_age(mut self, seconds: u32) -> Self {
        self.max_age = Some(seconds);
        self
    }

    /// Validate the configuration and build the middleware
    ///
    /// # Errors
    ///
    /// - `WildcardWithCredentials` when `*` is combined with credentials
    /// - `InvalidOriginFormat` for an exact origin without a scheme
    /// - `InvalidPattern` when a regex does not compile
    pub fn build(self) -> Result<CorsMiddleware, CorsConfigError> {
        let wildcard = self.allowed_origins.iter().any(|o| o == "*");
        if self.allow_credentials && wildcard {
            return Err(CorsConfigError::WildcardWithCredentials);
        }

        let origin_validation = if wildcard {
            OriginValidation::Wildcard
        } else {
            if let Some(bad) = self
                .allowed_origins
                .iter()
                .find(|o| !o.contains("://") || o.ends_with('/'))
            {
                return Err(CorsConfigError::InvalidOriginFormat {
                    origin: bad.clone(),
                });
            }
            let patterns = self
                .origin_patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|source| CorsConfigError::InvalidPattern {
                        pattern: p.clone(),
                        source,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            OriginValidation::List {
                exact: self.allowed_origins,
                patterns,
            }
        };

        Ok(CorsMiddleware {
            origin_validation,
            allowed_headers: self.allowed_headers,
            allowed_methods: self.allowed_methods,
            allow_credentials: self.allow_credentials,
            expose_headers: self.expose_headers,
            max_age: self.max_age,
        })
    }
}

impl Default for CorsMiddlewareBuilder {
    fn default() -> Self {
        Self::new()
    }
}
