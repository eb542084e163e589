use thiserror::Error;

/// CORS configuration error
///
/// Returned by `CorsMiddlewareBuilder::build()` when the configuration
/// is invalid or violates CORS specification requirements.
#[derive(Debug, Error)]
pub enum CorsConfigError {
    /// Wildcard origin (`*`) cannot be used with credentials
    ///
    /// When `allow_credentials` is `true`, exact origins must be listed.
    #[error(
        "CORS configuration error: Cannot use wildcard origin (*) with credentials. \
         When allow_credentials is true, you must specify exact origins."
    )]
    WildcardWithCredentials,

    /// The origin string does not look like `scheme://host[:port]`
    #[error(
        "CORS configuration error: Invalid origin format '{origin}'. \
         Expected format: scheme://host:port (e.g., https://example.com)"
    )]
    InvalidOriginFormat {
        /// The invalid origin string
        origin: String,
    },

    /// An origin pattern failed to compile
    #[error("CORS configuration error: Invalid origin pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
