//! # Middleware Module
//!
//! Pre-request handlers run by the dispatcher before any protocol check, in
//! registration order. They only add or change response headers.
//!
//! The default chain holds three named slots:
//!
//! | Name                      | Middleware                   | Effect                                          |
//! |---------------------------|------------------------------|-------------------------------------------------|
//! | [`NO_CACHE_MIDDLEWARE`]     | [`NoCacheMiddleware`]        | `Cache-Control: no-cache`, `Pragma: no-cache`   |
//! | [`CORS_MIDDLEWARE`]         | [`CorsMiddleware::permissive`] | `Access-Control-*` for cross-origin requests  |
//! | [`CONTENT_TYPE_MIDDLEWARE`] | [`JrdContentTypeMiddleware`] | `Content-Type: application/jrd+json`            |
//!
//! Replace a slot with [`MiddlewareChain::register`] or make it inert with
//! [`MiddlewareChain::disable`]:
//!
//! ```rust
//! use std::sync::Arc;
//! use webfinger_service::middleware::{CorsMiddlewareBuilder, CORS_MIDDLEWARE, NO_CACHE_MIDDLEWARE};
//! use webfinger_service::resolver::StaticDirectory;
//! use webfinger_service::Service;
//!
//! let mut service = Service::new(Arc::new(StaticDirectory::default()));
//! let cors = CorsMiddlewareBuilder::new()
//!     .allowed_origins(&["https://app.example.com"])
//!     .build()
//!     .unwrap();
//! service.pre_handlers.register(CORS_MIDDLEWARE, Arc::new(cors));
//! service.pre_handlers.disable(NO_CACHE_MIDDLEWARE);
//! ```

mod core;
mod cors;
mod headers;

use std::sync::Arc;

pub use core::{Middleware, MiddlewareChain};
pub use cors::{CorsConfigError, CorsMiddleware, CorsMiddlewareBuilder, OriginValidation};
pub use headers::{JrdContentTypeMiddleware, NoCacheMiddleware, JRD_CONTENT_TYPE};

/// Slot name of the cache-suppression middleware
pub const NO_CACHE_MIDDLEWARE: &str = "NoCache";
/// Slot name of the CORS middleware
pub const CORS_MIDDLEWARE: &str = "Cors";
/// Slot name of the content-type middleware
pub const CONTENT_TYPE_MIDDLEWARE: &str = "Content-Type";

/// The default pre-handler chain
pub fn default_chain() -> MiddlewareChain {
    let mut chain = MiddlewareChain::new();
    chain.register(NO_CACHE_MIDDLEWARE, Arc::new(NoCacheMiddleware));
    chain.register(CORS_MIDDLEWARE, Arc::new(CorsMiddleware::permissive()));
    chain.register(CONTENT_TYPE_MIDDLEWARE, Arc::new(JrdContentTypeMiddleware));
    chain
}
