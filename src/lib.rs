//! # webfinger-service
//!
//! Server side of the WebFinger discovery protocol
//! ([RFC 7033](https://www.rfc-editor.org/rfc/rfc7033)). A query such as
//!
//! ```text
//! GET /.well-known/webfinger?resource=acct:alice@example.com&rel=http://webfinger.net/rel/profile-page
//! ```
//!
//! is answered with a JSON Resource Descriptor (JRD) describing the account.
//! The library owns the protocol: parsing the `acct:` identifier, the TLS and
//! method checks, relation filtering, the anti-enumeration fallback for
//! unknown accounts, and JSON encoding. Account data comes from a
//! [`Resolver`](resolver::Resolver) supplied by the embedding application.
//!
//! ## Architecture
//!
//! - **[`account`]** - `acct:` URI parsing into [`AccountIdentifier`]
//! - **[`resource`]** - JRD data model and relation filtering
//! - **[`resolver`]** - The lookup capability and the config-backed [`StaticDirectory`](resolver::StaticDirectory)
//! - **[`dispatcher`]** - Request/response values and the protocol state machine
//! - **[`middleware`]** - Pre-handlers: cache headers, CORS, content type
//! - **[`service`]** - [`Service`]: resolver, middleware and terminal handlers
//! - **[`error`]** - Error taxonomy and the per-request error context
//! - **[`server`]** - HTTP binding on `may_minihttp` coroutines
//! - **[`config`]**, **[`runtime_config`]**, **[`logging`]**, **[`cli`]** - The `webfinger-server` binary
//!
//! ## Request Handling Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Server as HttpServer<br/>(may_minihttp)
//!     participant Service
//!     participant Chain as Middleware Chain
//!     participant Resolver
//!
//!     Client->>Server: GET /.well-known/webfinger?resource=...
//!     Server->>Service: HandlerRequest
//!     Service->>Chain: NoCache, Cors, Content-Type
//!     Service->>Service: TLS, method, resource checks
//!     Service->>Resolver: find_user / dummy_user
//!     Resolver-->>Service: Resource
//!     Service-->>Server: HandlerResponse (JRD)
//!     Server-->>Client: 200 application/jrd+json
//! ```
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use webfinger_service::resolver::{Resolver, UserNotFound};
//! use webfinger_service::resource::{Link, Rel, Resource};
//! use webfinger_service::dispatcher::HandlerRequest;
//! use webfinger_service::Service;
//!
//! struct OneUser;
//!
//! impl Resolver for OneUser {
//!     fn find_user(&self, name: &str, host: &str, _rels: &[Rel]) -> anyhow::Result<Resource> {
//!         if name == "alice" && host == "example.com" {
//!             Ok(Resource::with_links(vec![Link::new("self", "https://example.com/alice")]))
//!         } else {
//!             Err(UserNotFound.into())
//!         }
//!     }
//!
//!     fn dummy_user(&self, _: &str, _: &str, _: &[Rel]) -> anyhow::Result<Resource> {
//!         Err(UserNotFound.into())
//!     }
//! }
//!
//! let service = Service::new(Arc::new(OneUser));
//! let req = HandlerRequest::get("/.well-known/webfinger?resource=acct:alice@example.com")
//!     .with_tls(true);
//! let res = service.serve(req);
//! assert_eq!(res.status, 200);
//! assert_eq!(res.get_header("Content-Type"), Some("application/jrd+json"));
//! ```

pub mod account;
pub mod cli;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod logging;
pub mod middleware;
pub mod resolver;
pub mod resource;
pub mod runtime_config;
pub mod server;
pub mod service;

pub use account::AccountIdentifier;
pub use dispatcher::{HandlerRequest, HandlerResponse, WEBFINGER_PATH};
pub use error::{error_from, with_error, WebFingerError};
pub use resolver::{Resolver, StaticDirectory, UserNotFound};
pub use resource::{Link, Rel, RelationFilter, Resource};
pub use service::{Handler, Service};
