//! # Dispatcher Module
//!
//! The dispatcher is the WebFinger protocol state machine. For each request
//! it runs a fixed sequence of steps; the first failing step hands the
//! request to its terminal handler on [`crate::Service`] and stops.
//!
//! ## Request Flow
//!
//! 1. **Path routing**: only `/.well-known/webfinger` is served; any other
//!    path goes straight to the not-found handler (no middleware, no headers)
//! 2. **Pre-handlers**: the middleware chain sets response headers
//! 3. **Transport**: plain HTTP goes to the no-TLS handler when one is set
//! 4. **Method**: anything but `GET` → method-not-supported (405)
//! 5. **Cardinality**: exactly one `resource` parameter, else malformed (400)
//! 6. **Parsing**: the `resource` must be an `acct:user@host` URI, else
//!    malformed (400)
//! 7. **Relations**: every `rel` parameter, in order, duplicates kept
//! 8. **Lookup**: `find_user`; a not-found error falls through to step 9,
//!    any other error → error handler (500)
//! 9. **Fallback**: `dummy_user`; not-found → not-found handler (404), any
//!    other error → error handler (500)
//! 10. **Encoding**: links outside the `rel` filter are dropped and the JRD
//!     is streamed into the body
//!
//! Steps 8–9 make a made-up account indistinguishable from a real one unless
//! the resolver chooses otherwise.
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant Service
//!     participant Chain as Middleware Chain
//!     participant Resolver
//!
//!     Client->>Service: GET /.well-known/webfinger?resource=acct:a@b
//!     Service->>Chain: run pre-handlers
//!     Service->>Service: TLS / method / resource checks
//!     Service->>Resolver: find_user("a", "b", rels)
//!     alt not found
//!         Service->>Resolver: dummy_user("a", "b", rels)
//!     end
//!     Service-->>Client: 200 application/jrd+json
//! ```

mod core;
mod pipeline;

pub use core::{
    HandlerRequest, HandlerResponse, HeaderVec, ParamVec, MAX_INLINE_HEADERS, MAX_INLINE_PARAMS,
};
pub use pipeline::WEBFINGER_PATH;
