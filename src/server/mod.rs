//! HTTP binding on `may_minihttp` coroutines.
//!
//! ```no_run
//! use std::sync::Arc;
//! use webfinger_service::resolver::StaticDirectory;
//! use webfinger_service::server::{HttpServer, WebFingerService};
//! use webfinger_service::Service;
//!
//! let service = Service::new(Arc::new(StaticDirectory::default()));
//! let handle = HttpServer(WebFingerService::new(Arc::new(service)))
//!     .start("127.0.0.1:8080")
//!     .unwrap();
//! handle.wait_ready().unwrap();
//! handle.join().unwrap();
//! ```

pub mod http_server;
pub mod request;
pub mod response;
pub mod service;

pub use http_server::{HttpServer, ServerHandle};
pub use request::{build_request, parse_request, FORWARDED_PROTO_HEADER};
pub use response::write_handler_response;
pub use service::WebFingerService;
