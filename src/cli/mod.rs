//! # CLI Module
//!
//! Command-line interface of the `webfinger-server` binary.
//!
//! ## Commands
//!
//! ### `serve`
//!
//! Serve WebFinger over HTTP until SIGTERM or SIGINT:
//!
//! ```bash
//! webfinger-server serve --config webfinger.yaml --listen 0.0.0.0:8080
//! ```
//!
//! ### `lookup`
//!
//! Run a single query through the full dispatcher (middleware, TLS check,
//! resolver, fallback) without opening a socket, and print the status line,
//! headers and body:
//!
//! ```bash
//! webfinger-server lookup --config webfinger.yaml \
//!     --resource acct:alice@example.com \
//!     --rel http://webfinger.net/rel/profile-page
//! ```
//!
//! `--plain-http` sends the query without TLS, which shows the redirect when
//! `require_tls` is set.
//!
//! ### `check`
//!
//! Validate a configuration file and print a summary:
//!
//! ```bash
//! webfinger-server check --config webfinger.yaml
//! ```
//!
//! All commands read the config path from `WEBFINGER_CONFIG` when `--config`
//! is omitted.

mod commands;


pub use commands::{lookup, run, run_cli, start, Cli, Commands, LOOKUP_HOST};
