//! # Resolver Module
//!
//! The resolver is how the WebFinger service looks up a user or resource. It
//! is supplied by the embedding application, since every deployment exposes a
//! different set of users, resources and services.
//!
//! ## Contract
//!
//! - [`Resolver::find_user`] resolves a known identity and returns a
//!   "not found" error for identities that do not exist.
//! - [`Resolver::dummy_user`] produces a plausible fake resource for unknown
//!   identities so that a real and a made-up account cannot be told apart by
//!   response shape. Returning a "not found" error keeps the 404 behaviour.
//! - [`Resolver::is_not_found_error`] classifies errors returned by the two
//!   lookups, including errors wrapped with additional context.
//!
//! The default classification recognises [`UserNotFound`] anywhere in the
//! error chain, so resolvers can simply return
//! `Err(UserNotFound.into())` or wrap it with `anyhow::Context`.
//!
//! ## Example
//!
//! ```rust
//! use webfinger_service::resolver::{Resolver, UserNotFound};
//! use webfinger_service::resource::{Link, Rel, Resource};
//!
//! struct OnlyAlice;
//!
//! impl Resolver for OnlyAlice {
//!     fn find_user(&self, name: &str, _host: &str, _rels: &[Rel]) -> anyhow::Result<Resource> {
//!         if name == "alice" {
//!             Ok(Resource::with_links(vec![Link::new("self", "https://example.com/alice")]))
//!         } else {
//!             Err(UserNotFound.into())
//!         }
//!     }
//!
//!     fn dummy_user(&self, _name: &str, _host: &str, _rels: &[Rel]) -> anyhow::Result<Resource> {
//!         Err(UserNotFound.into())
//!     }
//! }
//! ```

mod directory;

pub use directory::StaticDirectory;

use thiserror::Error;

use crate::resource::{Rel, Resource};

/// Marker error for nonexistent accounts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Error)]
#[error("User not found")]
pub struct UserNotFound;

/// Lookup backend consumed by the dispatcher
pub trait Resolver: Send + Sync {
    /// Find the user given the username and hostname
    fn find_user(&self, username: &str, hostname: &str, rels: &[Rel]) -> anyhow::Result<Resource>;

    /// Produce a stand-in resource for an unknown user, or a not-found error
    fn dummy_user(&self, username: &str, hostname: &str, rels: &[Rel]) -> anyhow::Result<Resource>;

    /// Whether `err` means "no such user"
    fn is_not_found_error(&self, err: &anyhow::Error) -> bool {
        is_user_not_found(err)
    }
}

/// True when [`UserNotFound`] appears anywhere in the error chain
pub fn is_user_not_found(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| cause.is::<UserNotFound>())
}
