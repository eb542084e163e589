//! Error taxonomy and the per-request error context.
//!
//! Every failure the dispatcher routes to a terminal handler is described by
//! a [`WebFingerError`]. The error is attached to the request with
//! [`with_error`] right before the hand-off, and the terminal handler (the
//! only reader) retrieves it with [`error_from`]. Default handlers never put
//! the error in the response body; embedding applications can install their
//! own handlers to log or format it.

use std::sync::Arc;

use thiserror::Error;
use tracing::warn;

use crate::dispatcher::HandlerRequest;

/// Failures surfaced by the WebFinger pipeline
#[derive(Debug, Error)]
pub enum WebFingerError {
    /// The `resource` value does not start with `acct:`
    #[error("URI is not an account")]
    NotAnAccount,

    /// The `acct:` value has no `@host` component
    #[error("No domain on account")]
    NoDomain,

    /// The query did not contain exactly one `resource` parameter
    #[error("Malformed resource parameter")]
    MalformedResource,

    /// Resolver failure not classified as "not found"
    #[error("resolver failed: {0:#}")]
    Resolver(anyhow::Error),

    /// The resolver classified the account as nonexistent
    #[error("User not found")]
    NotFound,

    /// The resource could not be encoded as JSON
    #[error("failed to encode resource: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl WebFingerError {
    /// Whether the failure comes from a client-supplied value (400 class)
    #[must_use]
    pub fn is_malformed_request(&self) -> bool {
        matches!(
            self,
            Self::NotAnAccount | Self::NoDomain | Self::MalformedResource
        )
    }
}

/// Attach `err` to `req`, returning the augmented request
///
/// `None` leaves the request untouched. The context is write-once: when an
/// error is already recorded the first one is kept and the attempt is logged.
///
/// # Example
///
/// ```rust
/// use webfinger_service::dispatcher::HandlerRequest;
/// use webfinger_service::error::{error_from, with_error, WebFingerError};
///
/// let req = HandlerRequest::get("/.well-known/webfinger");
/// let req = with_error(req, Some(WebFingerError::MalformedResource));
/// assert!(matches!(error_from(&req), Some(WebFingerError::MalformedResource)));
/// ```
#[must_use]
pub fn with_error(mut req: HandlerRequest, err: Option<WebFingerError>) -> HandlerRequest {
    let Some(err) = err else {
        return req;
    };
    match &req.error {
        Some(existing) => {
            warn!(
                request_id = %req.request_id,
                existing = %existing,
                discarded = %err,
                "Request already carries an error; keeping the first one"
            );
        }
        None => req.error = Some(Arc::new(err)),
    }
    req
}

/// Error previously attached with [`with_error`], if any
#[must_use]
pub fn error_from(req: &HandlerRequest) -> Option<&WebFingerError> {
    req.error.as_deref()
}
