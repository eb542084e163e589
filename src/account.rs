//! `acct:` URI parsing.
//!
//! WebFinger clients name an account with `acct:user@host` (RFC 7565). The
//! parser here is deliberately permissive: it only splits the identifier into
//! its name and authority parts and leaves syntax checks (DNS validity,
//! allowed characters) to the resolver.

use std::fmt;
use std::str::FromStr;

use crate::error::WebFingerError;

/// URI scheme prefix for account identifiers
pub const ACCT_PREFIX: &str = "acct:";

/// An account named by an `acct:` URI
///
/// `hostname` is the authority component only; anything after the first `/`
/// is discarded during parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AccountIdentifier {
    /// Local part before the `@`
    pub name: String,
    /// Authority part after the `@`, up to the first `/`
    pub hostname: String,
}

/// Parse failure carrying whatever was extracted before the failure
///
/// For [`WebFingerError::NoDomain`] the `partial` identifier has `name`
/// populated and an empty `hostname`. Callers must still treat it as a hard
/// failure.
#[derive(Debug)]
pub struct ParseFailure {
    /// Why parsing failed
    pub error: WebFingerError,
    /// Fields extracted before the failure, empty where nothing was read
    pub partial: AccountIdentifier,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for ParseFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<ParseFailure> for WebFingerError {
    fn from(failure: ParseFailure) -> Self {
        failure.error
    }
}

impl AccountIdentifier {
    /// Build an identifier from its parts
    pub fn new(name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hostname: hostname.into(),
        }
    }

    /// Parse an `acct:` resource string
    ///
    /// # Errors
    ///
    /// - [`WebFingerError::NotAnAccount`] when `input` lacks the `acct:` prefix
    ///   (the partial identifier is zero-valued)
    /// - [`WebFingerError::NoDomain`] when there is no `@` (the partial
    ///   identifier keeps the name)
    ///
    /// # Example
    ///
    /// ```rust
    /// use webfinger_service::account::AccountIdentifier;
    ///
    /// let acct = AccountIdentifier::parse("acct:alice@example.com/profile").unwrap();
    /// assert_eq!(acct.name, "alice");
    /// assert_eq!(acct.hostname, "example.com");
    /// ```
    pub fn parse(input: &str) -> Result<Self, ParseFailure> {
        let Some(rest) = input.strip_prefix(ACCT_PREFIX) else {
            return Err(ParseFailure {
                error: WebFingerError::NotAnAccount,
                partial: Self::default(),
            });
        };

        let Some((name, authority)) = rest.split_once('@') else {
            return Err(ParseFailure {
                error: WebFingerError::NoDomain,
                partial: Self::new(rest, ""),
            });
        };

        // Only the authority is kept; a path or query after it is dropped.
        let hostname = authority.split('/').next().unwrap_or_default();
        Ok(Self::new(name, hostname))
    }
}

impl FromStr for AccountIdentifier {
    type Err = ParseFailure;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AccountIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ACCT_PREFIX}{}@{}", self.name, self.hostname)
    }
}
