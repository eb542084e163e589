//! # Server Configuration
//!
//! The `webfinger-server` binary reads a single YAML file. Every section is
//! optional; missing keys take the defaults shown below.
//!
//! ```yaml
//! listen: "0.0.0.0:8080"
//! require_tls: true            # redirect plain HTTP to https (303)
//! trust_forwarded_proto: false # treat `X-Forwarded-Proto: https` as TLS
//!
//! cors:
//!   enabled: true
//!   allowed_origins: ["*"]
//!   allowed_origin_patterns: []
//!   allow_credentials: false
//!   expose_headers: []
//!   max_age: ~
//!
//! directory:
//!   hosts: [example.com]
//!   accounts:
//!     - name: alice
//!       host: example.com
//!       aliases: ["https://example.com/@alice"]
//!       links:
//!         - rel: http://webfinger.net/rel/profile-page
//!           type: text/html
//!           href: https://example.com/@alice
//!   dummy_links:
//!     - rel: http://webfinger.net/rel/profile-page
//!       href: "https://{host}/@{name}"
//! ```
//!
//! Since the binding speaks plain HTTP, `require_tls: true` only makes sense
//! together with `trust_forwarded_proto: true` behind a TLS-terminating proxy.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use serde::Deserialize;
use tracing::info;

use crate::middleware::{CorsConfigError, CorsMiddleware, CorsMiddlewareBuilder, CORS_MIDDLEWARE};
use crate::resolver::StaticDirectory;
use crate::resource::{Link, Properties};
use crate::service::Service;

/// Default listen address
pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

/// Top-level server configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Address the HTTP binding listens on
    pub listen: String,
    /// Redirect requests without TLS to their `https` URL
    pub require_tls: bool,
    /// Treat `X-Forwarded-Proto: https` as a TLS request
    pub trust_forwarded_proto: bool,
    pub cors: CorsConfig,
    pub directory: DirectoryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
            require_tls: true,
            trust_forwarded_proto: false,
            cors: CorsConfig::default(),
            directory: DirectoryConfig::default(),
        }
    }
}

/// CORS settings, mapped onto [`CorsMiddlewareBuilder`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    pub enabled: bool,
    pub allowed_origins: Vec<String>,
    pub allowed_origin_patterns: Vec<String>,
    pub allow_credentials: bool,
    pub expose_headers: Vec<String>,
    pub max_age: Option<u32>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_origin_patterns: Vec::new(),
            allow_credentials: false,
            expose_headers: Vec::new(),
            max_age: None,
        }
    }
}

impl CorsConfig {
    /// Build the middleware described by this section
    pub fn build(&self) -> Result<CorsMiddleware, CorsConfigError> {
        let origins: Vec<&str> = self.allowed_origins.iter().map(String::as_str).collect();
        let patterns: Vec<&str> = self
            .allowed_origin_patterns
            .iter()
            .map(String::as_str)
            .collect();
        let expose: Vec<&str> = self.expose_headers.iter().map(String::as_str).collect();

        let mut builder = CorsMiddlewareBuilder::new()
            .allowed_origins(&origins)
            .allowed_origin_patterns(&patterns)
            .allow_credentials(self.allow_credentials)
            .expose_headers(&expose);
        if let Some(age) = self.max_age {
            builder = builder.max_age(age);
        }
        builder.build()
    }
}

/// Accounts served by [`StaticDirectory`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirectoryConfig {
    /// Hostnames this server answers for; empty means any host
    pub hosts: Vec<String>,
    pub accounts: Vec<AccountEntry>,
    /// Link templates for unknown users (`{name}`, `{host}` are substituted)
    pub dummy_links: Vec<Link>,
}

/// A single directory account
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountEntry {
    pub name: String,
    pub host: String,
    /// Defaults to `acct:{name}@{host}`
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl ServerConfig {
    /// Read and validate a YAML config file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = Self::from_yaml_str(&raw)
            .with_context(|| format!("invalid config {}", path.display()))?;
        info!(path = %path.display(), accounts = config.directory.accounts.len(), "Loaded configuration");
        Ok(config)
    }

    /// Parse and validate YAML text
    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        // An empty document is a valid, all-default config
        let config: Self = if raw.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(raw)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values serde cannot: the listen address and the CORS section
    pub fn validate(&self) -> anyhow::Result<()> {
        match self.listen.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
            _ => bail!("`listen` must be host:port, got {:?}", self.listen),
        }
        if self.cors.enabled {
            self.cors.build().context("invalid `cors` section")?;
        }
        Ok(())
    }

    /// Build a [`Service`] wired to the static directory and these settings
    pub fn build_service(&self) -> anyhow::Result<Service> {
        let directory = StaticDirectory::from_config(&self.directory)?;
        let mut service = Service::new(Arc::new(directory));

        if self.cors.enabled {
            service
                .pre_handlers
                .register(CORS_MIDDLEWARE, Arc::new(self.cors.build()?));
        } else {
            service.pre_handlers.disable(CORS_MIDDLEWARE);
        }
        if !self.require_tls {
            service.no_tls_handler = None;
        }
        Ok(service)
    }
}
