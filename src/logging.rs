//! Structured logging setup for the `webfinger-server` binary.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the embedding application. The binary calls
//! [`init_logging_with_config`] with [`LogConfig::from_env`]:
//!
//! | Variable                        | Values                        | Default |
//! |---------------------------------|-------------------------------|---------|
//! | `WEBFINGER_LOG_LEVEL`           | trace/debug/info/warn/error   | `info`  |
//! | `WEBFINGER_LOG_FORMAT`          | json/pretty                   | `json`  |
//! | `WEBFINGER_LOG_TARGET_FILTER`   | comma-separated directives    | none    |
//! | `WEBFINGER_LOG_INCLUDE_LOCATION`| true/false                    | `false` |
//!
//! `RUST_LOG`, when set, takes precedence over `WEBFINGER_LOG_LEVEL`.
//! Output goes to stderr so `lookup` can print the response on stdout.

use std::env;
use std::io;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json, // Default to JSON
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Log level: trace/debug/info/warn/error
    pub log_level: String,
    /// Log format: json/pretty
    pub format: LogFormat,
    /// Extra filter directives (comma-separated)
    pub target_filter: Option<String>,
    /// Include file:line location (dev only)
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            target_filter: None,
            include_location: false,
        }
    }
}

impl LogConfig {
    /// Parse configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            log_level: var("WEBFINGER_LOG_LEVEL").unwrap_or(defaults.log_level),
            format: var("WEBFINGER_LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or(defaults.format),
            target_filter: var("WEBFINGER_LOG_TARGET_FILTER"),
            include_location: var("WEBFINGER_LOG_INCLUDE_LOCATION")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.include_location),
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// The filter `init_logging_with_config` installs
    pub fn env_filter(&self) -> Result<EnvFilter> {
        let mut env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));

        // Connection-level noise (client disconnects) stays at warn+
        env_filter = env_filter.add_directive(
            "may_minihttp=warn"
                .parse()
                .context("invalid may_minihttp directive")?,
        );

        if let Some(target_filter) = &self.target_filter {
            for filter in target_filter.split(',').map(str::trim).filter(|f| !f.is_empty()) {
                let directive = filter
                    .parse()
                    .with_context(|| format!("invalid log filter directive: {filter}"))?;
                env_filter = env_filter.add_directive(directive);
            }
        }
        Ok(env_filter)
    }
}

/// Install the global `tracing` subscriber
///
/// # Errors
///
/// Fails on an invalid filter directive or when a global subscriber is
/// already installed.
///
/// # Example
///
/// ```no_run
/// use webfinger_service::logging::{init_logging_with_config, LogConfig};
///
/// init_logging_with_config(&LogConfig::from_env()).expect("logging");
/// ```
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let env_filter = config.env_filter()?;

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;
    Ok(())
}
