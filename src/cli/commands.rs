use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use crate::config::ServerConfig;
use crate::dispatcher::{HandlerRequest, HandlerResponse, WEBFINGER_PATH};
use crate::resolver::StaticDirectory;
use crate::server::{HttpServer, ServerHandle, WebFingerService};

/// Host used for offline lookups
pub const LOOKUP_HOST: &str = "localhost";

/// Command-line interface for the WebFinger server
#[derive(Parser, Debug)]
#[command(name = "webfinger-server", version)]
#[command(about = "RFC 7033 WebFinger server", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve WebFinger over HTTP until SIGTERM or SIGINT
    Serve {
        /// Path to the YAML configuration file
        #[arg(short, long, env = "WEBFINGER_CONFIG")]
        config: PathBuf,

        /// Override the configured listen address
        #[arg(long)]
        listen: Option<String>,
    },
    /// Run one query through the dispatcher and print the response
    Lookup {
        /// Path to the YAML configuration file
        #[arg(short, long, env = "WEBFINGER_CONFIG")]
        config: PathBuf,

        /// Value of the `resource` parameter (e.g. acct:alice@example.com)
        #[arg(short, long)]
        resource: String,

        /// Relation types to keep (repeatable)
        #[arg(long = "rel")]
        rels: Vec<String>,

        /// Send the query as plain HTTP instead of TLS
        #[arg(long, default_value_t = false)]
        plain_http: bool,
    },
    /// Validate the configuration and print a summary
    Check {
        /// Path to the YAML configuration file
        #[arg(short, long, env = "WEBFINGER_CONFIG")]
        config: PathBuf,
    },
}

/// Parse the process arguments and run the command, writing to stdout
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the server
/// fails to start.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    run(cli, &mut io::stdout().lock())
}

/// Run a parsed command, writing any report to `out`
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded, the output cannot
/// be written, or the server fails to start.
pub fn run(cli: Cli, out: &mut dyn Write) -> Result<()> {
    match cli.command {
        Commands::Serve { config, listen } => serve(&config, listen),
        Commands::Lookup {
            config,
            resource,
            rels,
            plain_http,
        } => {
            let config = ServerConfig::load(&config)?;
            let res = lookup(&config, &resource, &rels, !plain_http)?;
            write_response(out, &res)?;
            Ok(())
        }
        Commands::Check { config } => check(&config, out),
    }
}

fn serve(path: &Path, listen: Option<String>) -> Result<()> {
    let mut config = ServerConfig::load(path)?;
    if let Some(listen) = listen {
        config.listen = listen;
        config.validate()?;
    }
    let service = config.build_service()?;
    let handle = start(&config, Arc::new(service))?;
    handle
        .wait_ready()
        .with_context(|| format!("server on {} did not become ready", handle.addr()))?;

    wait_for_shutdown(handle)
}

/// Start the HTTP binding for `service` on `config.listen`
///
/// # Errors
///
/// Returns an error if the address cannot be bound.
pub fn start(config: &ServerConfig, service: Arc<crate::Service>) -> Result<ServerHandle> {
    let wf = WebFingerService::new(service).trust_forwarded_proto(config.trust_forwarded_proto);
    HttpServer(wf)
        .start(config.listen.as_str())
        .with_context(|| format!("failed to bind {}", config.listen))
}

#[cfg(unix)]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    use signal_hook::consts::signal::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGTERM, SIGINT]).context("failed to install signal handlers")?;
    if let Some(signal) = signals.forever().next() {
        info!(signal, "Shutdown signal received");
    }
    handle.stop();
    Ok(())
}

#[cfg(not(unix))]
fn wait_for_shutdown(handle: ServerHandle) -> Result<()> {
    handle
        .join()
        .map_err(|e| anyhow::anyhow!("server stopped abnormally: {e:?}"))
}

/// Dispatch a single WebFinger query offline
///
/// # Errors
///
/// Returns an error if the configured directory is invalid.
pub fn lookup(
    config: &ServerConfig,
    resource: &str,
    rels: &[String],
    tls: bool,
) -> Result<HandlerResponse> {
    let service = config.build_service()?;
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("resource", resource);
    for rel in rels {
        query.append_pair("rel", rel);
    }
    let target = format!("{WEBFINGER_PATH}?{}", query.finish());
    let req = HandlerRequest::get(&target)
        .with_header("host", LOOKUP_HOST)
        .with_tls(tls);
    Ok(service.serve(req))
}

fn write_response(out: &mut dyn Write, res: &HandlerResponse) -> io::Result<()> {
    let reason = http::StatusCode::from_u16(res.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("");
    writeln!(out, "{} {}", res.status, reason)?;
    for (name, value) in &res.headers {
        writeln!(out, "{name}: {value}")?;
    }
    writeln!(out)?;
    out.write_all(&res.body)?;
    Ok(())
}

fn check(path: &Path, out: &mut dyn Write) -> Result<()> {
    let config = ServerConfig::load(path)?;
    let directory = StaticDirectory::from_config(&config.directory)?;
    config.build_service()?;

    writeln!(out, "configuration OK: {}", path.display())?;
    writeln!(out, "  listen:                {}", config.listen)?;
    writeln!(out, "  require_tls:           {}", config.require_tls)?;
    writeln!(out, "  trust_forwarded_proto: {}", config.trust_forwarded_proto)?;
    writeln!(out, "  cors:                  {}", if config.cors.enabled { "enabled" } else { "disabled" })?;
    let hosts = if config.directory.hosts.is_empty() {
        "any".to_string()
    } else {
        config.directory.hosts.join(", ")
    };
    writeln!(out, "  hosts:                 {hosts}")?;
    writeln!(out, "  accounts:              {}", directory.len())?;
    writeln!(
        out,
        "  unknown users:         {}",
        if directory.masks_unknown_users() { "dummy resource" } else { "not found" }
    )?;
    Ok(())
}
