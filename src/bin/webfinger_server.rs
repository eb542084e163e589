use webfinger_service::cli::run_cli;
use webfinger_service::logging::{init_logging_with_config, LogConfig};
use webfinger_service::runtime_config::RuntimeConfig;

fn main() {
    if let Err(err) = init_logging_with_config(&LogConfig::from_env()) {
        eprintln!("error: {err:#}");
        std::process::exit(2);
    }
    let runtime = RuntimeConfig::from_env();
    runtime.apply();
    tracing::debug!(stack_size = runtime.stack_size, "Coroutine runtime configured");

    if let Err(err) = run_cli() {
        tracing::error!(error = %format!("{err:#}"), "Command failed");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
