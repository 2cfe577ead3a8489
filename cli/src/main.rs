//! sarge-deploy - rolling deployments onto a sarge-managed host

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sarge_deploy::cli::Cli;

/// Environment variable holding the log filter, e.g. `sarge_deploy=debug`.
const LOG_ENV: &str = "SARGE_DEPLOY_LOG";

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
