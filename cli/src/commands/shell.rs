//! `sarge-deploy shell [instance]` - interactive session inside an instance.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::commands::exit_code;

/// Arguments for the shell command.
#[derive(Args)]
pub struct ShellArgs {
    /// Instance id or application name (default: the first application)
    pub instance: Option<String>,
}

/// Run the shell command. Exits with the remote session's exit code.
///
/// # Errors
///
/// Returns an error if the deployer file is invalid or ssh cannot be started.
pub async fn run(app: &AppContext, args: ShellArgs) -> Result<ExitCode> {
    let deployer = app.load_deployer()?;
    let ctx = app.context(&deployer);
    let remote = app.remote(&ctx)?;
    let status = deployer
        .shell(&ctx, &remote, args.instance.as_deref())
        .await?;
    Ok(exit_code(status))
}
