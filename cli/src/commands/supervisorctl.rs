//! `sarge-deploy supervisorctl`: the supervisor's administrative shell.

use std::process::ExitCode;

use anyhow::Result;

use crate::app::AppContext;
use crate::commands::exit_code;

/// Run the supervisorctl command. Exits with the remote session's exit code.
///
/// # Errors
///
/// Returns an error if the deployer file is invalid or ssh cannot be started.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let deployer = app.load_deployer()?;
    let ctx = app.context(&deployer);
    let remote = app.remote(&ctx)?;
    let status = deployer.supervisorctl(&ctx, &remote).await?;
    Ok(exit_code(status))
}
