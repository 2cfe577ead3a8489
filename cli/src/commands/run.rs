//! `sarge-deploy run <instance> <command>...` - one-off command inside an instance.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;

/// Arguments for the run command.
#[derive(Args)]
pub struct RunArgs {
    /// Instance id or application name
    pub instance: String,

    /// Command to run, passed to the instance's shell
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub command: Vec<String>,
}

/// Run the run command. Prints the command's output, even when quiet.
///
/// # Errors
///
/// Returns an error if the deployer file is invalid or the command fails.
pub async fn run(app: &AppContext, args: RunArgs) -> Result<ExitCode> {
    let deployer = app.load_deployer()?;
    let ctx = app.context(&deployer);
    let remote = app.remote(&ctx)?;
    let output = deployer
        .run(&ctx, &remote, &args.instance, &args.command.join(" "))
        .await?;
    if !output.is_empty() {
        println!("{output}");
    }
    Ok(ExitCode::SUCCESS)
}
