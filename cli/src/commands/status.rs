//! Status command implementation.
//!
//! Lists the live instances of one application, or of every registered one.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;

/// Arguments for the status command.
#[derive(Args)]
pub struct StatusArgs {
    /// Only show instances of this application
    pub app: Option<String>,
}

/// Format the summary line above the instance list.
#[must_use]
pub fn format_summary(deployer: &str, count: usize, app: Option<&str>) -> String {
    let noun = if count == 1 { "instance" } else { "instances" };
    match app {
        Some(app) => format!("{deployer}: {count} {app} {noun}"),
        None => format!("{deployer}: {count} {noun}"),
    }
}

/// Run the status command.
///
/// # Errors
///
/// Returns an error if the application is unknown or the listing fails.
pub async fn run(app: &AppContext, args: StatusArgs) -> Result<ExitCode> {
    let deployer = app.load_deployer()?;
    if let Some(name) = &args.app {
        deployer.registry().resolve(name)?;
    }
    let ctx = app.context(&deployer);
    let remote = app.remote(&ctx)?;
    let instances = deployer
        .instances(&ctx, &remote, args.app.as_deref())
        .await?;

    app.output.header(&format_summary(
        deployer.name(),
        instances.len(),
        args.app.as_deref(),
    ));
    app.output.instances(&instances);
    Ok(ExitCode::SUCCESS)
}
