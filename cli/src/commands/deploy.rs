//! `sarge-deploy deploy [app]` - roll out a new instance of an application.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::{DeployOutcome, Session};
use crate::output::TerminalReporter;

/// Arguments for the deploy command.
#[derive(Args)]
pub struct DeployArgs {
    /// Application to deploy
    pub app: Option<String>,
}

/// Run the deploy command.
///
/// Without an application, prints the registered names and touches nothing.
/// An unknown application is rejected before any connection is made.
///
/// # Errors
///
/// Returns an error if the deployer file is invalid, the application is
/// unknown, or any step of the deployment fails.
pub async fn run(app: &AppContext, args: DeployArgs) -> Result<ExitCode> {
    let deployer = app.load_deployer()?;

    let Some(name) = args.app else {
        // Payload of the command: printed even when quiet.
        println!("Available applications:");
        for name in deployer.registry().names() {
            println!("  {name}");
        }
        return Ok(ExitCode::SUCCESS);
    };
    deployer.registry().resolve(&name)?;

    let mut ctx = app.context(&deployer);
    let remote = app.remote(&ctx)?;
    let reporter = TerminalReporter::new(&app.output);
    let session = Session {
        remote: &remote,
        prompt: app,
        reporter: &reporter,
    };

    app.output
        .header(&format!("{}: deploying {name} to {}", deployer.name(), remote.host()));
    match deployer.deploy(&mut ctx, &name, session).await? {
        DeployOutcome::Promoted { instance, retired } => {
            if !retired.is_empty() {
                app.output.kv("retired", &retired.join(", "));
            }
            app.output.success(&format!("{name} is now served by {instance}"));
        }
        DeployOutcome::Discarded { instance } => {
            app.output
                .info(&format!("{instance} discarded; previous instances still serve {name}"));
        }
        DeployOutcome::LeftRunning { instance } => {
            app.output.kv("instance", &instance);
        }
    }
    Ok(ExitCode::SUCCESS)
}
