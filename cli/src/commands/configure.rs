//! `sarge-deploy configure`: upload the shared application configuration.

use std::process::ExitCode;

use anyhow::{Context, Result};

use crate::app::AppContext;
use crate::application::ports::ConfigStore;

/// Run the configure command.
///
/// # Errors
///
/// Returns an error if the deployer file has no `app_config` or the upload fails.
pub async fn run(app: &AppContext) -> Result<ExitCode> {
    let config = app.config.load()?;
    let document = config.app_config.as_ref().with_context(|| {
        format!(
            "{} has no `app_config` section to upload",
            app.config.path().display()
        )
    })?;

    let deployer = app.load_deployer()?;
    let ctx = app.context(&deployer);
    let remote = app.remote(&ctx)?;
    let path = deployer.configure(&ctx, &remote, document).await?;
    app.output.success(&format!("configuration uploaded to {path}"));
    Ok(ExitCode::SUCCESS)
}
