//! Writes the files the instance manager needs to run an application.

use anyhow::Result;
use async_trait::async_trait;

use crate::application::signals::{Hook, LifecycleHandler};
use crate::domain::context::keys;
use crate::domain::instance::shell_quote;

/// Launcher scripts must be executable by the instance manager.
const LAUNCHER_MODE: u32 = 0o755;

/// `install` handler: creates `instance_dir/instance`, writes `.runrc` when
/// configured, and writes the `server` launcher.
///
/// Both templates are rendered against the context at install time, so they
/// can refer to `{instance_dir}`, `{sarge_instance}` and any deployer key.
pub struct LauncherInstaller {
    runrc: Option<String>,
    launcher: Option<String>,
}

impl LauncherInstaller {
    #[must_use]
    pub fn new(runrc: Option<String>, launcher: Option<String>) -> Self {
        Self { runrc, launcher }
    }
}

#[async_trait(?Send)]
impl LifecycleHandler for LauncherInstaller {
    fn name(&self) -> &str {
        "launcher"
    }

    async fn handle(&self, hook: &Hook<'_>) -> Result<()> {
        let dir = hook.ctx.string(keys::INSTANCE_DIR)?;
        hook.remote
            .check(&format!("mkdir -p {}", shell_quote(&format!("{dir}/instance"))))
            .await?;

        if let Some(runrc) = &self.runrc {
            let body = with_newline(hook.ctx.render(runrc)?);
            hook.remote
                .put(body.as_bytes(), &format!("{dir}/.runrc"), None)
                .await?;
        }

        if let Some(launcher) = &self.launcher {
            let body = format!("#!/bin/bash\n{}", with_newline(hook.ctx.render(launcher)?));
            hook.remote
                .put(body.as_bytes(), &format!("{dir}/server"), Some(LAUNCHER_MODE))
                .await?;
            tracing::debug!(app = hook.app, %dir, "launcher installed");
        }
        Ok(())
    }
}

fn with_newline(mut text: String) -> String {
    if !text.ends_with('\n') {
        text.push('\n');
    }
    text
}
