//! Ships the local git checkout into a fresh instance.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::application::ports::CommandRunner;
use crate::application::signals::{Hook, LifecycleHandler};
use crate::domain::context::keys;
use crate::domain::instance::shell_quote;

/// Tarball name inside the instance directory while it is being unpacked.
const ARCHIVE_NAME: &str = "_src.tar";

/// Generous bound for `git archive` on a large repository.
const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(120);

/// `install` handler: uploads `git archive HEAD` and unpacks it in
/// `instance_dir`. The tarball is removed even when unpacking fails.
pub struct SourceArchive<R: CommandRunner> {
    runner: R,
}

impl<R: CommandRunner> SourceArchive<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    async fn archive(&self) -> Result<Vec<u8>> {
        let output = self
            .runner
            .run_with_timeout("git", &["archive", "HEAD"], ARCHIVE_TIMEOUT)
            .await
            .context("failed to run git archive")?;
        anyhow::ensure!(
            output.status.success(),
            "git archive HEAD failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(output.stdout)
    }
}

#[async_trait(?Send)]
impl<R: CommandRunner> LifecycleHandler for SourceArchive<R> {
    fn name(&self) -> &str {
        "source-archive"
    }

    async fn handle(&self, hook: &Hook<'_>) -> Result<()> {
        let dir = hook.ctx.string(keys::INSTANCE_DIR)?;
        let tarball = self.archive().await?;
        tracing::debug!(bytes = tarball.len(), %dir, "uploading source archive");

        let remote_tar = format!("{dir}/{ARCHIVE_NAME}");
        hook.remote.put(&tarball, &remote_tar, None).await?;

        let quoted_dir = shell_quote(&dir);
        let unpacked = hook
            .remote
            .check(&format!("cd {quoted_dir} && tar xf {ARCHIVE_NAME}"))
            .await;
        let cleaned = hook
            .remote
            .check(&format!("cd {quoted_dir} && rm -f {ARCHIVE_NAME}"))
            .await;
        unpacked?;
        cleaned?;
        Ok(())
    }
}
