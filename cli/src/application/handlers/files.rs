//! Creates directories and writes arbitrary files for an application on install.

use anyhow::Result;
use async_trait::async_trait;

use crate::application::signals::{Hook, LifecycleHandler};
use crate::domain::config::FileConfig;
use crate::domain::context::{ExecutionContext, keys};
use crate::domain::instance::shell_quote;

/// `install` handler: `mkdir -p` every entry of `dirs`, then uploads `files`.
///
/// Paths are templates; relative ones land under `{instance_dir}`. File
/// contents are rendered too unless the entry opts out with `template: false`.
pub struct FileInstaller {
    dirs: Vec<String>,
    files: Vec<FileConfig>,
}

impl FileInstaller {
    #[must_use]
    pub fn new(dirs: Vec<String>, files: Vec<FileConfig>) -> Self {
        Self { dirs, files }
    }
}

#[async_trait(?Send)]
impl LifecycleHandler for FileInstaller {
    fn name(&self) -> &str {
        "files"
    }

    async fn handle(&self, hook: &Hook<'_>) -> Result<()> {
        for dir in &self.dirs {
            let dir = remote_path(hook.ctx, dir)?;
            hook.remote
                .check(&format!("mkdir -p {}", shell_quote(&dir)))
                .await?;
        }

        for file in &self.files {
            let path = remote_path(hook.ctx, &file.path)?;
            let mode = file.permissions(hook.app)?;
            let contents = if file.template {
                hook.ctx.render(&file.content)?
            } else {
                file.content.clone()
            };
            hook.remote.put(contents.as_bytes(), &path, mode).await?;
            tracing::debug!(app = hook.app, %path, "file installed");
        }
        Ok(())
    }
}

/// Render `template` and anchor it at the instance directory unless absolute.
fn remote_path(ctx: &ExecutionContext, template: &str) -> Result<String> {
    let path = ctx.render(template)?;
    if path.starts_with('/') {
        return Ok(path);
    }
    let dir = ctx.string(keys::INSTANCE_DIR)?;
    Ok(format!("{}/{path}", dir.trim_end_matches('/')))
}
