//! Infrastructure implementation of the `RemoteShell` port over `ssh`.
//!
//! Relies on the operator's own ssh client configuration (keys, agent,
//! `~/.ssh/config` aliases) for authentication and host key checking.

use std::process::{ExitStatus, Output};

use anyhow::Result;
use async_trait::async_trait;

use crate::application::ports::{CommandRunner, RemoteShell};
use crate::domain::error::RemoteCommandError;
use crate::domain::instance::shell_quote;

const SSH: &str = "ssh";

/// Remote shell on `host`, driven through the local `ssh` binary.
pub struct SshRemote<R: CommandRunner> {
    runner: R,
    host: String,
}

impl<R: CommandRunner> SshRemote<R> {
    pub fn new(runner: R, host: impl Into<String>) -> Self {
        Self {
            runner,
            host: host.into(),
        }
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }
}

#[async_trait(?Send)]
impl<R: CommandRunner> RemoteShell for SshRemote<R> {
    async fn run(&self, command: &str) -> Result<Output> {
        tracing::debug!(host = %self.host, %command, "remote command");
        self.runner
            .run(SSH, &[self.host.as_str(), "--", command])
            .await
    }

    async fn put(&self, contents: &[u8], remote_path: &str, mode: Option<u32>) -> Result<()> {
        let quoted = shell_quote(remote_path);
        let command = format!("cat > {quoted}");
        tracing::debug!(host = %self.host, path = remote_path, bytes = contents.len(), "upload");
        let output = self
            .runner
            .run_with_stdin(SSH, &[self.host.as_str(), "--", command.as_str()], contents)
            .await?;
        if !output.status.success() {
            return Err(RemoteCommandError::exited(
                &command,
                output.status.code(),
                &String::from_utf8_lossy(&output.stderr),
            )
            .into());
        }
        if let Some(mode) = mode {
            self.check(&format!("chmod {mode:o} {quoted}")).await?;
        }
        Ok(())
    }

    async fn open_shell(&self, command: &str) -> Result<ExitStatus> {
        tracing::debug!(host = %self.host, %command, "interactive session");
        self.runner
            .run_status(SSH, &["-t", self.host.as_str(), "--", command])
            .await
    }
}
