//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` - never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::process::{ExitStatus, Output};

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::config::DeployerConfig;
use crate::domain::error::RemoteCommandError;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts local process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
    /// Run a program with stdin piped from `stdin`.
    async fn run_with_stdin(&self, program: &str, args: &[&str], stdin: &[u8]) -> Result<Output>;
    /// Run a program with inherited stdio and return only its exit status.
    /// No timeout - interactive sessions end when the user ends them.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus>;
}

// ── Remote Shell Port ─────────────────────────────────────────────────────────

/// Synchronous request/response channel to the deployment host.
///
/// Object-safe so lifecycle handlers can receive it as `&dyn RemoteShell`.
#[async_trait(?Send)]
pub trait RemoteShell {
    /// Run `command` through the remote shell and capture its output.
    async fn run(&self, command: &str) -> Result<Output>;

    /// Write `contents` to `remote_path`, then apply `mode` when given.
    async fn put(&self, contents: &[u8], remote_path: &str, mode: Option<u32>) -> Result<()>;

    /// Open an interactive session running `command`, with inherited stdio.
    async fn open_shell(&self, command: &str) -> Result<ExitStatus>;

    /// Run `command` and return its trimmed stdout.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCommandError`] if the command exits non-zero, or the
    /// transport error if it could not be issued at all.
    async fn check(&self, command: &str) -> Result<String> {
        let output = self.run(command).await?;
        if !output.status.success() {
            return Err(RemoteCommandError::exited(
                command,
                output.status.code(),
                &String::from_utf8_lossy(&output.stderr),
            )
            .into());
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

// ── Operator Prompt Port ──────────────────────────────────────────────────────

/// Blocking yes/no question to the operator.
pub trait Confirm {
    /// Ask `prompt`; `default` is the answer when the operator just hits enter.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal prompt fails (e.g. no TTY available).
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait - no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Config Port ───────────────────────────────────────────────────────────────

/// Abstracts loading of the deployer file.
pub trait ConfigStore {
    /// Load and validate the deployer file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or invalid.
    fn load(&self) -> Result<DeployerConfig>;
    /// Location the file is read from.
    fn path(&self) -> &std::path::Path;
}
