//! Infrastructure implementation of the `CommandRunner` port.
//!
//! `TokioCommandRunner` executes local programs (`ssh`, `git`). Captured runs
//! wait for the program to finish unless the runner carries a timeout; a
//! child that outlives an explicit timeout is killed, never left orphaned.

use std::process::{ExitStatus, Output, Stdio};
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

use crate::application::ports::CommandRunner;

/// Production `CommandRunner` backed by `tokio::process`.
pub struct TokioCommandRunner {
    timeout: Option<Duration>,
}

impl TokioCommandRunner {
    /// Runner whose `run`/`run_with_stdin` wait as long as the program runs.
    #[must_use]
    pub fn new() -> Self {
        Self { timeout: None }
    }

    /// Runner that kills `run`/`run_with_stdin` children after `timeout`.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
        }
    }

    fn spawn(program: &str, args: &[&str], stdin: Stdio) -> Result<Child> {
        tracing::debug!(program, ?args, "spawning");
        Command::new(program)
            .args(args)
            .stdin(stdin)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))
    }

    /// Wait for `child` and drain its pipes, killing it after `timeout` if one
    /// is given.
    ///
    /// `tokio::time::timeout` alone would only drop the future; the explicit
    /// `kill` in the `select!` arm terminates the process on every platform.
    async fn collect(
        mut child: Child,
        program: &str,
        timeout: Option<Duration>,
    ) -> Result<Output> {
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();

        let finished = async {
            let (status, stdout, stderr) =
                tokio::join!(child.wait(), drain(&mut stdout), drain(&mut stderr));
            Ok::<Output, anyhow::Error>(Output {
                status: status.with_context(|| format!("waiting for {program}"))?,
                stdout,
                stderr,
            })
        };

        let Some(timeout) = timeout else {
            return finished.await;
        };
        tokio::select! {
            result = finished => result,
            () = tokio::time::sleep(timeout) => {
                let _ = child.kill().await;
                anyhow::bail!("{program} timed out after {}s", timeout.as_secs())
            }
        }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new()
    }
}

async fn drain<R: AsyncRead + Unpin>(pipe: &mut Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(pipe) = pipe {
        let _ = pipe.read_to_end(&mut buf).await;
    }
    buf
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output> {
        let child = Self::spawn(program, args, Stdio::null())?;
        Self::collect(child, program, self.timeout).await
    }

    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output> {
        let child = Self::spawn(program, args, Stdio::null())?;
        Self::collect(child, program, Some(timeout)).await
    }

    async fn run_with_stdin(&self, program: &str, args: &[&str], input: &[u8]) -> Result<Output> {
        let mut child = Self::spawn(program, args, Stdio::piped())?;

        // Feed stdin concurrently so a child that fills its stdout pipe
        // before reading all input cannot deadlock us.
        let stdin = child.stdin.take();
        let input = input.to_vec();
        let feeder = tokio::spawn(async move {
            if let Some(mut stdin) = stdin {
                let _ = stdin.write_all(&input).await;
            }
        });

        let output = Self::collect(child, program, self.timeout).await;
        let _ = feeder.await;
        output
    }

    async fn run_status(&self, program: &str, args: &[&str]) -> Result<ExitStatus> {
        tracing::debug!(program, ?args, "starting interactive session");
        let mut child = Command::new(program)
            .args(args)
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn {program}"))?;

        child
            .wait()
            .await
            .with_context(|| format!("waiting for {program}"))
    }
}
