//! Application context: unified state passed to every command handler.
//!
//! `AppContext` carries the cross-cutting flags (output, prompts, deployer
//! file, context overrides) so command signatures stay `(&AppContext, args)`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::application::ports::{ConfigStore, Confirm};
use crate::application::services::{Deployer, build_deployer};
use crate::domain::context::{ExecutionContext, Overlay, keys};
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::ssh::SshRemote;
use crate::output::OutputContext;

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Behaviour flags.
pub struct BehaviourFlags {
    /// Skip interactive prompts (also set by `CI` / `SARGE_DEPLOY_YES` env vars).
    pub yes: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Behaviour options.
    pub behaviour: BehaviourFlags,
    /// Deployer file, when not `./deploy.yaml`.
    pub config: Option<PathBuf>,
    /// `KEY=VALUE` bindings layered over the deployer's `env`.
    pub overrides: Vec<(String, String)>,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Where the deployer file is read from.
    pub config: YamlConfigStore,
    /// Operator bindings stacked over the deployer's `env`.
    pub overrides: Overlay,
    /// When `true`, skip interactive prompts and use defaults.
    ///
    /// Set when `--yes` / `-y` is passed, or when the `CI` or
    /// `SARGE_DEPLOY_YES` environment variables are present.
    pub non_interactive: bool,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    #[must_use]
    pub fn new(flags: AppFlags) -> Self {
        let ci_env = std::env::var("CI").is_ok() || std::env::var("SARGE_DEPLOY_YES").is_ok();
        let non_interactive = flags.behaviour.yes || ci_env;

        Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            config: YamlConfigStore::new(flags.config),
            overrides: flags
                .overrides
                .into_iter()
                .map(|(key, value)| (key, value.into()))
                .collect(),
            non_interactive,
        }
    }

    /// Load the deployer file and wire its applications and handlers.
    ///
    /// # Errors
    ///
    /// Returns an error if the deployer file is missing or invalid.
    pub fn load_deployer(&self) -> Result<Deployer> {
        let config = self.config.load()?;
        Ok(build_deployer(&config, TokioCommandRunner::new()))
    }

    /// Fresh execution context for `deployer`, with the operator overrides applied.
    #[must_use]
    pub fn context(&self, deployer: &Deployer) -> ExecutionContext {
        deployer.context(self.overrides.clone())
    }

    /// Remote shell on the host named by `host_string`.
    ///
    /// Remote commands run to completion unless `remote_timeout` is bound.
    ///
    /// # Errors
    ///
    /// Returns an error if `host_string` is not bound or `remote_timeout` is
    /// not a positive number of seconds.
    pub fn remote(&self, ctx: &ExecutionContext) -> Result<SshRemote<TokioCommandRunner>> {
        let host = ctx
            .string(keys::HOST)
            .context("no deployment host configured")?;
        let runner = match remote_timeout(ctx)? {
            Some(timeout) => TokioCommandRunner::with_timeout(timeout),
            None => TokioCommandRunner::new(),
        };
        Ok(SshRemote::new(runner, host))
    }
}

/// The `remote_timeout` binding, if any. `--set` passes it as a string.
fn remote_timeout(ctx: &ExecutionContext) -> Result<Option<Duration>> {
    let Some(value) = ctx.get(keys::REMOTE_TIMEOUT) else {
        return Ok(None);
    };
    let secs = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
    .filter(|secs| *secs > 0)
    .with_context(|| {
        format!(
            "{}: expected a positive number of seconds, got {value}",
            keys::REMOTE_TIMEOUT
        )
    })?;
    Ok(Some(Duration::from_secs(secs)))
}

impl Confirm for AppContext {
    /// When `non_interactive` is `true` (CI, `--yes` flag, or
    /// `SARGE_DEPLOY_YES` env), returns `default` immediately without prompting.
    fn confirm(&self, prompt: &str, default: bool) -> Result<bool> {
        if self.non_interactive {
            tracing::debug!(prompt, default, "non-interactive, using default answer");
            return Ok(default);
        }
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()?;
        Ok(confirmed)
    }
}
