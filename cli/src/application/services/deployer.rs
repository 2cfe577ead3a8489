//! Deployer: one product's registry, signal bus and context template, plus
//! the operations the CLI exposes on top of them.

use std::process::ExitStatus;
use std::rc::Rc;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::application::instance_manager::InstanceManager;
use crate::application::ports::RemoteShell;
use crate::application::services::coordinator::{Coordinator, DeployMode, DeployOutcome, Session};
use crate::application::signals::{AppFilter, LifecycleEvent, LifecycleHandler, SignalBus};
use crate::domain::context::{ExecutionContext, Overlay, keys};
use crate::domain::instance::{Instance, shell_quote};
use crate::domain::registry::{AppOptions, ApplicationRegistry};

/// Remote directory holding the shared application configuration.
const APP_CONFIG_DIR: &str = "etc/app";

/// A named orchestration context, created once per deployable product.
pub struct Deployer {
    name: String,
    env: Overlay,
    registry: ApplicationRegistry,
    signals: SignalBus,
}

impl Deployer {
    #[must_use]
    pub fn new(name: &str, env: Overlay) -> Self {
        Self {
            name: name.to_string(),
            env,
            registry: ApplicationRegistry::new(),
            signals: SignalBus::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn registry(&self) -> &ApplicationRegistry {
        &self.registry
    }

    #[must_use]
    pub fn signals(&self) -> &SignalBus {
        &self.signals
    }

    /// Register (or re-register) an application.
    pub fn add_application(&mut self, name: &str, options: AppOptions) {
        self.registry.register(name, options);
    }

    /// Connect `handler` to a lifecycle event for the applications in `filter`.
    pub fn on(
        &mut self,
        event: LifecycleEvent,
        filter: AppFilter,
        handler: Rc<dyn LifecycleHandler>,
    ) -> bool {
        self.signals.on(event, filter, handler)
    }

    /// Fresh execution context: the deployer's env template, then `overrides`.
    #[must_use]
    pub fn context(&self, overrides: Overlay) -> ExecutionContext {
        let mut ctx = ExecutionContext::with_base(self.env.clone());
        if !overrides.is_empty() {
            ctx.stack(overrides);
        }
        ctx
    }

    /// Deploy `app` in the mode its options select.
    ///
    /// # Errors
    ///
    /// Returns [`crate::domain::error::ApplicationError::Unknown`] before
    /// touching the remote host if `app` is not registered; otherwise the
    /// first error raised by the coordinator.
    pub async fn deploy(
        &self,
        ctx: &mut ExecutionContext,
        app: &str,
        session: Session<'_>,
    ) -> Result<DeployOutcome> {
        let mode = DeployMode::for_options(self.registry.resolve(app)?);
        Coordinator::new(&self.signals, session)
            .deploy(ctx, app, mode)
            .await
    }

    /// Command opening a session inside `instance` (default: the default application).
    ///
    /// # Errors
    ///
    /// Returns an error if no instance is given and no application is registered,
    /// or if `sarge_home` is unbound.
    pub fn shell_command(&self, ctx: &ExecutionContext, instance: Option<&str>) -> Result<String> {
        let target = instance
            .or(self.registry.default_app())
            .context("no instance given and no default application registered")?;
        Ok(format!("exec {}", InstanceManager::run_command(ctx, target, "")?))
    }

    /// Command opening the process supervisor's administrative shell.
    ///
    /// # Errors
    ///
    /// Returns an error if `sarge_home` is unbound.
    pub fn supervisorctl_command(&self, ctx: &ExecutionContext) -> Result<String> {
        let home = ctx.string(keys::SARGE_HOME)?;
        Ok(format!("exec {}/bin/supervisorctl", home.trim_end_matches('/')))
    }

    /// Interactive session inside an instance. Returns the remote exit status.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be opened.
    pub async fn shell(
        &self,
        ctx: &ExecutionContext,
        remote: &dyn RemoteShell,
        instance: Option<&str>,
    ) -> Result<ExitStatus> {
        let command = self.shell_command(ctx, instance)?;
        tracing::info!(%command, "opening instance shell");
        remote.open_shell(&command).await
    }

    /// Run `command` inside `instance` and return its output.
    ///
    /// # Errors
    ///
    /// Returns an error if the command exits non-zero.
    pub async fn run(
        &self,
        ctx: &ExecutionContext,
        remote: &dyn RemoteShell,
        instance: &str,
        command: &str,
    ) -> Result<String> {
        tracing::info!(instance, command, "running inside instance");
        InstanceManager::new(remote).run(ctx, instance, command).await
    }

    /// Interactive supervisor shell. Returns the remote exit status.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be opened.
    pub async fn supervisorctl(
        &self,
        ctx: &ExecutionContext,
        remote: &dyn RemoteShell,
    ) -> Result<ExitStatus> {
        let command = self.supervisorctl_command(ctx)?;
        tracing::info!(%command, "opening supervisorctl");
        remote.open_shell(&command).await
    }

    /// Live instances of `app`, or of every registered application.
    ///
    /// # Errors
    ///
    /// Returns an error if `app` is unknown or the listing fails.
    pub async fn instances(
        &self,
        ctx: &ExecutionContext,
        remote: &dyn RemoteShell,
        app: Option<&str>,
    ) -> Result<Vec<Instance>> {
        if let Some(name) = app {
            self.registry.resolve(name)?;
        }
        let names = self.registry.names();
        let all = InstanceManager::new(remote).list_all(ctx).await?;
        Ok(all
            .into_iter()
            .filter(|instance| match app {
                Some(name) => instance.belongs_to(name),
                None => names.iter().any(|name| instance.belongs_to(name)),
            })
            .collect())
    }

    /// Upload `config` as `{sarge_home}/etc/app/config.json`. Returns the path.
    ///
    /// The document is written as given; braces in it are not templates.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the upload fails.
    pub async fn configure(
        &self,
        ctx: &ExecutionContext,
        remote: &dyn RemoteShell,
        config: &Value,
    ) -> Result<String> {
        let home = ctx.string(keys::SARGE_HOME)?;
        let dir = format!("{}/{APP_CONFIG_DIR}", home.trim_end_matches('/'));
        remote
            .check(&format!("mkdir -p {}", shell_quote(&dir)))
            .await?;
        let path = format!("{dir}/config.json");
        let body = serde_json::to_string_pretty(config)
            .context("serializing application config")?;
        remote.put(body.as_bytes(), &path, None).await?;
        tracing::info!(%path, "application config uploaded");
        Ok(path)
    }
}
