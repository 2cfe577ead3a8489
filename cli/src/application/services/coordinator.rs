//! Lifecycle coordinator: creates, installs, starts, promotes and retires
//! instances, firing lifecycle signals at each transition.
//!
//! Imports only from `crate::domain` and `crate::application`.
//!
//! Per instance:
//!
//! ```text
//! absent → creating → installing → started → (awaiting confirmation) → promoted
//!                                                                          │
//!                                         absent ← destroyed ← retiring ◄──┘
//! ```
//!
//! Simple mode retires every existing instance before creating the new one
//! and promotes without asking. Rolling mode keeps the old instances serving,
//! asks the operator before promoting, and only then retires the others.
//!
//! Failures abort the sequence as they are. A half-created instance is left
//! in place for the operator to inspect.

use anyhow::Result;

use crate::application::instance_manager::{InstanceManager, instance_dir};
use crate::application::ports::{Confirm, ProgressReporter, RemoteShell};
use crate::application::signals::{LifecycleEvent, SignalBus};
use crate::domain::context::{ExecutionContext, Overlay, keys, overlay};
use crate::domain::registry::AppOptions;

/// How a deployment replaces the running instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployMode {
    /// Destroy everything first, then create and promote unconditionally.
    Simple,
    /// Create alongside the old instances and promote on confirmation.
    Rolling,
}

impl DeployMode {
    #[must_use]
    pub fn for_options(options: &AppOptions) -> Self {
        if options.rolling_update {
            DeployMode::Rolling
        } else {
            DeployMode::Simple
        }
    }
}

/// Terminal state of a deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployOutcome {
    /// The new instance is live; `retired` lists the instances destroyed.
    Promoted { instance: String, retired: Vec<String> },
    /// The operator declined promotion and had the new instance destroyed.
    Discarded { instance: String },
    /// The operator declined both promotion and destruction: old and new
    /// instances keep running until someone cleans up by hand.
    LeftRunning { instance: String },
}

/// External collaborators used during a deployment.
#[derive(Clone, Copy)]
pub struct Session<'a> {
    pub remote: &'a dyn RemoteShell,
    pub prompt: &'a dyn Confirm,
    pub reporter: &'a dyn ProgressReporter,
}

/// Drives one deployment to completion.
pub struct Coordinator<'a> {
    signals: &'a SignalBus,
    session: Session<'a>,
    instances: InstanceManager<'a>,
}

impl<'a> Coordinator<'a> {
    #[must_use]
    pub fn new(signals: &'a SignalBus, session: Session<'a>) -> Self {
        Self {
            signals,
            session,
            instances: InstanceManager::new(session.remote),
        }
    }

    /// Deploy `app` in `mode`, with `deployer_app_name` bound for the whole run.
    ///
    /// # Errors
    ///
    /// Returns the first remote-command, context, prompt or handler error.
    pub async fn deploy(
        &self,
        ctx: &mut ExecutionContext,
        app: &str,
        mode: DeployMode,
    ) -> Result<DeployOutcome> {
        tracing::info!(app, ?mode, "deploying");
        let mut scoped = ctx.push(overlay([(keys::APP_NAME, app)]));
        match mode {
            DeployMode::Simple => self.simple_deploy(&mut scoped, app).await,
            DeployMode::Rolling => self.rolling_deploy(&mut scoped, app).await,
        }
    }

    async fn simple_deploy(&self, ctx: &mut ExecutionContext, app: &str) -> Result<DeployOutcome> {
        let retired = self.retire_instances(ctx, app, None).await?;

        let id = self.create(ctx, app).await?;
        let bindings = instance_bindings(ctx, &id)?;
        let scoped = ctx.push(bindings);
        self.install_and_start(&scoped, app, &id).await?;
        self.fire(LifecycleEvent::Promote, &scoped, app).await?;

        tracing::info!(app, instance = %id, "promoted");
        self.session.reporter.success(&format!("{app}: {id} is live"));
        Ok(DeployOutcome::Promoted {
            instance: id,
            retired,
        })
    }

    async fn rolling_deploy(&self, ctx: &mut ExecutionContext, app: &str) -> Result<DeployOutcome> {
        let id = self.create(ctx, app).await?;
        let bindings = instance_bindings(ctx, &id)?;
        let mut scoped = ctx.push(bindings);
        self.install_and_start(&scoped, app, &id).await?;

        let prompt = self.session.prompt;
        if prompt.confirm(&format!("Deployed {id} - make it live?"), true)? {
            self.fire(LifecycleEvent::Promote, &scoped, app).await?;
            tracing::info!(app, instance = %id, "promoted");
            self.session.reporter.success(&format!("{app}: {id} is live"));
            let retired = self
                .retire_instances(&mut scoped, app, Some(id.as_str()))
                .await?;
            return Ok(DeployOutcome::Promoted {
                instance: id,
                retired,
            });
        }

        if prompt.confirm(&format!("Destroy instance {id}?"), true)? {
            self.retire(&mut scoped, app, &id).await?;
            return Ok(DeployOutcome::Discarded { instance: id });
        }

        tracing::warn!(app, instance = %id, "left running next to the previous instances");
        self.session.reporter.warn(&format!(
            "{app}: {id} left running next to the previous instances; clean up by hand"
        ));
        Ok(DeployOutcome::LeftRunning { instance: id })
    }

    /// Retire every instance of `app` except `keep`. Returns the retired ids.
    ///
    /// # Errors
    ///
    /// Returns the first listing, handler or destroy error; instances after
    /// the failing one are left alone.
    pub async fn retire_instances(
        &self,
        ctx: &mut ExecutionContext,
        app: &str,
        keep: Option<&str>,
    ) -> Result<Vec<String>> {
        let mut retired = Vec::new();
        for instance in self.instances.list(ctx, app).await? {
            if keep == Some(instance.id.as_str()) {
                continue;
            }
            self.retire(ctx, app, &instance.id).await?;
            retired.push(instance.id);
        }
        Ok(retired)
    }

    /// Fire `will_stop` with the instance bound, then destroy it.
    async fn retire(&self, ctx: &mut ExecutionContext, app: &str, id: &str) -> Result<()> {
        let bindings = instance_bindings(ctx, id)?;
        let scoped = ctx.push(bindings);
        self.session.reporter.step(&format!("{app}: retiring {id}..."));
        self.fire(LifecycleEvent::WillStop, &scoped, app).await?;
        self.instances.destroy(&scoped, id).await?;
        tracing::info!(app, instance = %id, "destroyed");
        self.session.reporter.success(&format!("{app}: {id} destroyed"));
        Ok(())
    }

    async fn create(&self, ctx: &ExecutionContext, app: &str) -> Result<String> {
        self.session
            .reporter
            .step(&format!("{app}: creating instance..."));
        let config = InstanceManager::instance_config(ctx, app)?;
        let id = self.instances.create(ctx, &config).await?;
        tracing::info!(app, instance = %id, "created");
        Ok(id)
    }

    async fn install_and_start(&self, ctx: &ExecutionContext, app: &str, id: &str) -> Result<()> {
        self.session
            .reporter
            .step(&format!("{app}: installing {id}..."));
        self.fire(LifecycleEvent::Install, ctx, app).await?;
        self.instances.start(ctx, id).await?;
        tracing::info!(app, instance = %id, "started");
        self.fire(LifecycleEvent::HasStarted, ctx, app).await?;
        self.session
            .reporter
            .success(&format!("{app}: {id} started"));
        Ok(())
    }

    async fn fire(&self, event: LifecycleEvent, ctx: &ExecutionContext, app: &str) -> Result<()> {
        let fired = self
            .signals
            .fire(event, app, ctx, self.session.remote)
            .await?;
        tracing::debug!(app, %event, handlers = fired, "signal sent");
        Ok(())
    }
}

/// `sarge_instance` and `instance_dir` for instance `id`.
fn instance_bindings(ctx: &ExecutionContext, id: &str) -> Result<Overlay> {
    Ok(overlay([
        (keys::INSTANCE, id.to_string()),
        (keys::INSTANCE_DIR, instance_dir(ctx, id)?),
    ]))
}
