//! Instance manager client: textual commands to the remote `sarge` binary.
//!
//! Every call issues a fresh remote command; nothing is cached, since
//! instances can be created or destroyed outside a single deployment run.

use anyhow::Result;
use serde_json::{Map, Value};

use crate::application::ports::RemoteShell;
use crate::domain::context::{ExecutionContext, keys};
use crate::domain::error::RemoteCommandError;
use crate::domain::instance::{Instance, parse_listing, quote_json};

/// Remote path of the instance manager binary, relative to `sarge_home`.
const SARGE_BIN: &str = "bin/sarge";

/// Instances of one application, in the order the instance manager listed
/// them. Finite and single-pass; call [`InstanceManager::list`] again for a
/// fresh view.
#[derive(Debug)]
pub struct AppInstances {
    inner: std::vec::IntoIter<Instance>,
    app: String,
}

impl Iterator for AppInstances {
    type Item = Instance;

    fn next(&mut self) -> Option<Instance> {
        let app = &self.app;
        self.inner.by_ref().find(|instance| instance.belongs_to(app))
    }
}

/// Client for the instance manager running on the deployment host.
pub struct InstanceManager<'a> {
    remote: &'a dyn RemoteShell,
}

impl<'a> InstanceManager<'a> {
    #[must_use]
    pub fn new(remote: &'a dyn RemoteShell) -> Self {
        Self { remote }
    }

    /// Full command line for `sarge <args>` under the context's `sarge_home`.
    ///
    /// # Errors
    ///
    /// Returns an error if `sarge_home` is not bound in `ctx`.
    pub fn command(ctx: &ExecutionContext, args: &str) -> Result<String> {
        Ok(format!("{}/{SARGE_BIN} {args}", sarge_home(ctx)?))
    }

    /// Command line running `cmd` inside instance `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `sarge_home` is not bound in `ctx`.
    pub fn run_command(ctx: &ExecutionContext, id: &str, cmd: &str) -> Result<String> {
        let args = if cmd.is_empty() {
            format!("run {id}")
        } else {
            format!("run {id} {cmd}")
        };
        Self::command(ctx, &args)
    }

    /// Payload for `sarge new`: the application name merged with the optional
    /// `sarge_instance_config` mapping from the context.
    ///
    /// # Errors
    ///
    /// Returns an error if templates inside `sarge_instance_config` fail to render.
    pub fn instance_config(ctx: &ExecutionContext, app: &str) -> Result<Value> {
        let mut config = Map::new();
        config.insert("application_name".to_string(), Value::from(app));
        if let Some(Value::Object(extra)) = ctx.get(keys::INSTANCE_CONFIG) {
            for (key, value) in extra {
                config.insert(key.clone(), ctx.render_value(value)?);
            }
        }
        Ok(Value::Object(config))
    }

    /// `sarge new <json>` - returns the new instance id.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCommandError`] on a non-zero exit or an empty reply.
    pub async fn create(&self, ctx: &ExecutionContext, config: &Value) -> Result<String> {
        let command = Self::command(ctx, &format!("new {}", quote_json(config)))?;
        tracing::debug!(%command, "creating instance");
        let id = self.remote.check(&command).await?;
        if id.is_empty() {
            return Err(
                RemoteCommandError::unusable_reply(&command, "no instance id in reply").into(),
            );
        }
        Ok(id)
    }

    /// `sarge start <id>`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCommandError`] on a non-zero exit.
    pub async fn start(&self, ctx: &ExecutionContext, id: &str) -> Result<()> {
        let command = Self::command(ctx, &format!("start {id}"))?;
        tracing::debug!(%command, "starting instance");
        self.remote.check(&command).await?;
        Ok(())
    }

    /// `sarge destroy <id>`. Not idempotent: destroying twice is a caller error.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCommandError`] on a non-zero exit.
    pub async fn destroy(&self, ctx: &ExecutionContext, id: &str) -> Result<()> {
        let command = Self::command(ctx, &format!("destroy {id}"))?;
        tracing::debug!(%command, "destroying instance");
        self.remote.check(&command).await?;
        Ok(())
    }

    /// `sarge run <id> <cmd>`: runs a one-off command inside an instance and
    /// returns its trimmed stdout.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCommandError`] on a non-zero exit.
    pub async fn run(&self, ctx: &ExecutionContext, id: &str, cmd: &str) -> Result<String> {
        let command = Self::run_command(ctx, id, cmd)?;
        tracing::debug!(%command, "running inside instance");
        self.remote.check(&command).await
    }

    /// `sarge list`, every instance regardless of application.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCommandError`] on a non-zero exit or unparsable JSON.
    pub async fn list_all(&self, ctx: &ExecutionContext) -> Result<Vec<Instance>> {
        let command = Self::command(ctx, "list")?;
        let reply = self.remote.check(&command).await?;
        let listing = parse_listing(&reply).map_err(|e| {
            RemoteCommandError::unusable_reply(&command, format!("invalid instance listing: {e}"))
        })?;
        Ok(listing.instances)
    }

    /// `sarge list`, filtered to instances of `app`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteCommandError`] on a non-zero exit or unparsable JSON.
    pub async fn list(&self, ctx: &ExecutionContext, app: &str) -> Result<AppInstances> {
        Ok(AppInstances {
            inner: self.list_all(ctx).await?.into_iter(),
            app: app.to_string(),
        })
    }
}

/// Remote instance directory for `id`.
///
/// # Errors
///
/// Returns an error if `sarge_home` is not bound in `ctx`.
pub fn instance_dir(ctx: &ExecutionContext, id: &str) -> Result<String> {
    Ok(format!("{}/{id}", sarge_home(ctx)?))
}

fn sarge_home(ctx: &ExecutionContext) -> Result<String> {
    let home = ctx.string(keys::SARGE_HOME)?;
    Ok(home.trim_end_matches('/').to_string())
}
