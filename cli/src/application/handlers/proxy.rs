//! Publishes instances behind the reverse proxy on the deployment host.
//!
//! | event         | action                                   |
//! |---------------|------------------------------------------|
//! | `has_started` | publish the per-instance host            |
//! | `promote`     | publish the live host                    |
//! | `will_stop`   | remove the per-instance host             |

use anyhow::Result;
use async_trait::async_trait;

use crate::application::signals::{Hook, LifecycleEvent, LifecycleHandler};
use crate::domain::config::ProxyConfig;
use crate::domain::context::ExecutionContext;
use crate::domain::instance::quote_json;

/// Routes an application's instances through the proxy tool.
pub struct ProxyRouter {
    config: ProxyConfig,
}

impl ProxyRouter {
    #[must_use]
    pub fn new(config: ProxyConfig) -> Self {
        Self { config }
    }

    /// Events this handler must be connected to.
    pub const EVENTS: [LifecycleEvent; 3] = [
        LifecycleEvent::HasStarted,
        LifecycleEvent::Promote,
        LifecycleEvent::WillStop,
    ];

    fn address(&self, ctx: &ExecutionContext, host_template: &str) -> Result<String> {
        Ok(format!("{}:{}", ctx.render(host_template)?, self.config.port))
    }

    /// `<command> configure <host>:<port> <site>` with the site rendered
    /// against `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host template or the site fail to render.
    pub fn publish_command(&self, ctx: &ExecutionContext, host_template: &str) -> Result<String> {
        let site = ctx.render_value(&self.config.site)?;
        Ok(format!(
            "{} configure {} {}",
            self.config.command,
            self.address(ctx, host_template)?,
            quote_json(&site)
        ))
    }

    /// `<command> delete -f <host>:<port>`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host template fails to render.
    pub fn remove_command(&self, ctx: &ExecutionContext, host_template: &str) -> Result<String> {
        Ok(format!(
            "{} delete -f {}",
            self.config.command,
            self.address(ctx, host_template)?
        ))
    }
}

#[async_trait(?Send)]
impl LifecycleHandler for ProxyRouter {
    fn name(&self) -> &str {
        "proxy"
    }

    async fn handle(&self, hook: &Hook<'_>) -> Result<()> {
        let (command, host) = if hook.event == LifecycleEvent::HasStarted.as_str() {
            let host = &self.config.instance_host;
            (self.publish_command(hook.ctx, host)?, host)
        } else if hook.event == LifecycleEvent::Promote.as_str() {
            let host = &self.config.live_host;
            (self.publish_command(hook.ctx, host)?, host)
        } else if hook.event == LifecycleEvent::WillStop.as_str() {
            let host = &self.config.instance_host;
            (self.remove_command(hook.ctx, host)?, host)
        } else {
            tracing::debug!(event = hook.event, "proxy ignores event");
            return Ok(());
        };

        hook.remote.check(&command).await?;
        tracing::info!(
            app = hook.app,
            event = hook.event,
            host = %hook.ctx.render(host)?,
            "proxy updated"
        );
        Ok(())
    }
}
