//! Signal bus: named lifecycle events with per-application receivers.
//!
//! Handlers are registered during setup and fired by the coordinator. Firing
//! is synchronous with respect to the deployment: each handler runs to
//! completion, in registration order, before the next one starts. A failing
//! handler aborts the remaining handlers and the deployment.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::application::ports::RemoteShell;
use crate::domain::context::ExecutionContext;

/// The lifecycle points every deployer defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// A new instance exists and must be populated.
    Install,
    /// The new instance has been started.
    HasStarted,
    /// The new instance becomes the live one.
    Promote,
    /// An instance is about to be destroyed; it is still reachable.
    WillStop,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 4] = [
        LifecycleEvent::Install,
        LifecycleEvent::HasStarted,
        LifecycleEvent::Promote,
        LifecycleEvent::WillStop,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleEvent::Install => "install",
            LifecycleEvent::HasStarted => "has_started",
            LifecycleEvent::Promote => "promote",
            LifecycleEvent::WillStop => "will_stop",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which applications a receiver is interested in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppFilter {
    /// Every application.
    Any,
    /// A single application, by name.
    App(String),
}

impl AppFilter {
    #[must_use]
    pub fn app(name: &str) -> Self {
        AppFilter::App(name.to_string())
    }

    #[must_use]
    pub fn matches(&self, app: &str) -> bool {
        match self {
            AppFilter::Any => true,
            AppFilter::App(name) => name == app,
        }
    }
}

/// Everything a handler can see while it runs.
pub struct Hook<'a> {
    /// Name of the signal being fired.
    pub event: &'a str,
    /// Application the signal was fired for.
    pub app: &'a str,
    /// Execution context as of the firing point.
    pub ctx: &'a ExecutionContext,
    /// Channel to the deployment host.
    pub remote: &'a dyn RemoteShell,
}

/// A callback connected to one or more signals.
#[async_trait(?Send)]
pub trait LifecycleHandler {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// React to a fired signal.
    async fn handle(&self, hook: &Hook<'_>) -> Result<()>;
}

/// A named event and its ordered receivers.
pub struct Signal {
    name: String,
    receivers: Vec<(Rc<dyn LifecycleHandler>, AppFilter)>,
}

impl Signal {
    fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            receivers: Vec::new(),
        }
    }

    /// Connect `handler` for applications matching `filter`.
    ///
    /// Connecting the same handler (by identity) with an equal filter again is
    /// a no-op; returns `false` in that case.
    pub fn connect(&mut self, handler: Rc<dyn LifecycleHandler>, filter: AppFilter) -> bool {
        let duplicate = self
            .receivers
            .iter()
            .any(|(h, f)| Rc::ptr_eq(h, &handler) && *f == filter);
        if duplicate {
            return false;
        }
        self.receivers.push((handler, filter));
        true
    }

    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.receivers.len()
    }

    /// Invoke every receiver matching `app`, in registration order.
    /// Returns how many receivers ran.
    ///
    /// # Errors
    ///
    /// Returns the first handler error; later receivers are not invoked.
    pub async fn send(
        &self,
        app: &str,
        ctx: &ExecutionContext,
        remote: &dyn RemoteShell,
    ) -> Result<usize> {
        let hook = Hook {
            event: &self.name,
            app,
            ctx,
            remote,
        };
        let mut fired = 0;
        for (handler, filter) in &self.receivers {
            if !filter.matches(app) {
                continue;
            }
            tracing::debug!(signal = %self.name, app, handler = handler.name(), "firing handler");
            handler.handle(&hook).await.with_context(|| {
                format!("{} handler '{}' failed for {app}", self.name, handler.name())
            })?;
            fired += 1;
        }
        Ok(fired)
    }
}

/// Per-deployer namespace of signals.
pub struct SignalBus {
    signals: BTreeMap<String, Signal>,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus {
    /// A bus with the four lifecycle signals predefined.
    #[must_use]
    pub fn new() -> Self {
        let signals = LifecycleEvent::ALL
            .iter()
            .map(|event| (event.as_str().to_string(), Signal::named(event.as_str())))
            .collect();
        Self { signals }
    }

    /// Get or create the signal called `name`.
    pub fn signal(&mut self, name: &str) -> &mut Signal {
        self.signals
            .entry(name.to_string())
            .or_insert_with(|| Signal::named(name))
    }

    /// Look up an existing signal.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }

    /// Connect `handler` to `event` for applications matching `filter`.
    pub fn on(
        &mut self,
        event: LifecycleEvent,
        filter: AppFilter,
        handler: Rc<dyn LifecycleHandler>,
    ) -> bool {
        self.signal(event.as_str()).connect(handler, filter)
    }

    /// Fire `name` for `app`. Firing a signal nobody defined is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first handler error.
    pub async fn send(
        &self,
        name: &str,
        app: &str,
        ctx: &ExecutionContext,
        remote: &dyn RemoteShell,
    ) -> Result<usize> {
        match self.signals.get(name) {
            Some(signal) => signal.send(app, ctx, remote).await,
            None => Ok(0),
        }
    }

    /// Fire a lifecycle event for `app`.
    ///
    /// # Errors
    ///
    /// Returns the first handler error.
    pub async fn fire(
        &self,
        event: LifecycleEvent,
        app: &str,
        ctx: &ExecutionContext,
        remote: &dyn RemoteShell,
    ) -> Result<usize> {
        self.send(event.as_str(), app, ctx, remote).await
    }
}
