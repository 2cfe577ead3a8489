//! Application layer: port trait definitions and use-case orchestration.
//!
//! This module depends only on `crate::domain` - never on `crate::infra`,
//! `crate::commands`, or `crate::output`.

pub mod handlers;
pub mod instance_manager;
pub mod ports;
pub mod services;
pub mod signals;

#[cfg(test)]
pub(crate) mod test_support;

pub use instance_manager::{AppInstances, InstanceManager, instance_dir};
pub use ports::{CommandRunner, ConfigStore, Confirm, ProgressReporter, RemoteShell};
pub use signals::{AppFilter, Hook, LifecycleEvent, LifecycleHandler, Signal, SignalBus};
