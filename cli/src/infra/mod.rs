//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: local process execution,
//! the ssh transport to the deployment host, and deployer-file loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod command_runner;
pub mod config;
pub mod ssh;

pub use command_runner::TokioCommandRunner;
pub use config::YamlConfigStore;
pub use ssh::SshRemote;
