//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod context;
pub mod error;
pub mod instance;
pub mod registry;

pub use config::{ApplicationConfig, DeployerConfig, ProxyConfig, validate_config};
pub use context::{ExecutionContext, Overlay, OverlayGuard, overlay};
pub use error::{ApplicationError, ConfigError, ContextError, RemoteCommandError};
pub use instance::{Instance, InstanceListing, quote_json, shell_quote};
pub use registry::{AppOptions, ApplicationRegistry};
