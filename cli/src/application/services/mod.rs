//! Application services: use-case orchestration.
//!
//! Each service module implements a single use-case by composing domain logic
//! with port trait calls. Services import only from `crate::domain` and
//! `crate::application` - never from `crate::infra`, `crate::commands`,
//! or `crate::output`.

pub mod coordinator;
pub mod deployer;
pub mod setup;

pub use coordinator::{Coordinator, DeployMode, DeployOutcome, Session};
pub use deployer::Deployer;
pub use setup::build_deployer;
