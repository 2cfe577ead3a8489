//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Remote command errors ─────────────────────────────────────────────────────

/// A remote command exited non-zero, or replied with output that could not be
/// used where a structured reply was required.
#[derive(Debug, Error)]
#[error("remote command `{command}` failed: {reason}")]
pub struct RemoteCommandError {
    /// The full command line as sent to the remote shell.
    pub command: String,
    /// Exit code reported by the transport, `None` when killed by a signal
    /// or when the command succeeded but its output was unusable.
    pub exit_status: Option<i32>,
    /// Human-readable cause (exit status, stderr excerpt, parse failure).
    pub reason: String,
}

impl RemoteCommandError {
    /// Build the error for a command that exited unsuccessfully.
    #[must_use]
    pub fn exited(command: &str, exit_status: Option<i32>, stderr: &str) -> Self {
        let status = exit_status.map_or_else(
            || "terminated by a signal".to_string(),
            |code| format!("exit status {code}"),
        );
        let stderr = stderr.trim();
        let reason = if stderr.is_empty() {
            status
        } else {
            format!("{status}: {stderr}")
        };
        Self {
            command: command.to_string(),
            exit_status,
            reason,
        }
    }

    /// Build the error for a command whose reply could not be interpreted.
    #[must_use]
    pub fn unusable_reply(command: &str, reason: impl Into<String>) -> Self {
        Self {
            command: command.to_string(),
            exit_status: Some(0),
            reason: reason.into(),
        }
    }
}

// ── Application errors ────────────────────────────────────────────────────────

/// Errors related to the application registry.
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Unknown application '{name}'. Available applications: {available}")]
    Unknown { name: String, available: String },
}

// ── Execution context errors ──────────────────────────────────────────────────

/// Errors raised while reading the layered execution context.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("Configuration key '{0}' is not set. Add it to the `env` section of the deployer file.")]
    UnboundKey(String),

    #[error("Malformed template {template:?}: unbalanced '{{' or '}}'")]
    MalformedTemplate { template: String },

    #[error("Template for '{key}' refers back to itself")]
    RecursiveTemplate { key: String },
}

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors related to deployer file validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Deployer '{0}' registers no applications")]
    NoApplications(String),

    #[error("Deployer name must not be empty")]
    EmptyDeployerName,

    #[error("Application #{0} has an empty name")]
    EmptyApplicationName(usize),

    #[error("Application '{app}': file '{path}' has invalid mode '{mode}' (expected octal, e.g. 755)")]
    InvalidFileMode {
        app: String,
        path: String,
        mode: String,
    },
}
