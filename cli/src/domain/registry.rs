//! Application registry: which applications a deployer knows about.
//!
//! Pure functions only: no I/O, no async.

use serde::{Deserialize, Serialize};

use crate::domain::error::ApplicationError;

/// Per-application deployment options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppOptions {
    /// Keep the old instance serving until the new one is confirmed live.
    #[serde(default)]
    pub rolling_update: bool,
}

/// A registered application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationEntry {
    pub name: String,
    pub options: AppOptions,
}

/// Registered applications in first-registration order.
///
/// Re-registering a name replaces its options in place. The first name ever
/// registered is the default application and never changes afterwards.
#[derive(Debug, Clone, Default)]
pub struct ApplicationRegistry {
    entries: Vec<ApplicationEntry>,
    default_app: Option<String>,
}

impl ApplicationRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the options for `name`.
    pub fn register(&mut self, name: &str, options: AppOptions) {
        if self.default_app.is_none() {
            self.default_app = Some(name.to_string());
        }
        match self.entries.iter_mut().find(|e| e.name == name) {
            Some(entry) => entry.options = options,
            None => self.entries.push(ApplicationEntry {
                name: name.to_string(),
                options,
            }),
        }
    }

    /// Options registered for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Unknown`] if `name` was never registered.
    pub fn resolve(&self, name: &str) -> Result<&AppOptions, ApplicationError> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.options)
            .ok_or_else(|| ApplicationError::Unknown {
                name: name.to_string(),
                available: self.names().join(", "),
            })
    }

    /// Registered names, in first-registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// The first application ever registered.
    #[must_use]
    pub fn default_app(&self) -> Option<&str> {
        self.default_app.as_deref()
    }
}
