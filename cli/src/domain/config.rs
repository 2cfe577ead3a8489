//! Deployer file schema and validation.
//!
//! Pure functions only: no I/O, no async, no filesystem access.

use anyhow::Result;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::context::Overlay;
use crate::domain::error::ConfigError;
use crate::domain::registry::AppOptions;

// ── Constants ────────────────────────────────────────────────────────────────

/// Default deployer file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "deploy.yaml";

/// Reverse-proxy tool invoked by the proxy handler unless overridden.
pub const DEFAULT_PROXY_COMMAND: &str = "sudo tek-nginx";

// ── Config schema ────────────────────────────────────────────────────────────

/// Top-level deployer file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployerConfig {
    /// Product name, used in log fields and messages.
    pub name: String,

    /// Execution context template shared by every command.
    #[serde(default)]
    pub env: Overlay,

    /// Applications, in registration order. The first is the default.
    #[serde(default)]
    pub applications: Vec<ApplicationConfig>,

    /// Document uploaded by `configure` as the applications' `config.json`.
    #[serde(default)]
    pub app_config: Option<Value>,
}

/// One application and the built-in handlers it opts into.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApplicationConfig {
    pub name: String,

    /// Keep the old instance serving until the new one is confirmed live.
    #[serde(default)]
    pub rolling_update: bool,

    /// Upload `git archive HEAD` into the instance directory on install.
    #[serde(default)]
    pub source_archive: bool,

    /// Activation script template written to `.runrc`.
    #[serde(default)]
    pub runrc: Option<String>,

    /// Body of the `server` launcher template (after the shebang).
    #[serde(default)]
    pub launcher: Option<String>,

    /// Directories created with `mkdir -p` on install, before `files`.
    /// Relative paths are under the instance directory.
    #[serde(default)]
    pub dirs: Vec<String>,

    /// Extra files written on install.
    #[serde(default)]
    pub files: Vec<FileConfig>,

    /// Reverse-proxy registration for this application.
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
}

impl ApplicationConfig {
    /// Registry options for this application.
    #[must_use]
    pub fn options(&self) -> AppOptions {
        AppOptions {
            rolling_update: self.rolling_update,
        }
    }
}

/// A file uploaded by the install handler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Destination template. Relative paths are under the instance directory.
    pub path: String,

    pub content: String,

    /// Octal permission bits, e.g. `755` or `"0755"`.
    #[serde(default, deserialize_with = "mode_digits")]
    pub mode: Option<String>,

    /// Render `content` against the context. Off for files carrying literal
    /// braces, such as `${VAR}` references for the application itself.
    #[serde(default = "default_true")]
    pub template: bool,
}

impl FileConfig {
    /// Parsed permission bits.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidFileMode`] unless `mode` is octal digits.
    pub fn permissions(&self, app: &str) -> Result<Option<u32>, ConfigError> {
        self.mode
            .as_deref()
            .map(|mode| {
                let digits = mode.trim().trim_start_matches("0o");
                u32::from_str_radix(digits, 8)
                    .ok()
                    .filter(|bits| *bits <= 0o7777)
                    .ok_or_else(|| ConfigError::InvalidFileMode {
                        app: app.to_string(),
                        path: self.path.clone(),
                        mode: mode.to_string(),
                    })
            })
            .transpose()
    }
}

fn default_true() -> bool {
    true
}

/// Accept a mode written as a YAML string or as a bare number of octal digits.
fn mode_digits<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Digits {
        Text(String),
        Number(u64),
    }

    Ok(Option::<Digits>::deserialize(deserializer)?.map(|digits| match digits {
        Digits::Text(text) => text,
        Digits::Number(number) => number.to_string(),
    }))
}

/// Reverse-proxy site published for an application's instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy configuration tool on the remote host.
    #[serde(default = "default_proxy_command")]
    pub command: String,

    /// Host name template for a single instance, e.g. `app-{sarge_instance}.example.org`.
    pub instance_host: String,

    /// Host name template for the live site.
    pub live_host: String,

    #[serde(default = "default_proxy_port")]
    pub port: u16,

    /// Site definition passed to the tool. String leaves are templates.
    #[serde(default)]
    pub site: Value,
}

fn default_proxy_command() -> String {
    DEFAULT_PROXY_COMMAND.to_string()
}

fn default_proxy_port() -> u16 {
    80
}

// ── Validators ───────────────────────────────────────────────────────────────

/// Validates a parsed deployer file.
///
/// # Errors
///
/// Returns an error if the deployer has no name, no applications, an
/// application without a name, or a file with an unparsable mode.
pub fn validate_config(config: &DeployerConfig) -> Result<()> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::EmptyDeployerName.into());
    }
    if config.applications.is_empty() {
        return Err(ConfigError::NoApplications(config.name.clone()).into());
    }
    if let Some(index) = config
        .applications
        .iter()
        .position(|app| app.name.trim().is_empty())
    {
        return Err(ConfigError::EmptyApplicationName(index + 1).into());
    }
    for app in &config.applications {
        for file in &app.files {
            file.permissions(&app.name)?;
        }
    }
    Ok(())
}

// ── Unit tests ───────────────────────────────────────────────────────────────
