//! Instance manager wire types and argument quoting.
//!
//! Pure functions only: no I/O, no async.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One running deployment unit, as reported by `sarge list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Opaque identifier assigned by the instance manager.
    pub id: String,
    #[serde(default)]
    pub meta: InstanceMeta,
}

/// Metadata the instance manager keeps for an instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMeta {
    /// Application this instance belongs to.
    #[serde(rename = "APPLICATION_NAME", default)]
    pub application_name: Option<String>,
    /// Any other metadata, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Instance {
    /// Whether this instance belongs to `app`.
    #[must_use]
    pub fn belongs_to(&self, app: &str) -> bool {
        self.meta.application_name.as_deref() == Some(app)
    }
}

/// Reply of `sarge list`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstanceListing {
    #[serde(default)]
    pub instances: Vec<Instance>,
}

/// Parse the JSON reply of `sarge list`.
///
/// # Errors
///
/// Returns an error if `text` is not a JSON listing.
pub fn parse_listing(text: &str) -> Result<InstanceListing, serde_json::Error> {
    serde_json::from_str(text)
}

/// Quote a JSON value as a single shell argument for the instance manager.
///
/// The value is serialized compactly, every `'` is replaced by the JSON
/// escape `\u0027`, and the result is wrapped in single quotes. The quoted
/// text therefore never contains a bare apostrophe, and a consumer that strips
/// the outer quotes gets valid JSON equal to the input.
#[must_use]
pub fn quote_json(value: &Value) -> String {
    format!("'{}'", value.to_string().replace('\'', "\\u0027"))
}

/// Quote arbitrary text as one POSIX shell word.
#[must_use]
pub fn shell_quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', r"'\''"))
}
