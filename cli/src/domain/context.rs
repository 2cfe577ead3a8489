//! Layered execution context: the key/value configuration visible to the
//! coordinator and to lifecycle handlers at a given point of a deployment.
//!
//! Pure data structure: no I/O, no async.
//!
//! The context is a stack of overlays. Lookups resolve innermost-first.
//! Overlays are pushed with [`ExecutionContext::push`], which returns a guard
//! that restores the stack to its previous depth when dropped, so a scope can
//! never leak past its exit, whether it returns normally, propagates an error
//! with `?`, or unwinds.
//!
//! String values are templates: `{key}` placeholders are interpolated against
//! the stack *at read time*, never when the overlay is pushed. `{{` and `}}`
//! produce literal braces.

use std::collections::BTreeMap;
use std::ops::{Deref, DerefMut};
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::domain::error::ContextError;

/// One layer of key/value bindings.
pub type Overlay = BTreeMap<String, Value>;

/// Keys written by the coordinator while it drives a deployment.
pub mod keys {
    /// Name of the application being deployed.
    pub const APP_NAME: &str = "deployer_app_name";
    /// Identifier of the instance currently being created, promoted or retired.
    pub const INSTANCE: &str = "sarge_instance";
    /// Remote directory of the current instance.
    pub const INSTANCE_DIR: &str = "instance_dir";
    /// Root directory managed by the instance manager on the remote host.
    pub const SARGE_HOME: &str = "sarge_home";
    /// Extra settings merged into the `new` payload.
    pub const INSTANCE_CONFIG: &str = "sarge_instance_config";
    /// Remote connection target.
    pub const HOST: &str = "host_string";
    /// Optional limit, in seconds, on each captured remote command.
    pub const REMOTE_TIMEOUT: &str = "remote_timeout";
}

/// Nested templates deeper than this are treated as a reference cycle.
const MAX_TEMPLATE_DEPTH: usize = 16;

#[allow(clippy::expect_used)] // pattern is a compile-time constant
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{|\}\}|\{([A-Za-z_][A-Za-z0-9_]*)\}|[{}]").expect("valid placeholder pattern")
});

/// Build an [`Overlay`] from key/value pairs.
pub fn overlay<I, K, V>(pairs: I) -> Overlay
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Ordered stack of overlays. Index 0 is the outermost (base) layer.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    layers: Vec<Overlay>,
}

impl ExecutionContext {
    /// An empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A context with a single base layer.
    #[must_use]
    pub fn with_base(base: Overlay) -> Self {
        Self { layers: vec![base] }
    }

    /// Number of overlays currently on the stack.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Push `overlay` and return a guard that pops it (and anything pushed
    /// above it) when dropped.
    pub fn push(&mut self, overlay: Overlay) -> OverlayGuard<'_> {
        let restore_to = self.layers.len();
        self.layers.push(overlay);
        OverlayGuard {
            ctx: self,
            restore_to,
        }
    }

    /// Push `overlay` for the lifetime of the context. Used for layers that
    /// frame a whole command, such as operator overrides.
    pub fn stack(&mut self, overlay: Overlay) {
        self.layers.push(overlay);
    }

    /// Run `body` with `overlay` pushed; the overlay is popped on every exit
    /// path of `body`.
    pub fn with_overlay<T>(&mut self, overlay: Overlay, body: impl FnOnce(&mut Self) -> T) -> T {
        let mut guard = self.push(overlay);
        body(&mut guard)
    }

    /// Raw value bound to `key`, innermost overlay first.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.layers.iter().rev().find_map(|layer| layer.get(key))
    }

    /// Whether `key` is bound in any overlay.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Raw value bound to `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ContextError::UnboundKey`] if no overlay binds `key`.
    pub fn resolve(&self, key: &str) -> Result<&Value, ContextError> {
        self.get(key)
            .ok_or_else(|| ContextError::UnboundKey(key.to_string()))
    }

    /// Value bound to `key` as text, with template placeholders interpolated
    /// against the current stack.
    ///
    /// # Errors
    ///
    /// Returns an error if `key` (or any key it refers to) is unbound, if a
    /// template is malformed, or if templates refer to each other in a cycle.
    pub fn string(&self, key: &str) -> Result<String, ContextError> {
        self.interpolate_key(key, &mut Vec::new())
    }

    /// Interpolate an ad-hoc template against the current stack.
    ///
    /// # Errors
    ///
    /// Same as [`ExecutionContext::string`].
    pub fn render(&self, template: &str) -> Result<String, ContextError> {
        self.render_at(template, &mut Vec::new())
    }

    /// Deep copy of `value` with every string leaf rendered as a template.
    ///
    /// # Errors
    ///
    /// Same as [`ExecutionContext::string`].
    pub fn render_value(&self, value: &Value) -> Result<Value, ContextError> {
        Ok(match value {
            Value::String(s) => Value::String(self.render(s)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .map(|v| self.render_value(v))
                    .collect::<Result<_, ContextError>>()?,
            ),
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| Ok((k.clone(), self.render_value(v)?)))
                    .collect::<Result<_, ContextError>>()?,
            ),
            other => other.clone(),
        })
    }

    fn interpolate_key(&self, key: &str, chain: &mut Vec<String>) -> Result<String, ContextError> {
        if chain.len() >= MAX_TEMPLATE_DEPTH || chain.iter().any(|k| k == key) {
            return Err(ContextError::RecursiveTemplate {
                key: key.to_string(),
            });
        }
        match self.resolve(key)? {
            Value::String(template) => {
                chain.push(key.to_string());
                let rendered = self.render_at(template, chain);
                chain.pop();
                rendered
            }
            other => Ok(other.to_string()),
        }
    }

    fn render_at(&self, template: &str, chain: &mut Vec<String>) -> Result<String, ContextError> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(template) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&template[last..whole.start()]);
            match (whole.as_str(), caps.get(1)) {
                ("{{", _) => out.push('{'),
                ("}}", _) => out.push('}'),
                (_, Some(key)) => out.push_str(&self.interpolate_key(key.as_str(), chain)?),
                (_, None) => {
                    return Err(ContextError::MalformedTemplate {
                        template: template.to_string(),
                    });
                }
            }
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Ok(out)
    }
}

/// Scope guard returned by [`ExecutionContext::push`].
///
/// Dereferences to the context so nested scopes can push further overlays.
pub struct OverlayGuard<'a> {
    ctx: &'a mut ExecutionContext,
    restore_to: usize,
}

impl Deref for OverlayGuard<'_> {
    type Target = ExecutionContext;

    fn deref(&self) -> &ExecutionContext {
        self.ctx
    }
}

impl DerefMut for OverlayGuard<'_> {
    fn deref_mut(&mut self) -> &mut ExecutionContext {
        self.ctx
    }
}

impl Drop for OverlayGuard<'_> {
    fn drop(&mut self) {
        self.ctx.layers.truncate(self.restore_to);
    }
}
