//! Property-based tests for registry defaults, overlay scoping and JSON quoting.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use proptest::prelude::*;
use serde_json::Value;

use sarge_deploy::domain::context::{ExecutionContext, Overlay, overlay};
use sarge_deploy::domain::instance::quote_json;
use sarge_deploy::domain::registry::{AppOptions, ApplicationRegistry};

// ============================================================================
// ApplicationRegistry
// ============================================================================

proptest! {
    /// The default application is the first name ever registered, whatever
    /// is registered (or re-registered) afterwards.
    #[test]
    fn prop_default_is_first_registration(
        calls in prop::collection::vec(("[a-e]{1,3}", any::<bool>()), 1..20),
    ) {
        let mut registry = ApplicationRegistry::new();
        for (name, rolling_update) in &calls {
            registry.register(name, AppOptions { rolling_update: *rolling_update });
        }
        prop_assert_eq!(registry.default_app(), Some(calls[0].0.as_str()));
    }

    /// Re-registering overwrites options; names stay unique and ordered by
    /// first registration.
    #[test]
    fn prop_last_registration_wins(
        calls in prop::collection::vec(("[a-c]", any::<bool>()), 1..20),
    ) {
        let mut registry = ApplicationRegistry::new();
        for (name, rolling_update) in &calls {
            registry.register(name, AppOptions { rolling_update: *rolling_update });
        }
        let mut expected_order: Vec<&str> = Vec::new();
        for (name, _) in &calls {
            if !expected_order.contains(&name.as_str()) {
                expected_order.push(name);
            }
        }
        prop_assert_eq!(registry.names(), expected_order.clone());
        for name in expected_order {
            let last = calls.iter().rev().find(|(n, _)| n == name).map(|(_, r)| *r);
            prop_assert_eq!(Some(registry.resolve(name).unwrap().rolling_update), last);
        }
    }
}

// ============================================================================
// ExecutionContext overlay scoping
// ============================================================================

fn snapshot(ctx: &ExecutionContext, keys: &[String]) -> Vec<Option<Value>> {
    keys.iter().map(|k| ctx.get(k).cloned()).collect()
}

proptest! {
    /// After any nesting of scoped overlays, every key resolves exactly as it
    /// did before the first overlay was pushed, including when the innermost
    /// scope fails.
    #[test]
    fn prop_nested_overlays_restore_context(
        base in prop::collection::btree_map("[a-d]", "[a-z]{0,4}", 0..4),
        layers in prop::collection::vec(
            prop::collection::btree_map("[a-d]", "[a-z]{0,4}", 0..4),
            1..6,
        ),
        fail in any::<bool>(),
    ) {
        let keys: Vec<String> = ["a", "b", "c", "d"].iter().map(ToString::to_string).collect();
        let mut ctx = ExecutionContext::with_base(overlay(base));
        let before = snapshot(&ctx, &keys);

        fn nest(ctx: &mut ExecutionContext, layers: &[Overlay], fail: bool) -> Result<(), String> {
            match layers.split_first() {
                None if fail => Err("boom".to_string()),
                None => Ok(()),
                Some((layer, rest)) => ctx.with_overlay(layer.clone(), |scoped| nest(scoped, rest, fail)),
            }
        }

        let layers: Vec<Overlay> = layers.into_iter().map(overlay).collect();
        let result = nest(&mut ctx, &layers, fail);

        prop_assert_eq!(result.is_err(), fail);
        prop_assert_eq!(ctx.depth(), 1);
        prop_assert_eq!(snapshot(&ctx, &keys), before);
    }

    /// Inside nested overlays, a key resolves to its innermost binding.
    #[test]
    fn prop_innermost_binding_wins(values in prop::collection::vec("[a-z]{1,6}", 1..6)) {
        let mut ctx = ExecutionContext::new();
        for value in &values {
            ctx.stack(overlay([("key", value.as_str())]));
        }
        prop_assert_eq!(ctx.depth(), values.len());
        prop_assert_eq!(ctx.string("key").unwrap(), values.last().cloned().unwrap());
    }
}

// ============================================================================
// quote_json
// ============================================================================

/// Undo POSIX single quoting: strip the outer quotes.
fn shell_unquote(quoted: &str) -> &str {
    quoted
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .expect("single-quoted")
}

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[ -~]{0,12}".prop_map(Value::from),
        "[a-z' \"\\\\{}]{0,12}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::from),
            prop::collection::btree_map("[a-z_']{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

proptest! {
    /// The quoted form is one single-quoted shell word whose content parses
    /// back to the original value.
    #[test]
    fn prop_quote_json_round_trips(value in json_value()) {
        let quoted = quote_json(&value);
        let inner = shell_unquote(&quoted);
        prop_assert!(!inner.contains('\''), "bare apostrophe in {}", quoted);
        let parsed: Value = serde_json::from_str(inner).unwrap();
        prop_assert_eq!(parsed, value);
    }
}
