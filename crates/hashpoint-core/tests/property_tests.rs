//! # Property-Based Tests
//!
//! Invariants of the hash reducer, checked with proptest.
//!
//! Resolutions are driven with `futures::executor::block_on`; the reducer
//! does not need a specific runtime.

use futures::executor::block_on;
use hashpoint_core::{
    Accumulator, Engine, Entity, EntityRegistry, HashConfig, HashReducer, HashpointError,
    KeyMapping,
};
use proptest::collection::{btree_map, vec};
use proptest::prelude::*;
use serde_json::{Map, Value, json};
use std::sync::Arc;

// =============================================================================
// HELPERS
// =============================================================================

fn run(config: HashConfig, value: Value) -> Result<Value, HashpointError> {
    let engine = Engine::new(EntityRegistry::new());
    let entity = Arc::new(Entity::new("hash:prop", config));
    block_on(HashReducer::resolve(Accumulator::new(value, entity), &engine)).map(|acc| acc.value)
}

fn object(entries: std::collections::BTreeMap<String, i64>) -> Value {
    Value::Object(entries.into_iter().map(|(k, v)| (k, json!(v))).collect::<Map<_, _>>())
}

fn key_strategy() -> impl Strategy<Value = String> {
    "[a-f]"
}

fn config_strategy() -> impl Strategy<Value = HashConfig> {
    (
        vec(key_strategy(), 0..4),
        vec(key_strategy(), 0..4),
        vec((key_strategy(), key_strategy()), 0..3),
    )
        .prop_map(|(omit, pick, renames)| HashConfig {
            omit_keys: Some(omit),
            pick_keys: Some(pick),
            map_keys: Some(KeyMapping::new(renames)),
            ..HashConfig::default()
        })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// A null value passes through whatever is configured.
    #[test]
    fn null_is_identity(config in config_strategy()) {
        prop_assert_eq!(run(config, Value::Null).expect("resolve"), Value::Null);
    }

    /// Arrays are always rejected with the serialized value and its type.
    #[test]
    fn arrays_are_rejected(items in vec(any::<i32>(), 0..8)) {
        let value = json!(items);
        let err = run(HashConfig::default(), value.clone()).expect_err("must fail");
        let message = err.to_string();

        prop_assert!(matches!(err, HashpointError::Validation(_)));
        let expected = format!("{} of type array", value);
        prop_assert!(message.contains(&expected));
        prop_assert!(message.contains("More info https://"));
    }

    /// Empty operations leave any object untouched.
    #[test]
    fn empty_operations_are_identity(entries in btree_map(key_strategy(), any::<i64>(), 0..6)) {
        let value = object(entries);
        let config = HashConfig {
            map_keys: Some(KeyMapping::default()),
            add_keys: Some(Map::new()),
            omit_keys: Some(Vec::new()),
            pick_keys: Some(Vec::new()),
            ..HashConfig::default()
        };
        prop_assert_eq!(run(config, value.clone()).expect("resolve"), value);
    }

    /// Applying pickKeys/omitKeys twice equals applying them once.
    #[test]
    fn pick_and_omit_are_idempotent(
        entries in btree_map(key_strategy(), any::<i64>(), 0..6),
        pick in vec(key_strategy(), 1..4),
        omit in vec(key_strategy(), 0..4),
    ) {
        let config = HashConfig {
            pick_keys: Some(pick),
            omit_keys: Some(omit),
            ..HashConfig::default()
        };
        let once = run(config.clone(), object(entries)).expect("once");
        let twice = run(config, once.clone()).expect("twice");
        prop_assert_eq!(once, twice);
    }

    /// After pickKeys, every remaining key was listed.
    #[test]
    fn pick_never_adds_keys(
        entries in btree_map(key_strategy(), any::<i64>(), 0..6),
        pick in vec(key_strategy(), 1..4),
    ) {
        let config = HashConfig { pick_keys: Some(pick.clone()), ..HashConfig::default() };
        let out = run(config, object(entries)).expect("resolve");
        let map = out.as_object().expect("object");
        prop_assert!(map.keys().all(|k| pick.contains(k)));
    }

    /// Renames never change the number of values beyond collisions.
    #[test]
    fn map_keys_never_grows(
        entries in btree_map(key_strategy(), any::<i64>(), 0..6),
        renames in vec((key_strategy(), key_strategy()), 0..4),
    ) {
        let value = object(entries);
        let before = value.as_object().map(Map::len).unwrap_or_default();
        let config = HashConfig { map_keys: Some(KeyMapping::new(renames)), ..HashConfig::default() };
        let out = run(config, value).expect("resolve");
        prop_assert!(out.as_object().map(Map::len).unwrap_or_default() <= before);
    }
}
