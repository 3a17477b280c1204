//! # Hash Reducer
//!
//! Resolution algorithm for `hash` entities.
//!
//! Given an accumulator whose context is a hash entity, the reducer:
//! 1. Returns the accumulator untouched when its value is `null`
//! 2. Rejects any value that is not a JSON object (`ValidationError`)
//! 3. Applies `mapKeys`, `addKeys`, `omitKeys`, `pickKeys`, `addValues`
//!    and `compose`, always in this order
//!
//! Absent and empty operations are no-ops. In particular an empty `pickKeys`
//! keeps every key.
//!
//! `addValues` and `compose` call back into the injected
//! [`ResolveTransform`]; their errors are returned unchanged.

use crate::entity::{ExprMapping, KeyMapping};
use crate::resolver::ResolveTransform;
use crate::{Accumulator, HashpointError, ValidationError};
use futures::future::try_join_all;
use serde_json::{Map, Value};
use std::sync::Arc;

/// The reducer for `hash` entities.
pub struct HashReducer;

impl HashReducer {
    /// Resolve `accumulator` through the hash configuration of its context.
    ///
    /// The returned accumulator keeps the input's context and options; only
    /// `value` changes.
    pub async fn resolve<R>(
        accumulator: Accumulator,
        resolver: &R,
    ) -> Result<Accumulator, HashpointError>
    where
        R: ResolveTransform + ?Sized,
    {
        if accumulator.value.is_null() {
            return Ok(accumulator);
        }

        let entity = Arc::clone(&accumulator.context);
        let config = &entity.config;
        let Accumulator {
            value,
            context,
            options,
        } = accumulator;

        let mut map = match value {
            Value::Object(map) => map,
            other => {
                tracing::debug!(entity = %entity.id, "rejecting non-object hash value");
                return Err(ValidationError::new(entity.id.clone(), &other).into());
            }
        };

        if let Some(mapping) = config.map_keys.as_ref().filter(|m| !m.is_empty()) {
            map = map_keys(map, mapping);
        }
        if let Some(entries) = config.add_keys.as_ref().filter(|m| !m.is_empty()) {
            add_keys(&mut map, entries);
        }
        if let Some(keys) = config.omit_keys.as_ref().filter(|k| !k.is_empty()) {
            omit_keys(&mut map, keys);
        }
        if let Some(keys) = config.pick_keys.as_ref().filter(|k| !k.is_empty()) {
            map = pick_keys(map, keys);
        }

        let mut current = Accumulator {
            value: Value::Object(map),
            context,
            options,
        };

        if let Some(mapping) = config.add_values.as_ref().filter(|m| !m.is_empty()) {
            let resolved = add_values(&current, mapping, resolver).await?;
            if let Value::Object(map) = &mut current.value {
                map.extend(resolved);
            }
        }

        if let Some(stages) = config.compose.as_ref().filter(|s| !s.is_empty()) {
            for (index, stage) in stages.iter().enumerate() {
                tracing::trace!(entity = %entity.id, stage = index, "resolving compose stage");
                let output = resolver.resolve_transform(&current, stage).await?;
                current.value = output.value;
            }
        }

        Ok(current)
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// Re-insert renamed entries under their target keys.
///
/// Entries that are not renamed pass through. Renamed entries are applied in
/// declared order after the passthrough entries, so the last rename onto a
/// target wins and a rename overrides a passthrough key of the same name.
fn map_keys(map: Map<String, Value>, mapping: &KeyMapping) -> Map<String, Value> {
    let renamed: Vec<(String, Value)> = mapping
        .iter()
        .filter_map(|(source, target)| map.get(source).map(|v| (target.to_string(), v.clone())))
        .collect();

    let mut result: Map<String, Value> = map
        .into_iter()
        .filter(|(key, _)| !mapping.is_source(key))
        .collect();
    result.extend(renamed);
    result
}

fn add_keys(map: &mut Map<String, Value>, entries: &Map<String, Value>) {
    for (key, value) in entries {
        map.insert(key.clone(), value.clone());
    }
}

fn omit_keys(map: &mut Map<String, Value>, keys: &[String]) {
    map.retain(|key, _| !keys.contains(key));
}

/// Keep only listed keys. Listed keys that are missing are ignored.
fn pick_keys(map: Map<String, Value>, keys: &[String]) -> Map<String, Value> {
    map.into_iter().filter(|(key, _)| keys.contains(key)).collect()
}

/// Resolve every `addValues` expression concurrently against `current`.
///
/// The first failure fails the whole join. Results keep declared order.
async fn add_values<R>(
    current: &Accumulator,
    mapping: &ExprMapping,
    resolver: &R,
) -> Result<Vec<(String, Value)>, HashpointError>
where
    R: ResolveTransform + ?Sized,
{
    try_join_all(mapping.iter().map(|(key, expr)| async move {
        let resolved = resolver.resolve_transform(current, expr).await?;
        Ok::<_, HashpointError>((key.to_string(), resolved.value))
    }))
    .await
}

// =============================================================================
// TESTS
// =============================================================================
