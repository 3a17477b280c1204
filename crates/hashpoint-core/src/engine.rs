//! # Resolution Engine
//!
//! Reference [`ResolveTransform`] implementation over an [`EntityRegistry`].
//!
//! Resolving an entity:
//! 1. Enter the entity (depth + 1, `DepthExceeded` past the limit)
//! 2. Apply the entity's `value` transform, if any
//! 3. Hand the accumulator to [`HashReducer::resolve`], with the engine
//!    itself as the resolver for nested expressions

use crate::entity::Entity;
use crate::primitives::{HASH_ENTITY_TYPE, INLINE_ENTITY_SUFFIX, MAX_RESOLVE_DEPTH};
use crate::reducer::HashReducer;
use crate::registry::EntityRegistry;
use crate::resolver::ResolveTransform;
use crate::transform::TransformExpr;
use crate::{Accumulator, EntityId, HashpointError, ResolveOptions};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// Resolves entity ids and transform expressions against a registry.
#[derive(Debug, Clone)]
pub struct Engine {
    registry: Arc<EntityRegistry>,
    max_depth: usize,
}

impl Engine {
    /// Create an engine with the default depth limit.
    #[must_use]
    pub fn new(registry: EntityRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
            max_depth: MAX_RESOLVE_DEPTH,
        }
    }

    /// Override the entity nesting limit.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The registry this engine resolves against.
    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Resolve `value` through the entity `id`.
    ///
    /// # Errors
    /// - `EntityNotFound` / `UnsupportedEntityType` for a bad id
    /// - anything the entity's resolution raises
    pub async fn resolve(
        &self,
        id: &EntityId,
        value: Value,
        options: ResolveOptions,
    ) -> Result<Accumulator, HashpointError> {
        let entity = self.lookup(id)?;
        tracing::debug!(entity = %id, "resolving entity");
        let accumulator = Accumulator::new(value, entity).with_options(options);
        self.resolve_entity(accumulator).await
    }

    fn lookup(&self, id: &EntityId) -> Result<Arc<Entity>, HashpointError> {
        match id.entity_type() {
            Some(HASH_ENTITY_TYPE) => self
                .registry
                .get(id)
                .ok_or_else(|| HashpointError::EntityNotFound(id.clone())),
            Some(other) => Err(HashpointError::UnsupportedEntityType(other.to_string())),
            None => Err(HashpointError::EntityNotFound(id.clone())),
        }
    }

    /// Run an accumulator whose context was just entered.
    async fn resolve_entity(&self, accumulator: Accumulator) -> Result<Accumulator, HashpointError> {
        if accumulator.options.depth > self.max_depth {
            tracing::warn!(
                entity = %accumulator.context.id,
                depth = accumulator.options.depth,
                "resolution depth exceeded"
            );
            return Err(HashpointError::DepthExceeded(self.max_depth));
        }

        let accumulator = match &accumulator.context.config.value {
            Some(expr) => {
                let resolved = self.resolve_transform(&accumulator, expr).await?;
                accumulator.with_value(resolved.value)
            }
            None => accumulator,
        };

        HashReducer::resolve(accumulator, self).await
    }
}

#[async_trait]
impl ResolveTransform for Engine {
    async fn resolve_transform(
        &self,
        accumulator: &Accumulator,
        expr: &TransformExpr,
    ) -> Result<Accumulator, HashpointError> {
        match expr {
            TransformExpr::Path(path) => Ok(accumulator.derive(path.select(&accumulator.value))),
            TransformExpr::Constant(value) => Ok(accumulator.derive(value.clone())),
            TransformExpr::Entity(id) => {
                let entity = self.lookup(id)?;
                tracing::debug!(
                    parent = %accumulator.context.id,
                    entity = %id,
                    "resolving nested entity"
                );
                let nested = self.resolve_entity(accumulator.enter(entity)).await?;
                Ok(accumulator.derive(nested.value))
            }
            TransformExpr::Hash(config) => {
                let id = format!("{}{}", accumulator.context.id, INLINE_ENTITY_SUFFIX);
                let entity = Arc::new(Entity::new(id, (**config).clone()));
                let nested = self.resolve_entity(accumulator.enter(entity)).await?;
                Ok(accumulator.derive(nested.value))
            }
            TransformExpr::Chain(steps) => {
                let mut current = accumulator.clone();
                for step in steps {
                    current = self.resolve_transform(&current, step).await?;
                }
                Ok(current)
            }
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn engine(definitions: Value) -> Engine {
        let mut registry = EntityRegistry::new();
        if let Value::Object(map) = definitions {
            for (id, raw) in map {
                let config = serde_json::from_value(raw).expect("config");
                registry.insert(id, config).expect("insert");
            }
        }
        Engine::new(registry)
    }

    async fn resolve(engine: &Engine, id: &str, value: Value) -> Result<Value, HashpointError> {
        engine
            .resolve(&EntityId::new(id), value, ResolveOptions::default())
            .await
            .map(|acc| acc.value)
    }

    #[tokio::test]
    async fn value_transform_runs_before_validation() {
        let engine = engine(json!({
            "hash:a": { "value": "$a" },
            "hash:arrays": { "value": "$list" }
        }));

        let out = resolve(&engine, "hash:a", json!({ "a": { "h1": 1 } })).await.expect("ok");
        assert_eq!(out, json!({ "h1": 1 }));

        let err = resolve(&engine, "hash:arrays", json!({ "list": [1, 2, 3] }))
            .await
            .expect_err("must fail");
        assert!(err.to_string().contains("[1,2,3] of type array"));
    }

    #[tokio::test]
    async fn nested_entity_in_add_values() {
        let engine = engine(json!({
            "hash:outer": { "addValues": { "inner": ["$nested", "hash:inner"] } },
            "hash:inner": { "omitKeys": ["secret"] }
        }));

        let out = resolve(
            &engine,
            "hash:outer",
            json!({ "nested": { "secret": 1, "open": 2 } }),
        )
        .await
        .expect("ok");
        assert_eq!(out, json!({ "nested": { "secret": 1, "open": 2 }, "inner": { "open": 2 } }));
    }

    #[tokio::test]
    async fn compose_through_registered_entities() {
        let engine = engine(json!({
            "hash:pipeline": { "compose": ["hash:rename", { "pickKeys": ["c"] }] },
            "hash:rename": { "mapKeys": { "a": "c" } }
        }));

        let out = resolve(&engine, "hash:pipeline", json!({ "a": 1, "b": 2 }))
            .await
            .expect("ok");
        assert_eq!(out, json!({ "c": 1 }));
    }

    #[tokio::test]
    async fn self_compose_hits_depth_limit() {
        let engine = engine(json!({ "hash:loop": { "compose": ["hash:loop"] } })).with_max_depth(8);

        let err = resolve(&engine, "hash:loop", json!({})).await.expect_err("must fail");
        assert!(matches!(err, HashpointError::DepthExceeded(8)));
    }

    #[tokio::test]
    async fn unknown_entities() {
        let engine = engine(json!({ "hash:a": { "addValues": { "x": "model:thing" } } }));

        let err = resolve(&engine, "hash:missing", json!({})).await.expect_err("must fail");
        assert!(matches!(err, HashpointError::EntityNotFound(_)));

        let err = resolve(&engine, "hash:a", json!({})).await.expect_err("must fail");
        assert!(matches!(err, HashpointError::UnsupportedEntityType(kind) if kind == "model"));
    }

    #[tokio::test]
    async fn locals_and_depth_are_carried() {
        let engine = engine(json!({ "hash:a": { "addKeys": { "k": 1 } } }));
        let options = ResolveOptions::with_locals(json!({ "tenant": "t1" }));

        let acc = engine
            .resolve(&EntityId::new("hash:a"), json!({}), options.clone())
            .await
            .expect("ok");
        assert_eq!(acc.options, options);
        assert_eq!(acc.context.id.as_str(), "hash:a");
    }

    #[tokio::test]
    async fn chain_feeds_each_step() {
        let engine = engine(json!({
            "hash:a": { "addValues": { "deep": ["$x", "$y", "$z"] } }
        }));
        let out = resolve(&engine, "hash:a", json!({ "x": { "y": { "z": 7 } } }))
            .await
            .expect("ok");
        assert_eq!(out["deep"], json!(7));
    }
}
