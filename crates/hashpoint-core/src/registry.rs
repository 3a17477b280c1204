//! # Entity Registry
//!
//! Maps entity ids to immutable hash entity configurations.
//!
//! Uses `BTreeMap` so listing and reference validation are deterministic.
//! Only `hash:<name>` ids are accepted; every configuration is validated on
//! insert.

use crate::entity::{Entity, HashConfig};
use crate::primitives::HASH_ENTITY_TYPE;
use crate::{EntityId, HashpointError};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Registry of hash entities.
#[derive(Debug, Clone, Default)]
pub struct EntityRegistry {
    entities: BTreeMap<EntityId, Arc<Entity>>,
}

impl EntityRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity.
    ///
    /// # Errors
    /// Returns `HashpointError::Config` if:
    /// - the id is not of the form `hash:<name>`
    /// - the id is already registered
    /// - the configuration fails [`HashConfig::validate`]
    pub fn insert(
        &mut self,
        id: impl Into<EntityId>,
        config: HashConfig,
    ) -> Result<Arc<Entity>, HashpointError> {
        let id = id.into();

        match (id.entity_type(), id.name()) {
            (Some(HASH_ENTITY_TYPE), Some(name)) if !name.is_empty() => {}
            _ => {
                return Err(HashpointError::Config(format!(
                    "entity id '{}' must have the form '{}:<name>'",
                    id, HASH_ENTITY_TYPE
                )));
            }
        }

        if self.entities.contains_key(&id) {
            return Err(HashpointError::Config(format!(
                "entity '{}' is already registered",
                id
            )));
        }

        config
            .validate()
            .map_err(|e| HashpointError::Config(format!("entity '{}': {}", id, e)))?;

        let entity = Arc::new(Entity::new(id.clone(), config));
        self.entities.insert(id, Arc::clone(&entity));
        Ok(entity)
    }

    /// Look up an entity by id.
    #[must_use]
    pub fn get(&self, id: &EntityId) -> Option<Arc<Entity>> {
        self.entities.get(id).cloned()
    }

    /// Check whether an entity is registered.
    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.entities.contains_key(id)
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.entities.keys()
    }

    /// Registered entities, sorted by id.
    pub fn entities(&self) -> impl Iterator<Item = &Arc<Entity>> {
        self.entities.values()
    }

    /// Check that every entity reference in every configuration resolves.
    ///
    /// References inside `value`, `addValues`, `compose`, chains and inline
    /// configurations are all checked.
    ///
    /// # Errors
    /// Returns `HashpointError::EntityNotFound` for the first dangling
    /// reference, in id order.
    pub fn validate_references(&self) -> Result<(), HashpointError> {
        for entity in self.entities.values() {
            let mut refs = Vec::new();
            for expr in entity.config.expressions() {
                expr.collect_entity_refs(&mut refs);
            }
            if let Some(missing) = refs.into_iter().find(|id| !self.contains(id)) {
                tracing::debug!(entity = %entity.id, missing = %missing, "dangling entity reference");
                return Err(HashpointError::EntityNotFound(missing.clone()));
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn config(raw: serde_json::Value) -> HashConfig {
        serde_json::from_value(raw).expect("config")
    }

    #[test]
    fn insert_and_get() {
        let mut registry = EntityRegistry::new();
        registry
            .insert("hash:person", config(json!({ "omitKeys": ["password"] })))
            .expect("insert");

        let entity = registry.get(&EntityId::new("hash:person")).expect("get");
        assert_eq!(entity.id.as_str(), "hash:person");
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }

    #[test]
    fn rejects_foreign_type_and_bare_names() {
        let mut registry = EntityRegistry::new();
        for id in ["model:x", "person", "hash:", ":x"] {
            let err = registry.insert(id, HashConfig::default()).expect_err(id);
            assert!(matches!(err, HashpointError::Config(_)), "{}", id);
        }
        assert!(registry.is_empty());
    }

    #[test]
    fn rejects_duplicates() {
        let mut registry = EntityRegistry::new();
        registry.insert("hash:a", HashConfig::default()).expect("first");
        assert!(registry.insert("hash:a", HashConfig::default()).is_err());
    }

    #[test]
    fn rejects_invalid_compose_stage() {
        let mut registry = EntityRegistry::new();
        let err = registry
            .insert("hash:bad", config(json!({ "compose": [{ "constant": 1 }] })))
            .expect_err("must fail");
        assert!(err.to_string().contains("hash:bad"));
    }

    #[test]
    fn ids_are_sorted() {
        let mut registry = EntityRegistry::new();
        for id in ["hash:c", "hash:a", "hash:b"] {
            registry.insert(id, HashConfig::default()).expect("insert");
        }
        let ids: Vec<&str> = registry.ids().map(EntityId::as_str).collect();
        assert_eq!(ids, vec!["hash:a", "hash:b", "hash:c"]);
    }

    #[test]
    fn validate_references_finds_dangling() {
        let mut registry = EntityRegistry::new();
        registry
            .insert(
                "hash:a",
                config(json!({ "compose": [{ "addValues": { "k": "hash:missing" } }] })),
            )
            .expect("insert");

        let err = registry.validate_references().expect_err("must fail");
        assert!(matches!(err, HashpointError::EntityNotFound(id) if id.as_str() == "hash:missing"));
    }

    #[test]
    fn validate_references_accepts_complete_set() {
        let mut registry = EntityRegistry::new();
        registry
            .insert("hash:a", config(json!({ "compose": ["hash:b"] })))
            .expect("insert");
        registry
            .insert("hash:b", config(json!({ "value": ["$x", "hash:a"] })))
            .expect("insert");
        assert!(registry.validate_references().is_ok());
    }
}
