//! # Definition Documents
//!
//! Entity definitions as TOML or JSON.
//!
//! Document shape (JSON shown, TOML is the same tree):
//!
//! ```text
//! {
//!   "entities": {
//!     "hash:person": { "mapKeys": { "name": "fullName" }, "omitKeys": ["password"] }
//!   }
//! }
//! ```
//!
//! Syntax errors map to `SerializationError`, including an entity id that
//! appears twice in one document. Ids and configurations the registry
//! refuses map to `Config`.
//!
//! Tables keep their declared order in both syntaxes, so `mapKeys`,
//! `addKeys` and `addValues` apply in the order they are written.

use crate::entity::HashConfig;
use crate::registry::EntityRegistry;
use crate::HashpointError;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;
use std::path::Path;

// =============================================================================
// DOCUMENT
// =============================================================================

/// A parsed definition document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefinitionDocument {
    /// Entity configurations keyed by entity id.
    #[serde(default, deserialize_with = "unique_entities")]
    pub entities: BTreeMap<String, HashConfig>,
}

/// Deserialize the `entities` table, rejecting an id given twice.
fn unique_entities<'de, D>(deserializer: D) -> Result<BTreeMap<String, HashConfig>, D::Error>
where
    D: Deserializer<'de>,
{
    struct EntitiesVisitor;

    impl<'de> Visitor<'de> for EntitiesVisitor {
        type Value = BTreeMap<String, HashConfig>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a table of entity configurations keyed by entity id")
        }

        fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entities = BTreeMap::new();
            while let Some((id, config)) = access.next_entry::<String, HashConfig>()? {
                match entities.entry(id) {
                    Entry::Occupied(entry) => {
                        return Err(de::Error::custom(format!(
                            "entity '{}' is defined more than once",
                            entry.key()
                        )));
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(config);
                    }
                }
            }
            Ok(entities)
        }
    }

    deserializer.deserialize_map(EntitiesVisitor)
}

impl DefinitionDocument {
    /// Register every entity of this document in a fresh registry.
    pub fn into_registry(self) -> Result<EntityRegistry, HashpointError> {
        let mut registry = EntityRegistry::new();
        for (id, config) in self.entities {
            registry.insert(id, config)?;
        }
        Ok(registry)
    }

    /// Snapshot a registry as a document.
    #[must_use]
    pub fn from_registry(registry: &EntityRegistry) -> Self {
        let entities = registry
            .entities()
            .map(|entity| (entity.id.as_str().to_string(), entity.config.clone()))
            .collect();
        Self { entities }
    }
}

// =============================================================================
// FORMAT SELECTION
// =============================================================================

/// Syntax of a definition document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Toml,
    Json,
}

impl DefinitionFormat {
    /// Pick the format from a file extension; anything but `.json` is TOML.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }
}

// =============================================================================
// PARSING
// =============================================================================

/// Parse a TOML definition document into a registry.
pub fn registry_from_toml(input: &str) -> Result<EntityRegistry, HashpointError> {
    let document: DefinitionDocument = toml::from_str(input)
        .map_err(|e| HashpointError::SerializationError(format!("TOML definitions: {}", e)))?;
    document.into_registry()
}

/// Parse a JSON definition document into a registry.
pub fn registry_from_json(input: &str) -> Result<EntityRegistry, HashpointError> {
    let document: DefinitionDocument = serde_json::from_str(input)
        .map_err(|e| HashpointError::SerializationError(format!("JSON definitions: {}", e)))?;
    document.into_registry()
}

/// Parse a definition document in the given format.
pub fn registry_from_str(
    input: &str,
    format: DefinitionFormat,
) -> Result<EntityRegistry, HashpointError> {
    match format {
        DefinitionFormat::Toml => registry_from_toml(input),
        DefinitionFormat::Json => registry_from_json(input),
    }
}

/// Export a registry as a pretty-printed JSON definition document.
pub fn registry_to_json(registry: &EntityRegistry) -> Result<String, HashpointError> {
    serde_json::to_string_pretty(&DefinitionDocument::from_registry(registry))
        .map_err(|e| HashpointError::SerializationError(e.to_string()))
}

// =============================================================================
// TESTS
// =============================================================================
