//! # Entity Configuration
//!
//! The per-entity reducer configuration read by the hash reducer.
//!
//! Each operation is an explicit optional field. The reducer dispatches on
//! them in a fixed order; the order keys appear in a definition document
//! has no effect, except inside `compose` and inside the ordered mappings
//! (`mapKeys`, `addKeys`, `addValues`).

use crate::primitives::MAX_COMPOSE_STAGES;
use crate::transform::TransformExpr;
use crate::{EntityId, HashpointError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// ENTITY
// =============================================================================

/// A registered (or inline) hash entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    /// The entity identifier.
    pub id: EntityId,
    /// The reducer configuration.
    pub config: HashConfig,
}

impl Entity {
    /// Create a new entity.
    #[must_use]
    pub fn new(id: impl Into<EntityId>, config: HashConfig) -> Self {
        Self {
            id: id.into(),
            config,
        }
    }
}

// =============================================================================
// KEY MAPPINGS
// =============================================================================

/// Ordered `source -> target` key renames (`mapKeys`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct KeyMapping(Vec<(String, String)>);

impl KeyMapping {
    /// Build a mapping from `(source, target)` pairs, in application order.
    ///
    /// Each source keeps one target. A repeated source keeps its first
    /// position and takes the last target, as keys of a JSON object do.
    #[must_use]
    pub fn new<S: Into<String>, T: Into<String>>(pairs: impl IntoIterator<Item = (S, T)>) -> Self {
        let mut unique: Vec<(String, String)> = Vec::new();
        for (source, target) in pairs {
            let (source, target) = (source.into(), target.into());
            match unique.iter_mut().find(|(existing, _)| *existing == source) {
                Some(entry) => entry.1 = target,
                None => unique.push((source, target)),
            }
        }
        Self(unique)
    }

    /// Iterate over `(source, target)` pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(s, t)| (s.as_str(), t.as_str()))
    }

    /// Check whether `key` is renamed by this mapping.
    #[must_use]
    pub fn is_source(&self, key: &str) -> bool {
        self.0.iter().any(|(source, _)| source == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Map<String, Value>> for KeyMapping {
    type Error = HashpointError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        let mut pairs = Vec::with_capacity(map.len());
        for (source, target) in map {
            match target {
                Value::String(target) => pairs.push((source, target)),
                other => {
                    return Err(HashpointError::Config(format!(
                        "mapKeys target for '{}' must be a string, got {}",
                        source, other
                    )));
                }
            }
        }
        Ok(Self(pairs))
    }
}

impl From<KeyMapping> for Map<String, Value> {
    fn from(mapping: KeyMapping) -> Self {
        mapping
            .0
            .into_iter()
            .map(|(source, target)| (source, Value::String(target)))
            .collect()
    }
}

/// Ordered `key -> expression` pairs (`addValues`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ExprMapping(Vec<(String, TransformExpr)>);

impl ExprMapping {
    /// Build a mapping from `(key, expression)` pairs, in insertion order.
    #[must_use]
    pub fn new<K: Into<String>>(pairs: impl IntoIterator<Item = (K, TransformExpr)>) -> Self {
        Self(pairs.into_iter().map(|(k, e)| (k.into(), e)).collect())
    }

    /// Iterate over `(key, expression)` pairs in declared order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TransformExpr)> {
        self.0.iter().map(|(k, e)| (k.as_str(), e))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<Map<String, Value>> for ExprMapping {
    type Error = HashpointError;

    fn try_from(map: Map<String, Value>) -> Result<Self, Self::Error> {
        map.into_iter()
            .map(|(key, raw)| TransformExpr::try_from(raw).map(|expr| (key, expr)))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

impl From<ExprMapping> for Map<String, Value> {
    fn from(mapping: ExprMapping) -> Self {
        mapping
            .0
            .into_iter()
            .map(|(key, expr)| (key, Value::from(expr)))
            .collect()
    }
}

// =============================================================================
// HASH CONFIG
// =============================================================================

/// Reducer configuration of a hash entity.
///
/// Absent and empty operations are both no-ops.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields, into = "Value")]
pub struct HashConfig {
    /// Entity-level value transform, applied by the engine before the reducer.
    #[serde(default)]
    pub value: Option<TransformExpr>,
    /// Rename keys.
    #[serde(default)]
    pub map_keys: Option<KeyMapping>,
    /// Insert literal values.
    #[serde(default)]
    pub add_keys: Option<Map<String, Value>>,
    /// Remove keys.
    #[serde(default)]
    pub omit_keys: Option<Vec<String>>,
    /// Keep only these keys.
    #[serde(default)]
    pub pick_keys: Option<Vec<String>>,
    /// Insert resolved transform results.
    #[serde(default)]
    pub add_values: Option<ExprMapping>,
    /// Nested stages, each a full resolution.
    #[serde(default)]
    pub compose: Option<Vec<TransformExpr>>,
}

impl HashConfig {
    /// Check structural rules serde cannot express.
    ///
    /// - `compose` stages are entity references or inline hash configurations
    /// - `compose` holds at most `MAX_COMPOSE_STAGES` stages
    ///
    /// Inline configurations nested anywhere in this one are checked too.
    pub fn validate(&self) -> Result<(), HashpointError> {
        if let Some(stages) = &self.compose {
            if stages.len() > MAX_COMPOSE_STAGES {
                return Err(HashpointError::Config(format!(
                    "compose has {} stages, maximum is {}",
                    stages.len(),
                    MAX_COMPOSE_STAGES
                )));
            }
            for (index, stage) in stages.iter().enumerate() {
                if !matches!(stage, TransformExpr::Entity(_) | TransformExpr::Hash(_)) {
                    return Err(HashpointError::Config(format!(
                        "compose stage {} must be an entity reference or an inline hash, got {}",
                        index,
                        Value::from(stage.clone())
                    )));
                }
            }
        }

        for expr in self.expressions() {
            expr.validate()?;
        }
        Ok(())
    }

    /// All transform expressions held directly by this configuration.
    pub fn expressions(&self) -> impl Iterator<Item = &TransformExpr> {
        self.value
            .iter()
            .chain(self.add_values.iter().flat_map(|m| m.iter().map(|(_, e)| e)))
            .chain(self.compose.iter().flatten())
    }
}

impl From<HashConfig> for Value {
    fn from(config: HashConfig) -> Self {
        let mut map = Map::new();
        if let Some(value) = config.value {
            map.insert("value".into(), value.into());
        }
        if let Some(map_keys) = config.map_keys {
            map.insert("mapKeys".into(), Value::Object(map_keys.into()));
        }
        if let Some(add_keys) = config.add_keys {
            map.insert("addKeys".into(), Value::Object(add_keys));
        }
        if let Some(omit_keys) = config.omit_keys {
            map.insert("omitKeys".into(), omit_keys.into());
        }
        if let Some(pick_keys) = config.pick_keys {
            map.insert("pickKeys".into(), pick_keys.into());
        }
        if let Some(add_values) = config.add_values {
            map.insert("addValues".into(), Value::Object(add_values.into()));
        }
        if let Some(compose) = config.compose {
            map.insert(
                "compose".into(),
                Value::Array(compose.into_iter().map(Value::from).collect()),
            );
        }
        Value::Object(map)
    }
}

// =============================================================================
// TESTS
// =============================================================================
