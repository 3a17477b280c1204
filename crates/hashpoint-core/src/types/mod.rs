//! # Core Type Definitions
//!
//! This module contains the shared types threaded through a resolution:
//! - Entity identifiers (`EntityId`)
//! - The unit of data flowing through resolution (`Accumulator`)
//! - Caller-owned resolution options (`ResolveOptions`)
//! - Error types (`HashpointError`, `ValidationError`)

use crate::entity::Entity;
use crate::primitives::{ENTITY_SEPARATOR, HASH_ENTITY_DOCS_URL};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// ENTITY IDENTIFIER
// =============================================================================

/// Identifier of an entity in the registry, in the form `<type>:<name>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new entity id from a string.
    ///
    /// No format check happens here; the registry rejects ids that are not
    /// `hash:<name>`.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The type prefix (`hash` in `hash:person`), if the id has one.
    #[must_use]
    pub fn entity_type(&self) -> Option<&str> {
        self.0.split_once(ENTITY_SEPARATOR).map(|(kind, _)| kind)
    }

    /// The name after the type prefix (`person` in `hash:person`).
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.0.split_once(ENTITY_SEPARATOR).map(|(_, name)| name)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

// =============================================================================
// RESOLVE OPTIONS
// =============================================================================

/// Options carried by an accumulator.
///
/// The hash reducer never reads these; it passes them through to every
/// nested resolution unchanged.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Caller-supplied data, available to transform expressions.
    #[serde(default)]
    pub locals: Value,
    /// Entity nesting depth, maintained by the engine.
    #[serde(default)]
    pub depth: usize,
}

impl ResolveOptions {
    /// Options with the given locals and depth zero.
    #[must_use]
    pub fn with_locals(locals: Value) -> Self {
        Self { locals, depth: 0 }
    }
}

// =============================================================================
// ACCUMULATOR
// =============================================================================

/// The value-plus-context wrapper threaded through one resolution call.
///
/// `value` is `Value::Null` when there is no value yet. Once the hash reducer
/// has validated it, `value` is either `Null` or a JSON object.
#[derive(Debug, Clone)]
pub struct Accumulator {
    /// The current value.
    pub value: Value,
    /// The entity configuration that owns this accumulator.
    pub context: Arc<Entity>,
    /// Options passed through opaquely.
    pub options: ResolveOptions,
}

impl Accumulator {
    /// Create an accumulator for `value`, owned by `context`, with default
    /// options.
    #[must_use]
    pub fn new(value: Value, context: Arc<Entity>) -> Self {
        Self {
            value,
            context,
            options: ResolveOptions::default(),
        }
    }

    /// Replace the options.
    #[must_use]
    pub fn with_options(mut self, options: ResolveOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the value, keeping context and options.
    #[must_use]
    pub fn with_value(mut self, value: Value) -> Self {
        self.value = value;
        self
    }

    /// A copy of this accumulator holding `value` instead.
    #[must_use]
    pub fn derive(&self, value: Value) -> Self {
        Self {
            value,
            context: Arc::clone(&self.context),
            options: self.options.clone(),
        }
    }

    /// A copy of this accumulator owned by another entity, one level deeper.
    #[must_use]
    pub fn enter(&self, context: Arc<Entity>) -> Self {
        Self {
            value: self.value.clone(),
            context,
            options: ResolveOptions {
                locals: self.options.locals.clone(),
                depth: self.options.depth.saturating_add(1),
            },
        }
    }
}

// =============================================================================
// JSON TYPE NAMES
// =============================================================================

/// Human-readable name of a JSON value's type, as used in error messages.
#[must_use]
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// A hash entity received a value that is not a plain mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "Entity '{entity}' value must be a plain mapping, received {received} of type {type_name}. More info {docs}",
    docs = HASH_ENTITY_DOCS_URL
)]
pub struct ValidationError {
    /// The entity whose reducer rejected the value.
    pub entity: EntityId,
    /// The offending value, serialized as compact JSON.
    pub received: String,
    /// The value's type name (`array`, `string`, ...).
    pub type_name: &'static str,
}

impl ValidationError {
    /// Build the error for `value` rejected by `entity`.
    #[must_use]
    pub fn new(entity: EntityId, value: &Value) -> Self {
        Self {
            entity,
            received: value.to_string(),
            type_name: json_type_name(value),
        }
    }
}

/// Errors that can occur in hashpoint.
///
/// - No silent failures
/// - Errors raised by nested resolutions are returned as-is, never wrapped
#[derive(Debug, Error)]
pub enum HashpointError {
    /// The value handed to a hash entity is not a plain mapping.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A referenced entity is not registered.
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    /// An entity reference names a type no reducer handles.
    #[error("Unsupported entity type '{0}'")]
    UnsupportedEntityType(String),

    /// A transform expression cannot be parsed or evaluated.
    #[error("Invalid transform expression: {0}")]
    InvalidExpression(String),

    /// Entity nesting went deeper than the engine allows.
    #[error("Maximum resolution depth {0} exceeded")]
    DepthExceeded(usize),

    /// An entity configuration is malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_id_splits_type_and_name() {
        let id = EntityId::new("hash:person");
        assert_eq!(id.entity_type(), Some("hash"));
        assert_eq!(id.name(), Some("person"));

        let bare = EntityId::new("person");
        assert_eq!(bare.entity_type(), None);
        assert_eq!(bare.name(), None);
    }

    #[test]
    fn entity_id_keeps_colons_in_name() {
        let id = EntityId::new("hash:a:b");
        assert_eq!(id.entity_type(), Some("hash"));
        assert_eq!(id.name(), Some("a:b"));
    }

    #[test]
    fn type_names() {
        assert_eq!(json_type_name(&json!(null)), "null");
        assert_eq!(json_type_name(&json!(true)), "boolean");
        assert_eq!(json_type_name(&json!(1.5)), "number");
        assert_eq!(json_type_name(&json!("x")), "string");
        assert_eq!(json_type_name(&json!([1])), "array");
        assert_eq!(json_type_name(&json!({})), "object");
    }

    #[test]
    fn validation_message_format() {
        let err = ValidationError::new(EntityId::new("hash:list"), &json!([1, 2, 3]));
        let message = err.to_string();

        assert!(message.contains("[1,2,3] of type array"));
        assert!(message.contains("More info https://"));
        assert!(message.contains("hash:list"));
    }

    #[test]
    fn validation_error_is_transparent_in_enum() {
        let err: HashpointError =
            ValidationError::new(EntityId::new("hash:s"), &json!("text")).into();
        assert!(err.to_string().starts_with("Entity 'hash:s'"));
        assert!(err.to_string().contains("\"text\" of type string"));
    }
}
