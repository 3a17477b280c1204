//! # Transform Expressions
//!
//! The expressions a [`ResolveTransform`](crate::ResolveTransform) evaluates.
//!
//! The hash reducer never looks inside an expression; it only hands them to
//! the resolver. The JSON shapes below are what the reference engine and the
//! definition formats understand:
//!
//! | JSON                   | Expression                          |
//! |------------------------|-------------------------------------|
//! | `"$"`                  | the whole current value             |
//! | `"$a.b.0"`             | path lookup, `null` when missing    |
//! | `"hash:person"`        | entity reference                    |
//! | `["$a", "hash:x"]`     | chain, each step feeds the next     |
//! | `{"constant": 42}`     | literal value                       |
//! | `{"mapKeys": {...}}`   | inline hash configuration           |

use crate::entity::HashConfig;
use crate::primitives::{ENTITY_SEPARATOR, PATH_PREFIX, PATH_SEPARATOR};
use crate::{EntityId, HashpointError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Key that marks an object expression as a literal.
const CONSTANT_KEY: &str = "constant";

// =============================================================================
// PATH EXPRESSION
// =============================================================================

/// A `$`-prefixed path into the current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    segments: Vec<String>,
}

impl PathExpr {
    /// Parse `"$"` or `"$a.b.c"`.
    pub fn parse(raw: &str) -> Result<Self, HashpointError> {
        let rest = raw.strip_prefix(PATH_PREFIX).ok_or_else(|| {
            HashpointError::InvalidExpression(format!("path '{}' must start with '$'", raw))
        })?;

        if rest.is_empty() {
            return Ok(Self {
                segments: Vec::new(),
            });
        }

        let segments: Vec<String> = rest.split(PATH_SEPARATOR).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(HashpointError::InvalidExpression(format!(
                "path '{}' has an empty segment",
                raw
            )));
        }
        Ok(Self { segments })
    }

    /// Path segments, empty for the root path.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Select the addressed value, or `Null` when any segment is missing.
    ///
    /// Numeric segments index into arrays.
    #[must_use]
    pub fn select(&self, root: &Value) -> Value {
        let mut current = root;
        for segment in &self.segments {
            let next = match current {
                Value::Object(map) => map.get(segment),
                Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
                _ => None,
            };
            match next {
                Some(value) => current = value,
                None => return Value::Null,
            }
        }
        current.clone()
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", PATH_PREFIX)?;
        let joined = self.segments.join(&PATH_SEPARATOR.to_string());
        f.write_str(&joined)
    }
}

// =============================================================================
// TRANSFORM EXPRESSION
// =============================================================================

/// A nested transform that a resolver evaluates to a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum TransformExpr {
    /// Select part of the current value.
    Path(PathExpr),
    /// A literal value.
    Constant(Value),
    /// Resolve through a registered entity.
    Entity(EntityId),
    /// Resolve through an inline hash configuration.
    Hash(Arc<HashConfig>),
    /// Apply each expression to the previous one's result.
    Chain(Vec<TransformExpr>),
}

impl TransformExpr {
    /// Shorthand for a path expression.
    pub fn path(raw: &str) -> Result<Self, HashpointError> {
        PathExpr::parse(raw).map(Self::Path)
    }

    /// Shorthand for an entity reference.
    #[must_use]
    pub fn entity(id: impl Into<EntityId>) -> Self {
        Self::Entity(id.into())
    }

    /// Shorthand for an inline hash configuration.
    #[must_use]
    pub fn hash(config: HashConfig) -> Self {
        Self::Hash(Arc::new(config))
    }

    fn parse_str(raw: &str) -> Result<Self, HashpointError> {
        if raw.starts_with(PATH_PREFIX) {
            return Self::path(raw);
        }
        match raw.split_once(ENTITY_SEPARATOR) {
            Some((kind, name)) if !kind.is_empty() && !name.is_empty() => {
                Ok(Self::Entity(EntityId::new(raw)))
            }
            _ => Err(HashpointError::InvalidExpression(format!(
                "'{}' is neither a '$' path nor a '<type>:<name>' entity reference",
                raw
            ))),
        }
    }

    /// Check nested inline configurations.
    pub fn validate(&self) -> Result<(), HashpointError> {
        match self {
            Self::Hash(config) => config.validate(),
            Self::Chain(steps) => steps.iter().try_for_each(Self::validate),
            Self::Path(_) | Self::Constant(_) | Self::Entity(_) => Ok(()),
        }
    }

    /// Collect every entity reference reachable from this expression,
    /// including those inside inline configurations.
    pub fn collect_entity_refs<'a>(&'a self, out: &mut Vec<&'a EntityId>) {
        match self {
            Self::Entity(id) => out.push(id),
            Self::Hash(config) => {
                for expr in config.expressions() {
                    expr.collect_entity_refs(out);
                }
            }
            Self::Chain(steps) => {
                for step in steps {
                    step.collect_entity_refs(out);
                }
            }
            Self::Path(_) | Self::Constant(_) => {}
        }
    }
}

impl TryFrom<Value> for TransformExpr {
    type Error = HashpointError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::String(raw) => Self::parse_str(&raw),
            Value::Array(items) => {
                if items.is_empty() {
                    return Err(HashpointError::InvalidExpression(
                        "chain must contain at least one expression".to_string(),
                    ));
                }
                items
                    .into_iter()
                    .map(Self::try_from)
                    .collect::<Result<Vec<_>, _>>()
                    .map(Self::Chain)
            }
            Value::Object(mut map) => {
                if map.len() == 1 {
                    if let Some(constant) = map.remove(CONSTANT_KEY) {
                        return Ok(Self::Constant(constant));
                    }
                }
                serde_json::from_value::<HashConfig>(Value::Object(map))
                    .map(Self::hash)
                    .map_err(|e| HashpointError::InvalidExpression(format!("inline hash: {}", e)))
            }
            other => Err(HashpointError::InvalidExpression(format!(
                "unsupported expression {}",
                other
            ))),
        }
    }
}

impl From<TransformExpr> for Value {
    fn from(expr: TransformExpr) -> Self {
        match expr {
            TransformExpr::Path(path) => Value::String(path.to_string()),
            TransformExpr::Constant(value) => {
                let mut map = Map::new();
                map.insert(CONSTANT_KEY.to_string(), value);
                Value::Object(map)
            }
            TransformExpr::Entity(id) => Value::String(id.as_str().to_string()),
            TransformExpr::Hash(config) => Value::from(Arc::unwrap_or_clone(config)),
            TransformExpr::Chain(steps) => Value::Array(steps.into_iter().map(Value::from).collect()),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
