//! # API Request/Response Types

use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// ENTITIES RESPONSE
// =============================================================================

/// Registered entity ids, in sorted order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitiesResponse {
    pub entities: Vec<String>,
    pub count: usize,
}

impl EntitiesResponse {
    #[must_use]
    pub fn new(entities: Vec<String>) -> Self {
        let count = entities.len();
        Self { entities, count }
    }
}

// =============================================================================
// RESOLVE REQUEST/RESPONSE
// =============================================================================

/// Resolve request.
///
/// A missing `value` is `null`, which every hash entity passes through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveRequest {
    pub entity: String,
    #[serde(default)]
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locals: Option<Value>,
}

/// Resolve response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResolveResponse {
    #[must_use]
    pub fn success(value: Value) -> Self {
        Self {
            success: true,
            value: Some(value),
            error: None,
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            value: None,
            error: Some(message.into()),
        }
    }
}
