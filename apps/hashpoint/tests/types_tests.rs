//! Unit tests for API types serialization/deserialization.

#![allow(clippy::unwrap_used, clippy::panic)]

use hashpoint::api::{EntitiesResponse, HealthResponse, ResolveRequest, ResolveResponse};
use serde_json::{Value, json};

// =============================================================================
// HEALTH RESPONSE TESTS
// =============================================================================

#[test]
fn test_health_response_default() {
    let health = HealthResponse::default();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[test]
fn test_health_response_serialization() {
    let health = HealthResponse {
        status: "ok".to_string(),
        version: "0.4.2".to_string(),
    };

    let json = serde_json::to_string(&health).unwrap();
    assert_eq!(json, r#"{"status":"ok","version":"0.4.2"}"#);
}

// =============================================================================
// ENTITIES RESPONSE TESTS
// =============================================================================

#[test]
fn test_entities_response_counts() {
    let body = EntitiesResponse::new(vec!["hash:a".into(), "hash:b".into()]);
    assert_eq!(body.count, 2);
    assert_eq!(
        serde_json::to_value(&body).unwrap(),
        json!({ "entities": ["hash:a", "hash:b"], "count": 2 })
    );
}

// =============================================================================
// RESOLVE REQUEST TESTS
// =============================================================================

#[test]
fn test_resolve_request_minimal() {
    let request: ResolveRequest = serde_json::from_str(r#"{"entity":"hash:user"}"#).unwrap();
    assert_eq!(request.entity, "hash:user");
    assert_eq!(request.value, Value::Null);
    assert!(request.locals.is_none());
}

#[test]
fn test_resolve_request_full() {
    let request: ResolveRequest = serde_json::from_value(json!({
        "entity": "hash:user",
        "value": { "name": "Ada" },
        "locals": { "tenant": "t1" }
    }))
    .unwrap();
    assert_eq!(request.value, json!({ "name": "Ada" }));
    assert_eq!(request.locals, Some(json!({ "tenant": "t1" })));
}

#[test]
fn test_resolve_request_requires_entity() {
    assert!(serde_json::from_str::<ResolveRequest>(r#"{"value":{}}"#).is_err());
}

// =============================================================================
// RESOLVE RESPONSE TESTS
// =============================================================================

#[test]
fn test_resolve_response_success_omits_error() {
    let body = serde_json::to_value(ResolveResponse::success(json!({ "a": 1 }))).unwrap();
    assert_eq!(body, json!({ "success": true, "value": { "a": 1 } }));
}

#[test]
fn test_resolve_response_error_omits_value() {
    let body = serde_json::to_value(ResolveResponse::error("boom")).unwrap();
    assert_eq!(body, json!({ "success": false, "error": "boom" }));
}
