//! # API Endpoint Handlers

use super::{
    AppState,
    types::{EntitiesResponse, HealthResponse, ResolveRequest, ResolveResponse},
};
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use hashpoint_core::{EntityId, HashpointError, ResolveOptions};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// ENTITIES HANDLER
// =============================================================================

/// List registered entity ids.
pub async fn entities_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ids = state
        .engine
        .registry()
        .ids()
        .map(|id| id.as_str().to_string())
        .collect();
    Json(EntitiesResponse::new(ids))
}

// =============================================================================
// RESOLVE HANDLER
// =============================================================================

/// HTTP status for a failed resolution.
pub fn status_for_error(error: &HashpointError) -> StatusCode {
    match error {
        HashpointError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        HashpointError::EntityNotFound(_) | HashpointError::UnsupportedEntityType(_) => {
            StatusCode::NOT_FOUND
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Resolve a value through an entity.
pub async fn resolve_handler(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> impl IntoResponse {
    if request.entity.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ResolveResponse::error("entity must not be empty")),
        );
    }

    let id = EntityId::new(request.entity);
    let options = request
        .locals
        .map(ResolveOptions::with_locals)
        .unwrap_or_default();

    match state.engine.resolve(&id, request.value, options).await {
        Ok(accumulator) => (
            StatusCode::OK,
            Json(ResolveResponse::success(accumulator.value)),
        ),
        Err(e) => {
            let status = status_for_error(&e);
            tracing::debug!(entity = %id, status = status.as_u16(), error = %e, "resolve failed");
            (status, Json(ResolveResponse::error(e.to_string())))
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
