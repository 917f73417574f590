//! Read-only property endpoints.

use axum::extract::{Path, State};
use axum::Json;
use healthmon_core::published::PropertySnapshot;
use healthmon_core::wire::PropertyResponse;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/v1/properties -- every property, temperature and voltage taken
/// from a single sensor read.
pub async fn get_all(State(state): State<AppState>) -> Json<PropertySnapshot> {
    Json(state.published.snapshot())
}

/// GET /api/v1/properties/{name}
pub async fn get_one(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<PropertyResponse>> {
    let value = state
        .published
        .get(&name)
        .ok_or_else(|| AppError::UnknownProperty(name.clone()))?;

    tracing::debug!(property = %name, ?value, "Property read");
    Ok(Json(PropertyResponse { name, value }))
}
