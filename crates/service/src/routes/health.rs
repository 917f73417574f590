use axum::extract::State;
use axum::{routing::get, Json, Router};
use healthmon_core::names::{BUS_NAME, OBJECT_PATH, SERVICE_INTERFACE};
use healthmon_core::wire::HealthResponse;

use crate::state::AppState;

/// GET /health -- liveness plus the published service identity.
///
/// Clients use it as the reachability probe before subscribing.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        bus_name: BUS_NAME.into(),
        interface: SERVICE_INTERFACE.into(),
        object_path: OBJECT_PATH.into(),
        version: state.published.version().into(),
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
