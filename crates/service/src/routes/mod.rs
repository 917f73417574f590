pub mod health;
pub mod properties;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /properties           GET  all properties, one consistent sensor read
/// /properties/{name}    GET  one property, fresh read per call
/// /signals              GET  WebSocket upgrade, signal stream
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/properties", get(properties::get_all))
        .route("/properties/{name}", get(properties::get_one))
        .route("/signals", get(ws::signals_handler))
}
