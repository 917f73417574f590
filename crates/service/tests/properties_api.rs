//! Integration tests for the health and property endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, get, scripted_state};
use healthmon_service::router::build_app;

// ---------------------------------------------------------------------------
// Test: GET /health reports the published identity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_identity() {
    let (_source, state) = scripted_state(&[]);
    let response = get(build_app(state), "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get("x-request-id").is_some());

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["bus_name"], "com.example.HardwareHealthMonitor");
    assert_eq!(json["object_path"], "/com/example/HealthMonitor");
    assert_eq!(json["interface"], "com.example.HealthMonitor");
    assert_eq!(json["version"], "1.0.0-prototype");
}

// ---------------------------------------------------------------------------
// Test: single-property reads reflect the live sensor value
// ---------------------------------------------------------------------------

#[tokio::test]
async fn property_reads_are_never_cached() {
    let (mut source, state) = scripted_state(&[71.5, 88.25]);
    let app = build_app(state);

    let json = body_json(get(app.clone(), "/api/v1/properties/Temperature").await).await;
    assert_eq!(json["name"], "Temperature");
    assert_eq!(json["value"], 65.0);

    source.update();
    let json = body_json(get(app.clone(), "/api/v1/properties/Temperature").await).await;
    assert_eq!(json["value"], 71.5);

    source.update();
    let json = body_json(get(app, "/api/v1/properties/Temperature").await).await;
    assert_eq!(json["value"], 88.25);
}

#[tokio::test]
async fn voltage_and_version_properties() {
    let (_source, state) = scripted_state(&[]);
    let app = build_app(state);

    let voltage = body_json(get(app.clone(), "/api/v1/properties/Voltage").await).await;
    assert_eq!(voltage["value"], 1.1);

    let version = body_json(get(app, "/api/v1/properties/Version").await).await;
    assert_eq!(version["value"], "1.0.0-prototype");
}

// ---------------------------------------------------------------------------
// Test: GET /api/v1/properties returns one consistent snapshot
// ---------------------------------------------------------------------------

#[tokio::test]
async fn all_properties_snapshot() {
    let (mut source, state) = scripted_state(&[90.0]);
    source.update();

    let response = get(build_app(state), "/api/v1/properties").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["Temperature"], 90.0);
    assert_eq!(json["Voltage"], 1.1);
    assert_eq!(json["Version"], "1.0.0-prototype");
}

// ---------------------------------------------------------------------------
// Test: unknown properties and routes return 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_property_returns_404_json() {
    let (_source, state) = scripted_state(&[]);
    let response = get(build_app(state), "/api/v1/properties/Humidity").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNKNOWN_PROPERTY");
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (_source, state) = scripted_state(&[]);
    let response = get(build_app(state), "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
