#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use healthmon_core::published::PublishedState;
use healthmon_core::reading::ServiceIdentity;
use healthmon_core::sensor::{ScriptedModel, SensorSource};
use healthmon_events::EventChannel;
use healthmon_service::config::ServiceConfig;
use healthmon_service::state::AppState;
use tokio_util::sync::CancellationToken;

/// Build a test `ServiceConfig` bound to an ephemeral loopback port.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        ..ServiceConfig::default()
    }
}

/// Build application state over a scripted sensor without starting any
/// background loops, so the test drives `source.update()` itself.
pub fn scripted_state(temperatures: &[f64]) -> (SensorSource, AppState) {
    let source = SensorSource::new(ScriptedModel::new(temperatures.iter().copied()));
    let state = AppState {
        published: PublishedState::new(source.handle(), ServiceIdentity::default()),
        channel: Arc::new(EventChannel::default()),
        config: Arc::new(test_config()),
        shutdown: CancellationToken::new(),
    };
    (source, state)
}

/// Send a GET request through the router.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Serve `app` on an ephemeral loopback port and return its address.
pub async fn spawn_server(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}
