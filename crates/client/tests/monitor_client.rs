//! End-to-end tests of the client against a live service router.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;
use axum::routing::get;
use axum::{Json, Router};
use healthmon_client::alerts;
use healthmon_client::poller::{poll_once, PropertyStatus};
use healthmon_client::proxy::ServiceProxy;
use healthmon_client::{ClientConfig, ClientError, MonitorClient, PollFailurePolicy};
use healthmon_core::names::{
    BUS_NAME, OBJECT_PATH, SERVICE_INTERFACE, SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED,
};
use healthmon_core::threshold::ThresholdEvent;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use common::TestService;

const TIMEOUT: Duration = Duration::from_secs(1);

// ---------------------------------------------------------------------------
// Connect and read properties
// ---------------------------------------------------------------------------

#[tokio::test]
async fn connect_reports_service_identity() {
    let service = TestService::start(&[]).await;

    let proxy = ServiceProxy::connect(&service.url(), TIMEOUT).await.unwrap();
    assert_eq!(proxy.identity().bus_name, BUS_NAME);
    assert_eq!(proxy.identity().version, "1.0.0-prototype");
}

#[tokio::test]
async fn poll_reads_live_properties() {
    let mut service = TestService::start(&[72.0, 90.0]).await;
    let proxy = ServiceProxy::connect(&service.url(), TIMEOUT).await.unwrap();

    assert_eq!(
        poll_once(&proxy).await.unwrap(),
        PropertyStatus {
            temperature: 65.0,
            voltage: 1.1,
            version: "1.0.0-prototype".into(),
        }
    );

    service.source.update();
    assert_eq!(proxy.temperature().await.unwrap(), 72.0);

    service.source.update();
    let snapshot = proxy.snapshot().await.unwrap();
    assert_eq!(snapshot.temperature, 90.0);
    assert_eq!(snapshot.voltage, 1.1);
}

#[tokio::test]
async fn connect_to_closed_port_is_a_connection_error() {
    let addr = common::closed_addr().await;
    let config = ClientConfig::new(&format!("http://{addr}")).unwrap();

    assert_matches!(
        MonitorClient::connect(config).await,
        Err(ClientError::Connection(_))
    );
}

#[tokio::test]
async fn connect_rejects_a_different_service() {
    let app = Router::new().route(
        "/health",
        get(|| async {
            Json(json!({
                "status": "ok",
                "bus_name": "com.example.SomethingElse",
                "interface": "com.example.SomethingElse",
                "object_path": "/",
                "version": "0.1.0",
            }))
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    assert_matches!(
        ServiceProxy::connect(&format!("http://{addr}"), TIMEOUT).await,
        Err(ClientError::Connection(msg)) if msg.contains("SomethingElse")
    );
}

#[tokio::test]
async fn connect_to_silent_service_times_out() {
    let addr = common::silent_addr().await;

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        ServiceProxy::connect(&format!("http://{addr}"), Duration::from_millis(300)),
    )
    .await
    .expect("connect must give up on its own");
    assert_matches!(result, Err(ClientError::Connection(_)));

    let mut config = ClientConfig::new(&format!("http://{addr}")).unwrap();
    config.request_timeout = Duration::from_millis(300);
    let signals = tokio::time::timeout(
        Duration::from_secs(5),
        alerts::connect(&config.signals_url(), config.request_timeout),
    )
    .await
    .expect("handshake must give up on its own");
    assert_matches!(signals, Err(ClientError::Connection(_)));
}

#[tokio::test]
async fn hanging_property_read_fails_the_poll() {
    let app = Router::new()
        .route(
            "/health",
            get(|| async {
                Json(json!({
                    "status": "ok",
                    "bus_name": BUS_NAME,
                    "interface": SERVICE_INTERFACE,
                    "object_path": OBJECT_PATH,
                    "version": "1.0.0-prototype",
                }))
            }),
        )
        .route(
            "/api/v1/properties/{name}",
            get(|| std::future::pending::<Json<serde_json::Value>>()),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let proxy = ServiceProxy::connect(&format!("http://{addr}"), Duration::from_millis(300))
        .await
        .unwrap();
    let result = tokio::time::timeout(Duration::from_secs(5), poll_once(&proxy))
        .await
        .expect("poll must give up on its own");
    assert_matches!(result, Err(ClientError::Connection(_)));
}

// ---------------------------------------------------------------------------
// Alerts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn subscribe_returns_once_attached() {
    let service = TestService::start(&[]).await;
    let mut client = MonitorClient::connect(service.client_config(PollFailurePolicy::Shutdown))
        .await
        .unwrap();

    client.subscribe().await.unwrap();
    assert_eq!(
        service
            .channel()
            .subscriber_count(SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED)
            .await,
        1
    );
}

#[tokio::test]
async fn subscribed_client_receives_alerts_and_skips_malformed_events() {
    let service = TestService::start(&[]).await;

    let mut client = MonitorClient::connect(service.client_config(PollFailurePolicy::Shutdown))
        .await
        .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.on_alert(move |event: &ThresholdEvent| {
        let _ = tx.send(event.current_temp);
    });
    client.subscribe().await.unwrap();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(client.run(cancel.clone()));

    for payload in [
        json!({"temp": 99.0}),
        ThresholdEvent::new(86.0).to_payload(),
        json!({"current_temp": "hot"}),
        ThresholdEvent::new(88.5).to_payload(),
    ] {
        service
            .channel()
            .publish(SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED, payload)
            .await;
    }

    let mut received = Vec::new();
    for _ in 0..2 {
        let temp = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("alert should arrive")
            .unwrap();
        received.push(temp);
    }
    assert_eq!(received, vec![86.0, 88.5]);
    assert!(!task.is_finished(), "malformed events must not stop the client");

    cancel.cancel();
    assert_matches!(task.await.unwrap(), Ok(()));
}

#[tokio::test]
async fn events_before_subscribe_are_not_delivered() {
    let service = TestService::start(&[]).await;
    service
        .channel()
        .publish(
            SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED,
            ThresholdEvent::new(90.0).to_payload(),
        )
        .await;

    let mut client = MonitorClient::connect(service.client_config(PollFailurePolicy::Shutdown))
        .await
        .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.on_alert(move |event: &ThresholdEvent| {
        let _ = tx.send(event.current_temp);
    });
    client.subscribe().await.unwrap();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(client.run(cancel.clone()));

    service
        .channel()
        .publish(
            SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED,
            ThresholdEvent::new(87.0).to_payload(),
        )
        .await;

    let first = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("alert should arrive")
        .unwrap();
    assert_eq!(first, 87.0);

    cancel.cancel();
    task.await.unwrap().unwrap();
}

// ---------------------------------------------------------------------------
// Poll-failure policies
// ---------------------------------------------------------------------------

#[tokio::test]
async fn shutdown_policy_stops_client_when_service_goes_away() {
    let service = TestService::start(&[]).await;
    let mut client = MonitorClient::connect(service.client_config(PollFailurePolicy::Shutdown))
        .await
        .unwrap();
    client.subscribe().await.unwrap();

    let task = tokio::spawn(client.run(CancellationToken::new()));
    service.stop().await;

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("client should stop on its own")
        .unwrap();
    assert_matches!(result, Err(ClientError::Connection(_)));
}

#[tokio::test]
async fn stop_policy_keeps_client_alive_after_losing_service() {
    let service = TestService::start(&[]).await;
    let mut client = MonitorClient::connect(service.client_config(PollFailurePolicy::Stop))
        .await
        .unwrap();
    client.subscribe().await.unwrap();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(client.run(cancel.clone()));
    service.stop().await;

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(!task.is_finished());

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("client should stop when cancelled")
        .unwrap();
    assert_matches!(result, Ok(()));
}

#[tokio::test]
async fn reconnect_policy_retries_until_cancelled() {
    let service = TestService::start(&[]).await;
    let mut client = MonitorClient::connect(service.client_config(PollFailurePolicy::Reconnect))
        .await
        .unwrap();
    client.subscribe().await.unwrap();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(client.run(cancel.clone()));
    service.stop().await;

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert!(!task.is_finished());

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("client should stop when cancelled")
        .unwrap();
    assert_matches!(result, Ok(()));
}

#[tokio::test]
async fn reconnect_policy_resubscribes_after_service_restart() {
    let service = TestService::start(&[]).await;
    let addr = service.addr;
    let mut client = MonitorClient::connect(service.client_config(PollFailurePolicy::Reconnect))
        .await
        .unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    client.on_alert(move |event: &ThresholdEvent| {
        let _ = tx.send(event.current_temp);
    });
    client.subscribe().await.unwrap();

    let cancel = CancellationToken::new();
    let task = tokio::spawn(client.run(cancel.clone()));
    service.stop().await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    let restarted = TestService::start_on(addr, &[]).await;
    restarted.wait_for_subscribers(1).await;

    restarted
        .channel()
        .publish(
            SIGNAL_TEMPERATURE_THRESHOLD_EXCEEDED,
            ThresholdEvent::new(91.0).to_payload(),
        )
        .await;
    let temp = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("alert should arrive after the restart")
        .unwrap();
    assert_eq!(temp, 91.0);
    assert!(!task.is_finished());

    cancel.cancel();
    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("client should stop when cancelled")
        .unwrap();
    assert_matches!(result, Ok(()));
}

#[tokio::test]
async fn poller_alone_fails_fast_without_subscription() {
    let service = TestService::start(&[]).await;
    let client = MonitorClient::connect(service.client_config(PollFailurePolicy::Shutdown))
        .await
        .unwrap();

    let task = tokio::spawn(client.run(CancellationToken::new()));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(!task.is_finished());

    service.stop().await;

    let result = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("poller failure should stop the client")
        .unwrap();
    assert_matches!(result, Err(ClientError::Connection(_)));
}
