//! End-to-end scenarios exercising the WS router and HTTP ops surface
//! together, one test per lettered scenario in the testable-properties
//! section of the design doc. Uses `axum-test`'s `ws` feature the same
//! way `groblegark-coop`'s `crates/mux/tests/http.rs` drives its HTTP
//! surface with a `TestServer`, generalized here to WebSocket upgrades.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum_test::TestServer;
use chrono::Utc;
use serde_json::{json, Value};

use sentrylink_core::domain::{
    AlertPreferences, Device, DeviceId, Hub, HubApiKeyRecord, HubStatus, Platform, User,
    UserId, UserStatus, UserTokenRecord,
};
use sentrylink_gateway::app_state::AppState;
use sentrylink_gateway::config::{
    GatewayConfig, GatewaySection, PushSection, RateLimitClass, RateLimitsSection, StoreSection,
};
use sentrylink_gateway::push::PushTransport;
use sentrylink_gateway::store::{InMemoryStore, Store};
use sentrylink_gateway::{auth, lifecycle, router};

fn base_config() -> GatewayConfig {
    GatewayConfig {
        version: 1,
        gateway: GatewaySection {
            listen: "127.0.0.1:0".into(),
            heartbeat_timeout_ms: 30_000,
            reconnect_grace_period_ms: 5_000,
            alert_loop_interval_ms: 10_000,
            alert_loop_max: 30,
            log_retention_days: 7,
            device_failure_threshold: 3,
        },
        rate_limits: RateLimitsSection::default(),
        push: PushSection::default(),
        store: StoreSection::default(),
    }
}

#[derive(Default)]
struct RecordingTransport {
    calls: Mutex<Vec<(String, String, bool)>>,
}

impl RecordingTransport {
    fn calls(&self) -> Vec<(String, String, bool)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushTransport for RecordingTransport {
    async fn send(
        &self,
        _device: &Device,
        title: &str,
        body: &str,
        _sound: Option<&str>,
        critical: bool,
    ) -> Result<(), String> {
        self.calls.lock().unwrap().push((title.to_string(), body.to_string(), critical));
        Ok(())
    }
}

struct Fixture {
    state: AppState,
    store: Arc<InMemoryStore>,
    push: Arc<RecordingTransport>,
}

fn build_fixture(cfg: GatewayConfig) -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let push = Arc::new(RecordingTransport::default());
    let state = AppState::new(cfg, store.clone(), push.clone());
    Fixture { state, store, push }
}

fn test_server(state: AppState) -> TestServer {
    let app = router::build_router(state);
    TestServer::new(app).expect("failed to create test server")
}

async fn seed_user(store: &InMemoryStore, token: &str, life_or_death: bool) -> User {
    let user = User {
        id: UserId::new(),
        email: "alice@example.com".into(),
        username: "alice".into(),
        password_hash: "unused".into(),
        status: UserStatus::Active,
        token: UserTokenRecord {
            hash: auth::hash_credential(token),
            last6_hint: auth::last6_hint(token),
            created_at: Utc::now(),
        },
        prefs: AlertPreferences { life_or_death_mode: life_or_death, ..Default::default() },
    };
    store.put_user(user.clone()).await.unwrap();
    user
}

async fn seed_hub(store: &InMemoryStore, key: &str) -> Hub {
    let hub = Hub {
        id: sentrylink_core::domain::HubId::new(),
        name: "Test Hub".into(),
        slug: "test-hub".into(),
        owner_email: "owner@example.com".into(),
        api_key: HubApiKeyRecord { hash: auth::hash_credential(key), hint: key[key.len() - 4..].to_string() },
        status: HubStatus::Approved,
        total_connections: 0,
    };
    store.put_hub(hub.clone()).await.unwrap();
    hub
}

async fn seed_web_device(store: &InMemoryStore, user_id: UserId) -> Device {
    let device = Device {
        id: DeviceId::new(),
        user_id,
        push_token: "web-push-token".into(),
        platform: Platform::Web,
        active: true,
        last_seen: Utc::now(),
        failed_attempts: 0,
        last_fail_reason: None,
    };
    store.put_device(device.clone()).await.unwrap();
    device
}

fn connect_frame(hub_key: &str, user_token: &str) -> Value {
    json!({
        "type": "connect",
        "hubKey": hub_key,
        "userToken": user_token,
        "gameInfo": {"name": "G", "placeId": 1, "jobId": "job-1"},
    })
}

#[tokio::test]
async fn scenario_a_clean_session_lifecycle() {
    let mut cfg = base_config();
    cfg.gateway.heartbeat_timeout_ms = 30_000;
    let fx = build_fixture(cfg);
    let user = seed_user(&fx.store, "ABC234", false).await;
    let hub = seed_hub(&fx.store, "hub_live_abc123").await;
    let server = test_server(fx.state.clone());

    let mut producer = server.get_websocket("/ws").await.into_websocket().await;
    let _connected: Value = producer.receive_json().await;

    producer.send_json(&connect_frame("hub_live_abc123", "ABC234")).await;
    let authed: Value = producer.receive_json().await;
    assert_eq!(authed["type"], "authenticated");
    let session_id = authed["sessionId"].as_str().unwrap().to_string();

    let mut consumer = server.get_websocket("/ws").await.into_websocket().await;
    let _connected: Value = consumer.receive_json().await;
    consumer.send_json(&json!({"type": "authenticate", "token": user.id.to_string()})).await;
    let consumer_authed: Value = consumer.receive_json().await;
    assert_eq!(consumer_authed["type"], "authenticated");

    producer.send_json(&json!({"type": "status", "status": "Farming"})).await;
    let update: Value = consumer.receive_json().await;
    assert_eq!(update["type"], "status_update");
    assert_eq!(update["status"], "Farming");
    assert_eq!(update["sessionId"], session_id);

    producer.send_json(&json!({"type": "disconnect", "reason": "done"})).await;
    let ended: Value = consumer.receive_json().await;
    assert_eq!(ended["type"], "session_ended");
    assert_eq!(ended["reason"], "manual");

    let ack: Value = producer.receive_json().await;
    assert_eq!(ack["type"], "disconnected");
    assert_eq!(ack["sessionId"], session_id);

    let stored = fx
        .store
        .get_session(session_id.parse::<uuid::Uuid>().unwrap().into())
        .await
        .unwrap()
        .unwrap();
    assert!(!stored.is_active());
    assert!(matches!(stored.disconnect_reason, Some(sentrylink_core::domain::DisconnectReason::Manual)));

    let hub_after = fx.store.get_hub(hub.id).await.unwrap().unwrap();
    assert_eq!(hub_after.total_connections, 1);
}

#[tokio::test]
async fn scenario_b_timeout_triggers_critical_alert() {
    let mut cfg = base_config();
    cfg.gateway.heartbeat_timeout_ms = 150;
    let fx = build_fixture(cfg);
    let user = seed_user(&fx.store, "ABC234", false).await;
    seed_hub(&fx.store, "hub_live_abc123").await;
    let server = test_server(fx.state.clone());

    let mut producer = server.get_websocket("/ws").await.into_websocket().await;
    let _connected: Value = producer.receive_json().await;
    producer.send_json(&connect_frame("hub_live_abc123", "ABC234")).await;
    let authed: Value = producer.receive_json().await;
    let session_id: uuid::Uuid = authed["sessionId"].as_str().unwrap().parse().unwrap();

    producer.send_json(&json!({"type": "status", "status": "Farming"})).await;

    tokio::time::sleep(Duration::from_millis(400)).await;

    let session = fx.store.get_session(session_id.into()).await.unwrap().unwrap();
    assert_eq!(session.status, sentrylink_core::domain::SessionStatus::Timeout);
    assert!(matches!(session.disconnect_reason, Some(sentrylink_core::domain::DisconnectReason::Timeout)));
    assert!(session.alert.sent);

    let logs = fx.store.list_recent_session_logs(user.id, 10).await.unwrap();
    assert!(logs.iter().any(|l| matches!(l.level, sentrylink_core::domain::LogLevel::Error)
        && l.message.contains("Heartbeat timeout")));

    let calls = fx.push.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].2, "timeout push must be marked critical");
}

#[tokio::test]
async fn scenario_c_life_or_death_loop_and_acknowledgement() {
    let mut cfg = base_config();
    cfg.gateway.heartbeat_timeout_ms = 120;
    cfg.gateway.alert_loop_interval_ms = 150;
    let fx = build_fixture(cfg);
    let user = seed_user(&fx.store, "ABC234", true).await;
    seed_hub(&fx.store, "hub_live_abc123").await;
    seed_web_device(&fx.store, user.id).await;
    let server = test_server(fx.state.clone());

    let mut producer = server.get_websocket("/ws").await.into_websocket().await;
    let _connected: Value = producer.receive_json().await;
    producer.send_json(&connect_frame("hub_live_abc123", "ABC234")).await;
    let _authed: Value = producer.receive_json().await;

    tokio::time::sleep(Duration::from_millis(350)).await;

    let alert = fx
        .store
        .find_unacknowledged_alert_for_user(user.id)
        .await
        .unwrap()
        .expect("life-or-death alert should have been opened");
    assert!(alert.notifications_sent >= 2);

    let calls = fx.push.calls();
    let second = calls.iter().find(|(_, body, _)| body.contains("ALERT 2/30:"));
    assert!(second.is_some(), "expected a second repeat notification with the 2/30 prefix, got {calls:?}");

    let resp = server.post(&format!("/alerts/{}/acknowledge", alert.id)).await;
    resp.assert_status_ok();
    let body: Value = resp.json();
    assert_eq!(body["acknowledged"], true);

    let calls_at_ack = fx.push.calls().len();
    tokio::time::sleep(Duration::from_millis(350)).await;
    assert_eq!(fx.push.calls().len(), calls_at_ack, "no further pushes once acknowledged");

    let reloaded = fx.store.get_active_alert(alert.id).await.unwrap().unwrap();
    assert!(reloaded.acknowledged);
}

#[tokio::test]
async fn scenario_d_rate_limit() {
    let mut cfg = base_config();
    cfg.rate_limits = RateLimitsSection {
        status: RateLimitClass { max: 6, window_ms: 300 },
        ..RateLimitsSection::default()
    };
    let fx = build_fixture(cfg);
    let user = seed_user(&fx.store, "ABC234", false).await;
    seed_hub(&fx.store, "hub_live_abc123").await;
    let server = test_server(fx.state.clone());

    let mut producer = server.get_websocket("/ws").await.into_websocket().await;
    let _connected: Value = producer.receive_json().await;
    producer.send_json(&connect_frame("hub_live_abc123", "ABC234")).await;
    let _authed: Value = producer.receive_json().await;

    let mut consumer = server.get_websocket("/ws").await.into_websocket().await;
    let _connected: Value = consumer.receive_json().await;
    consumer.send_json(&json!({"type": "authenticate", "token": user.id.to_string()})).await;
    let _consumer_authed: Value = consumer.receive_json().await;

    for i in 0..6 {
        producer.send_json(&json!({"type": "status", "status": format!("S{i}")})).await;
    }
    producer.send_json(&json!({"type": "status", "status": "S6-rejected"})).await;

    for i in 0..6 {
        let update: Value = consumer.receive_json().await;
        assert_eq!(update["status"], format!("S{i}"));
    }

    let err: Value = producer.receive_json().await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "RATE_LIMITED");

    tokio::time::sleep(Duration::from_millis(350)).await;
    producer.send_json(&json!({"type": "status", "status": "S-after-window"})).await;
    let update: Value = consumer.receive_json().await;
    assert_eq!(update["status"], "S-after-window");
}

#[tokio::test]
async fn scenario_e_consumer_command_authorization() {
    let cfg = base_config();
    let fx = build_fixture(cfg);
    let user_a = seed_user(&fx.store, "AAA111", false).await;
    let user_b = seed_user(&fx.store, "BBB222", false).await;
    seed_hub(&fx.store, "hub_live_abc123").await;
    let server = test_server(fx.state.clone());

    let mut producer_b = server.get_websocket("/ws").await.into_websocket().await;
    let _connected: Value = producer_b.receive_json().await;
    producer_b.send_json(&connect_frame("hub_live_abc123", "BBB222")).await;
    let authed_b: Value = producer_b.receive_json().await;
    let session_b = authed_b["sessionId"].as_str().unwrap().to_string();

    let mut consumer_a = server.get_websocket("/ws").await.into_websocket().await;
    let _connected: Value = consumer_a.receive_json().await;
    consumer_a.send_json(&json!({"type": "authenticate", "token": user_a.id.to_string()})).await;
    let _authed_a: Value = consumer_a.receive_json().await;

    consumer_a
        .send_json(&json!({"type": "command", "sessionId": session_b, "command": "stop"}))
        .await;
    let err: Value = consumer_a.receive_json().await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "SESSION_NOT_FOUND");

    let nothing = tokio::time::timeout(Duration::from_millis(200), producer_b.receive_message()).await;
    assert!(nothing.is_err(), "producer for another user's session must not receive the command");

    let _ = user_b;
}

#[tokio::test]
async fn unknown_frame_type_yields_invalid_message_error() {
    let cfg = base_config();
    let fx = build_fixture(cfg);
    let server = test_server(fx.state.clone());

    let mut producer = server.get_websocket("/ws").await.into_websocket().await;
    let _connected: Value = producer.receive_json().await;

    producer.send_json(&json!({"type": "frobnicate", "whatever": 1})).await;
    let err: Value = producer.receive_json().await;
    assert_eq!(err["type"], "error");
    assert_eq!(err["code"], "INVALID_MESSAGE");
}

#[tokio::test]
async fn reconnect_cancels_prior_grace_timer_instead_of_leaking_a_timeout() {
    let mut cfg = base_config();
    cfg.gateway.heartbeat_timeout_ms = 30_000;
    cfg.gateway.reconnect_grace_period_ms = 100_000;
    let fx = build_fixture(cfg);
    seed_user(&fx.store, "ABC234", false).await;
    let hub = seed_hub(&fx.store, "hub_live_abc123").await;
    let server = test_server(fx.state.clone());

    let mut producer = server.get_websocket("/ws").await.into_websocket().await;
    let _connected: Value = producer.receive_json().await;
    producer.send_json(&connect_frame("hub_live_abc123", "ABC234")).await;
    let authed: Value = producer.receive_json().await;
    let session_id: uuid::Uuid = authed["sessionId"].as_str().unwrap().parse().unwrap();

    // Abrupt close (not a clean disconnect) starts a long grace timer for
    // the first connection's client id instead of tearing the session down.
    producer.close().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    // Reconnect on a fresh socket/client id before the grace window elapses.
    let mut producer2 = server.get_websocket("/ws").await.into_websocket().await;
    let _connected: Value = producer2.receive_json().await;
    producer2.send_json(&connect_frame("hub_live_abc123", "ABC234")).await;
    let authed2: Value = producer2.receive_json().await;
    let session_id2: uuid::Uuid = authed2["sessionId"].as_str().unwrap().parse().unwrap();
    assert_eq!(session_id2, session_id, "reconnect reactivates the same session record");

    // The prior grace timer (100s) must have been cancelled rather than
    // left to fire a stale timeout against the new, now-active session.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let session = fx.store.get_session(session_id.into()).await.unwrap().unwrap();
    assert!(session.is_active(), "reconnect must cancel the old grace timer, not let it fire");

    let hub_after = fx.store.get_hub(hub.id).await.unwrap().unwrap();
    assert_eq!(hub_after.total_connections, 2);
}

#[tokio::test]
async fn scenario_f_startup_reconciliation() {
    let cfg = base_config();
    let fx = build_fixture(cfg);
    let user = seed_user(&fx.store, "ABC234", false).await;
    let hub = seed_hub(&fx.store, "hub_live_abc123").await;
    let mut hub_with_count = hub.clone();
    hub_with_count.total_connections = 5;
    fx.store.put_hub(hub_with_count).await.unwrap();

    let orphaned = sentrylink_core::domain::Session {
        id: sentrylink_core::domain::SessionId::new(),
        user_id: user.id,
        hub_id: hub.id,
        client_id: sentrylink_core::domain::ClientId::new(),
        game: sentrylink_core::domain::GameInfo {
            name: "G".into(),
            place_id: 1,
            job_id: "j".into(),
            executor: None,
        },
        current_status: "Farming".into(),
        connected_at: Utc::now(),
        last_heartbeat_at: Utc::now(),
        status: sentrylink_core::domain::SessionStatus::Active,
        disconnected_at: None,
        disconnect_reason: None,
        disconnect_message: None,
        alert: sentrylink_core::domain::AlertOutcome::default(),
    };
    fx.store.put_session(orphaned.clone()).await.unwrap();

    lifecycle::reconcile_on_boot(&fx.state).await.unwrap();

    let reconciled = fx.store.get_session(orphaned.id).await.unwrap().unwrap();
    assert!(!reconciled.is_active());
    assert!(matches!(
        reconciled.disconnect_reason,
        Some(sentrylink_core::domain::DisconnectReason::ServerShutdown)
    ));

    let hub_after = fx.store.get_hub(hub.id).await.unwrap().unwrap();
    assert_eq!(hub_after.total_connections, 5);
}

#[tokio::test]
async fn ops_endpoints_report_health_and_metrics() {
    let cfg = base_config();
    let fx = build_fixture(cfg);
    let server = test_server(fx.state.clone());

    server.get("/healthz").await.assert_status_ok();
    server.get("/readyz").await.assert_status_ok();

    let resp = server.get("/metrics").await;
    resp.assert_status_ok();
    let body = resp.text();
    assert!(body.contains("sentrylink_"));
}

#[tokio::test]
async fn acknowledge_unknown_alert_returns_404() {
    let cfg = base_config();
    let fx = build_fixture(cfg);
    let server = test_server(fx.state.clone());

    let resp = server
        .post(&format!("/alerts/{}/acknowledge", uuid::Uuid::new_v4()))
        .await;
    resp.assert_status(axum::http::StatusCode::NOT_FOUND);
}
