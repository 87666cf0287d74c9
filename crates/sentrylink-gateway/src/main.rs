//! Sentrylink gateway binary.
//!
//! - WebSocket endpoint: /ws
//! - Ops endpoints: /healthz, /readyz, /metrics
//! - HTTP collaborator seam: POST /alerts/:id/acknowledge

use std::net::SocketAddr;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use sentrylink_gateway::push::HttpPushTransport;
use sentrylink_gateway::store::InMemoryStore;
use sentrylink_gateway::{app_state, config, lifecycle, router};

#[tokio::main]
async fn main() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config_path = std::env::var("SENTRYLINK_CONFIG").unwrap_or_else(|_| "sentrylink.yaml".to_string());
    let cfg = config::load_from_file(&config_path).expect("config load failed");
    let listen: SocketAddr = cfg.gateway.listen.parse().expect("gateway.listen must be a valid SocketAddr");

    let store = Arc::new(InMemoryStore::new());
    let push_transport = Arc::new(HttpPushTransport::new(cfg.push.provider_url.clone(), cfg.push.api_key.clone()));
    let state = app_state::AppState::new(cfg, store, push_transport);

    lifecycle::reconcile_on_boot(&state).await.expect("boot reconciliation failed");

    let app = router::build_router(state.clone()).into_make_service_with_connect_info::<SocketAddr>();

    tracing::info!(%listen, "sentrylink-gateway starting");
    let listener = tokio::net::TcpListener::bind(listen).await.expect("failed to bind");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(state))
        .await
        .expect("server failed");
}

async fn shutdown_signal(state: app_state::AppState) {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
    lifecycle::shutdown(&state).await;
}
