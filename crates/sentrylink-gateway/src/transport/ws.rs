//! WebSocket handler (spec §4.1/§5).
//!
//! Responsibilities:
//! - Upgrade HTTP -> WS, register the socket, announce `connected`
//! - Split socket: writer task drains an mpsc queue, read loop decodes
//!   and dispatches (same split-and-writer-task shape as the teacher's
//!   `transport/ws.rs`)
//! - On abrupt close of an authenticated producer, start the reconnect
//!   grace window instead of tearing the session down immediately
//!   (spec §4.1 "Socket close")

use std::net::SocketAddr;

use axum::extract::{ws::WebSocket, ws::WebSocketUpgrade, ConnectInfo, State};
use axum::response::IntoResponse;
use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Duration;

use sentrylink_core::domain::{ClientId, ClientInfo, ClientRole};
use sentrylink_core::protocol::outbound;

use crate::app_state::AppState;
use crate::router;
use crate::transport::codec::{self, Decoded};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
const OUTBOUND_QUEUE_DEPTH: usize = 256;

pub async fn ws_upgrade(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(state, addr, socket))
}

async fn handle_socket(state: AppState, addr: SocketAddr, socket: WebSocket) {
    let client_id = ClientId::new();
    let span = tracing::info_span!("ws_client", client = %client_id, peer = %addr.ip());
    let _enter = span.enter();

    let (mut ws_tx, mut ws_rx) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel(OUTBOUND_QUEUE_DEPTH);

    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            if ws_tx.send(msg).await.is_err() {
                break;
            }
        }
    });

    let info = ClientInfo::new(client_id, Some(addr.ip()), Utc::now());
    state.registry().register(out_tx.clone(), info);
    state.metrics().ws_connections_total.inc(&[]);
    let _ = out_tx
        .send(axum::extract::ws::Message::Text(
            outbound::connected(&client_id.to_string(), SERVER_VERSION, Utc::now()).to_string(),
        ))
        .await;

    loop {
        match ws_rx.next().await {
            Some(Ok(msg)) => match codec::decode(msg) {
                Ok(Decoded::Frame(frame)) => router::dispatch(&state, client_id, frame).await,
                Ok(Decoded::Ping(v)) => {
                    let _ = out_tx.try_send(axum::extract::ws::Message::Pong(v));
                }
                Ok(Decoded::Pong(_)) => {}
                Ok(Decoded::Close) => break,
                Err(err) => {
                    tracing::debug!(code = err.client_code().as_str(), "decode failed");
                    state.metrics().decode_errors_total.inc(&[]);
                    state.registry().send_to(
                        client_id,
                        &outbound::error(err.client_code(), err.client_message()),
                    );
                }
            },
            Some(Err(_)) | None => break,
        }
    }

    tracing::info!("socket closed");
    on_close(&state, client_id).await;
    writer.abort();
}

/// Abrupt close of an authenticated producer starts the reconnect grace
/// window rather than an immediate timeout; everything else is torn down
/// right away.
async fn on_close(state: &AppState, client_id: ClientId) {
    let Some(info) = state.registry().info(client_id) else { return };

    if info.authenticated && matches!(info.role, ClientRole::Producer) {
        if let Some(session_id) = info.session_id {
            if let Some(user_id) = info.user_id {
                state.registry().fan_out_to_consumers(
                    user_id,
                    &outbound::session_connection_lost(&session_id.to_string(), Utc::now()),
                );
            }
        }
        let grace = Duration::from_millis(state.cfg().gateway.reconnect_grace_period_ms);
        state.watchdog().grace_close(client_id, grace);
        return;
    }

    state.watchdog().stop(client_id);
    state.registry().remove(client_id);
}
