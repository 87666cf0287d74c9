//! Message Router (WS hub, spec §4.1) — the busiest component: role/auth
//! checks, rate limiting, dispatch by typed tag, and peer-role isolation.
//! Axum wiring itself stays as small as the teacher's own `router.rs`
//! (`build_router`); all the size lives in `dispatch` and its submodules.

pub mod consumer;
pub mod producer;
pub mod registry;
pub mod watchdog_sink;

use axum::routing::{get, post};
use axum::Router;

use sentrylink_core::domain::{ClientId, ClientInfo, ClientRole};
use sentrylink_core::error::{Result, SentrylinkError};
use sentrylink_core::protocol::{outbound, Inbound};

use crate::app_state::AppState;
use crate::ratelimit::MessageClass;
use crate::{obs, transport};

fn require_producer(info: &ClientInfo) -> Result<()> {
    if !info.authenticated {
        return Err(SentrylinkError::NotAuthenticated);
    }
    if !matches!(info.role, ClientRole::Producer) {
        return Err(SentrylinkError::InvalidMessage("producer-only message".into()));
    }
    Ok(())
}

fn require_consumer(info: &ClientInfo) -> Result<()> {
    if !info.authenticated {
        return Err(SentrylinkError::NotAuthenticated);
    }
    if !matches!(info.role, ClientRole::Consumer) {
        return Err(SentrylinkError::InvalidMessage("consumer-only message".into()));
    }
    Ok(())
}

/// Dispatch one decoded frame for `client_id`. Errors are turned into the
/// standard `{type:"error",...}` frame and sent back to the same socket;
/// the caller (transport layer) decides whether an auth failure should
/// also close the socket.
pub async fn dispatch(state: &AppState, client_id: ClientId, msg: Inbound) {
    let Some(info) = state.registry().info(client_id) else { return };

    let result = route(state, client_id, &info, msg).await;
    if let Err(err) = result {
        state
            .registry()
            .send_to(client_id, &outbound::error(err.client_code(), err.client_message()));
        if matches!(
            err,
            SentrylinkError::InvalidHubKey
                | SentrylinkError::HubNotApproved
                | SentrylinkError::HubSuspended
                | SentrylinkError::InvalidUserToken
                | SentrylinkError::UserSuspended
        ) {
            state.registry().close(client_id);
        }
    }
}

async fn route(state: &AppState, client_id: ClientId, info: &ClientInfo, msg: Inbound) -> Result<()> {
    match msg {
        Inbound::Connect { hub_key, user_token, game_info } => {
            if info.authenticated {
                return Err(SentrylinkError::InvalidMessage("already authenticated".into()));
            }
            producer::handle_connect(state, client_id, &hub_key, &user_token, game_info).await
        }
        Inbound::Authenticate { token } => {
            if info.authenticated {
                return Err(SentrylinkError::InvalidMessage("already authenticated".into()));
            }
            consumer::handle_authenticate(state, client_id, &token).await
        }
        Inbound::RegisterDevice { user_token, user_id, push_token, platform, device_name } => {
            if info.authenticated {
                return Err(SentrylinkError::InvalidMessage("already authenticated".into()));
            }
            consumer::handle_register_device(
                state,
                client_id,
                user_token.as_deref(),
                user_id.as_deref(),
                push_token.as_deref(),
                platform,
                device_name.as_deref(),
            )
            .await
        }
        Inbound::Heartbeat {} | Inbound::Ping {} => {
            if info.authenticated && matches!(info.role, ClientRole::Producer) {
                producer::handle_heartbeat_or_ping(state, client_id).await;
            }
            Ok(())
        }
        Inbound::Status { status, data } => {
            require_producer(info)?;
            rate_limit(state, client_id, MessageClass::Status)?;
            producer::handle_status(state, client_id, info, &status, data).await
        }
        Inbound::Log { message, level } => {
            require_producer(info)?;
            rate_limit(state, client_id, MessageClass::Log)?;
            producer::handle_log(state, info, &message, level.as_deref()).await
        }
        Inbound::Notify { title, body } => {
            require_producer(info)?;
            rate_limit(state, client_id, MessageClass::Notify)?;
            producer::handle_notify(state, info, &title, &body).await
        }
        Inbound::Alert { reason, title } => {
            require_producer(info)?;
            rate_limit(state, client_id, MessageClass::Alert)?;
            producer::handle_alert(state, info, &reason, title.as_deref()).await
        }
        Inbound::Disconnect { reason } => {
            require_producer(info)?;
            producer::handle_disconnect(state, client_id, info, reason.as_deref()).await
        }
        Inbound::Command { session_id, command, data } => {
            require_consumer(info)?;
            consumer::handle_command(state, info, &session_id, &command, data).await
        }
    }
}

fn rate_limit(state: &AppState, client_id: ClientId, class: MessageClass) -> Result<()> {
    if state.rate_limiter().check(client_id, class) {
        Ok(())
    } else {
        state.metrics().rate_limited_total.inc(&[("class", class.as_str())]);
        Err(SentrylinkError::RateLimited)
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(transport::ws::ws_upgrade))
        .route("/healthz", get(obs::healthz))
        .route("/readyz", get(obs::readyz))
        .route("/metrics", get(obs::metrics))
        .route("/alerts/:id/acknowledge", post(obs::acknowledge_alert))
        .with_state(state)
}
