//! Producer message handlers (spec §4.1 producer dispatch table). Callers
//! in `mod.rs` have already verified role/auth/rate-limit; these functions
//! assume a valid producer `ClientInfo`.

use chrono::Utc;
use serde_json::Value;

use sentrylink_core::domain::{ClientId, ClientInfo, ClientRole, DisconnectReason, GameInfo};
use sentrylink_core::error::{Result, SentrylinkError};
use sentrylink_core::protocol::outbound::{self, AuthenticatedHub, AuthenticatedUser};
use sentrylink_core::protocol::GameInfoWire;

use crate::app_state::AppState;
use crate::auth;
use crate::push;

/// `{type:"connect"}`: validate credentials, create/reactivate a session,
/// start the watchdog, and announce to the user's consumers.
pub async fn handle_connect(
    state: &AppState,
    client_id: ClientId,
    hub_key: &str,
    user_token: &str,
    game_info: GameInfoWire,
) -> Result<()> {
    let hub = auth::validate_hub_key(state.store().as_ref(), hub_key).await?;
    let user = auth::validate_user_token(state.store().as_ref(), user_token).await?;

    // A reconnect within the grace window arrives on a brand-new ClientId
    // (spec §4.3), so the prior session's grace timer is keyed differently
    // from this one and would otherwise fire a stale timeout. Cancel it by
    // session identity (hub) rather than by coincidence of client id.
    if let Some(prior) = state.store().find_active_session_for_hub(hub.id).await? {
        if prior.client_id != client_id {
            state.watchdog().stop(prior.client_id);
        }
    }

    let game = GameInfo {
        name: game_info.name,
        place_id: game_info.place_id,
        job_id: game_info.job_id,
        executor: game_info.executor,
    };
    let session = state
        .session_machine()
        .create_session(client_id, user.id, hub.id, game)
        .await?;

    let mut hub_record = hub.clone();
    hub_record.total_connections += 1;
    state.store().put_hub(hub_record).await?;

    state.registry().update(client_id, |info| {
        info.role = ClientRole::Producer;
        info.authenticated = true;
        info.user_id = Some(user.id);
        info.hub_id = Some(hub.id);
        info.session_id = Some(session.id);
    });
    state.watchdog().start(client_id);

    let devices = state.store().list_devices_for_user(user.id).await.unwrap_or_default();
    let frame = outbound::producer_authenticated(
        &session.id.to_string(),
        AuthenticatedUser { username: user.username.clone(), has_devices: !devices.is_empty() },
        AuthenticatedHub { name: hub.name.clone() },
    );
    state.registry().send_to(client_id, &frame);

    state.registry().fan_out_to_consumers(
        user.id,
        &outbound::session_started(&session.id.to_string(), &session.game.name, &hub.name, Utc::now()),
    );
    Ok(())
}

pub async fn handle_heartbeat_or_ping(state: &AppState, client_id: ClientId) {
    state.watchdog().reset(client_id);
    let _ = state.session_machine().update_heartbeat(client_id).await;
    state.registry().send_to(client_id, &outbound::pong(Utc::now()));
}

pub async fn handle_status(
    state: &AppState,
    client_id: ClientId,
    info: &ClientInfo,
    status: &str,
    data: Option<Value>,
) -> Result<()> {
    let Some(session) = state.session_machine().update_status(client_id, status).await? else {
        return Err(SentrylinkError::SessionNotFound);
    };
    let Some(user_id) = info.user_id else { return Ok(()) };
    state.registry().fan_out_to_consumers(
        user_id,
        &outbound::status_update(&session.id.to_string(), status, data, Utc::now()),
    );
    Ok(())
}

pub async fn handle_log(
    state: &AppState,
    info: &ClientInfo,
    message: &str,
    level: Option<&str>,
) -> Result<()> {
    let (Some(user_id), Some(session_id)) = (info.user_id, info.session_id) else {
        return Err(SentrylinkError::NotAuthenticated);
    };
    let level = match level.unwrap_or("info") {
        "debug" => sentrylink_core::domain::LogLevel::Debug,
        "warn" => sentrylink_core::domain::LogLevel::Warn,
        "error" => sentrylink_core::domain::LogLevel::Error,
        _ => sentrylink_core::domain::LogLevel::Info,
    };
    state.log_sink().record(session_id, user_id, level, message).await?;
    state.registry().fan_out_to_consumers(
        user_id,
        &outbound::log(&session_id.to_string(), level_str(level), message, Utc::now()),
    );
    Ok(())
}

fn level_str(level: sentrylink_core::domain::LogLevel) -> &'static str {
    use sentrylink_core::domain::LogLevel::*;
    match level {
        Debug => "debug",
        Info => "info",
        Warn => "warn",
        Error => "error",
    }
}

pub async fn handle_notify(
    state: &AppState,
    info: &ClientInfo,
    title: &str,
    body: &str,
) -> Result<()> {
    let (Some(user_id), Some(session_id)) = (info.user_id, info.session_id) else {
        return Err(SentrylinkError::NotAuthenticated);
    };
    state.registry().fan_out_to_consumers(
        user_id,
        &outbound::notification(&session_id.to_string(), title, body, Utc::now()),
    );
    let devices = state.store().list_devices_for_user(user_id).await.unwrap_or_default();
    push::fan_out(
        state.store().as_ref(),
        state.push_transport().as_ref(),
        &devices,
        title,
        body,
        None,
        false,
        state.cfg().gateway.device_failure_threshold,
    )
    .await;
    Ok(())
}

pub async fn handle_alert(
    state: &AppState,
    info: &ClientInfo,
    reason: &str,
    title: Option<&str>,
) -> Result<()> {
    let (Some(user_id), Some(session_id)) = (info.user_id, info.session_id) else {
        return Err(SentrylinkError::NotAuthenticated);
    };
    state.registry().fan_out_to_consumers(
        user_id,
        &outbound::critical_alert(&session_id.to_string(), reason, title, Utc::now()),
    );
    let devices = state.store().list_devices_for_user(user_id).await.unwrap_or_default();
    push::fan_out(
        state.store().as_ref(),
        state.push_transport().as_ref(),
        &devices,
        title.unwrap_or("Critical Alert"),
        reason,
        None,
        true,
        state.cfg().gateway.device_failure_threshold,
    )
    .await;
    Ok(())
}

/// `{type:"disconnect"}`: stop watchdog, transition to disconnected(manual),
/// fan out `session_ended`, then ack the producer itself and close its
/// socket (spec §4.1's disconnect row: "ack & close socket").
pub async fn handle_disconnect(
    state: &AppState,
    client_id: ClientId,
    info: &ClientInfo,
    reason: Option<&str>,
) -> Result<()> {
    state.watchdog().stop(client_id);
    let Some(session) = state
        .session_machine()
        .disconnect_by_client_id(client_id, DisconnectReason::Manual, reason.map(str::to_string))
        .await?
    else {
        return Ok(());
    };
    if let Some(user_id) = info.user_id {
        state.registry().fan_out_to_consumers(
            user_id,
            &outbound::session_ended(&session.id.to_string(), "manual", Utc::now()),
        );
    }
    state.registry().send_to(client_id, &outbound::disconnected(&session.id.to_string(), Utc::now()));
    state.registry().close(client_id);
    Ok(())
}
