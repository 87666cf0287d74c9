//! Consumer message handlers (spec §4.1 consumer authentication + dispatch).

use serde_json::Value;

use sentrylink_core::domain::{ClientId, ClientInfo, ClientRole, Platform};
use sentrylink_core::error::{Result, SentrylinkError};
use sentrylink_core::protocol::outbound::{self, ConsumerSessionSummary, ConsumerUser};

use crate::app_state::AppState;
use crate::auth;

async fn live_session_summaries(state: &AppState, user_id: sentrylink_core::domain::UserId) -> Vec<ConsumerSessionSummary> {
    let sessions = state.store().list_sessions_for_user(user_id).await.unwrap_or_default();
    let mut out = Vec::new();
    for session in sessions.into_iter().filter(|s| s.is_active()) {
        let hub_name = state
            .store()
            .get_hub(session.hub_id)
            .await
            .ok()
            .flatten()
            .map(|h| h.name)
            .unwrap_or_default();
        out.push(ConsumerSessionSummary {
            id: session.id.to_string(),
            game_name: session.game.name,
            hub_name,
            status: session.current_status,
            connected_at: session.connected_at,
            last_heartbeat_at: session.last_heartbeat_at,
        });
    }
    out
}

/// `{type:"authenticate"}`: bearer token issued by the (out-of-scope) auth
/// collaborator, opaque to this crate beyond "decodes to a user id".
pub async fn handle_authenticate(state: &AppState, client_id: ClientId, token: &str) -> Result<()> {
    let user = auth::validate_bearer_token(state.store().as_ref(), token).await?;

    state.registry().update(client_id, |info| {
        info.role = ClientRole::Consumer;
        info.authenticated = true;
        info.user_id = Some(user.id);
    });

    let sessions = live_session_summaries(state, user.id).await;
    let frame = outbound::consumer_authenticated(
        ConsumerUser { id: user.id.to_string(), username: user.username },
        sessions,
    );
    state.registry().send_to(client_id, &frame);
    Ok(())
}

/// `{type:"register_device"}`: preferred `userToken` form, or a legacy raw
/// `userId` for migration (spec §9: dual-path, should be feature-flagged
/// in new deployments — left always-on here since no flag surface exists
/// yet in this gateway's config).
pub async fn handle_register_device(
    state: &AppState,
    client_id: ClientId,
    user_token: Option<&str>,
    legacy_user_id: Option<&str>,
    push_token: Option<&str>,
    platform: Option<Platform>,
    device_name: Option<&str>,
) -> Result<()> {
    let user = if let Some(token) = user_token {
        auth::validate_user_token(state.store().as_ref(), token).await?
    } else if let Some(raw_id) = legacy_user_id {
        let id: uuid::Uuid = raw_id
            .parse()
            .map_err(|_| SentrylinkError::InvalidParams("userId is not a valid id".into()))?;
        state
            .store()
            .get_user(id.into())
            .await?
            .ok_or(SentrylinkError::InvalidUserToken)?
    } else {
        return Err(SentrylinkError::InvalidParams("userToken or userId required".into()));
    };

    if let (Some(push_token), Some(platform)) = (push_token, platform) {
        let device = upsert_device(state, user.id, push_token, platform, device_name).await?;
        let _ = device;
    }

    state.registry().update(client_id, |info| {
        info.role = ClientRole::Consumer;
        info.authenticated = true;
        info.user_id = Some(user.id);
    });

    let sessions = live_session_summaries(state, user.id).await;
    let frame = outbound::registered(
        ConsumerUser { id: user.id.to_string(), username: user.username },
        sessions,
    );
    state.registry().send_to(client_id, &frame);
    Ok(())
}

/// A push token maps to at most one device (invariant 5); re-registering
/// transfers ownership and resets the failure counter.
async fn upsert_device(
    state: &AppState,
    user_id: sentrylink_core::domain::UserId,
    push_token: &str,
    platform: Platform,
    device_name: Option<&str>,
) -> Result<sentrylink_core::domain::Device> {
    let existing = state
        .store()
        .list_devices_for_user(user_id)
        .await?
        .into_iter()
        .find(|d| d.push_token == push_token);

    let device = if let Some(mut device) = existing {
        device.user_id = user_id;
        device.platform = platform;
        device.active = true;
        device.last_seen = chrono::Utc::now();
        device.record_success();
        device
    } else {
        let _ = device_name;
        sentrylink_core::domain::Device {
            id: sentrylink_core::domain::DeviceId::new(),
            user_id,
            push_token: push_token.to_string(),
            platform,
            active: true,
            last_seen: chrono::Utc::now(),
            failed_attempts: 0,
            last_fail_reason: None,
        }
    };
    state.store().put_device(device.clone()).await?;
    Ok(device)
}

/// `{type:"command"}`: forward to the producer socket owning `sessionId`,
/// after verifying it belongs to the same user (spec §4.1 authorization).
pub async fn handle_command(
    state: &AppState,
    info: &ClientInfo,
    session_id_raw: &str,
    command: &str,
    data: Option<Value>,
) -> Result<()> {
    let session_id: uuid::Uuid = session_id_raw
        .parse()
        .map_err(|_| SentrylinkError::SessionNotFound)?;
    let session_id = sentrylink_core::domain::SessionId::from(session_id);

    let session = state
        .store()
        .get_session(session_id)
        .await?
        .filter(|s| Some(s.user_id) == info.user_id)
        .ok_or(SentrylinkError::SessionNotFound)?;

    let producer_client = state
        .registry()
        .find_producer_client_for_session(session.id)
        .ok_or(SentrylinkError::SessionNotFound)?;

    state
        .registry()
        .send_to(producer_client, &outbound::command(command, data));
    state
        .registry()
        .send_to(info.client_id, &outbound::command_sent(&session.id.to_string()));
    Ok(())
}
