//! Boot reconciliation and graceful shutdown (spec §4.4 restore, §4.5
//! restore, §5).

use std::time::Duration;

use crate::app_state::AppState;

/// Run before the router accepts its first connection: every session left
/// `active` by a prior process is disconnected, and any unacknowledged
/// life-or-death alert either resumes its repeat timer or is marked stale.
pub async fn reconcile_on_boot(state: &AppState) -> sentrylink_core::error::Result<()> {
    let reconciled = state.session_machine().reconcile_orphaned_sessions().await?;
    if reconciled > 0 {
        tracing::info!(count = reconciled, "reconciled orphaned sessions from a prior run");
    }
    state.alert_loop().restore().await?;
    Ok(())
}

/// Graceful shutdown (spec §5): stop taking new work, disconnect every
/// live producer with a server-initiated reason, and give in-flight
/// writes a moment to land before the process exits.
pub async fn shutdown(state: &AppState) {
    tracing::info!("shutdown: disconnecting active sessions");
    let sessions = state.store().list_active_sessions().await.unwrap_or_default();
    for session in sessions {
        let _ = state
            .session_machine()
            .disconnect_by_session_id(
                session.id,
                sentrylink_core::domain::DisconnectReason::ServerShutdown,
                Some("Server shutting down".to_string()),
            )
            .await;
        if let Some(client_id) = state.registry().find_producer_client_for_session(session.id) {
            state.watchdog().stop(client_id);
            state.registry().close(client_id);
        }
    }
    tokio::time::sleep(Duration::from_millis(200)).await;
}
