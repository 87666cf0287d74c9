//! Session state machine (spec §4.4): create/transition/terminate sessions,
//! quiet-hours policy, and the timeout path that drives the first critical
//! push and (optionally) the alert loop.

use std::sync::Arc;

use chrono::{Timelike, Utc};

use sentrylink_core::domain::{
    AlertOutcome, ClientId, DisconnectReason, GameInfo, HubId, LogLevel, Session, SessionId,
    SessionStatus, UserId,
};
use sentrylink_core::error::Result;

use crate::alert_loop::AlertLoop;
use crate::logsink::LogSink;
use crate::push::{self, PushTransport};
use crate::store::Store;

pub struct SessionMachine {
    store: Arc<dyn Store>,
    push_transport: Arc<dyn PushTransport>,
    log_sink: Arc<LogSink>,
    alert_loop: Arc<AlertLoop>,
    device_failure_threshold: u32,
}

/// Outcome of a timeout transition, useful to the caller for logging and
/// for deciding whether to close the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeoutOutcome {
    QuietHoursSuppressed,
    AlertSent,
    NoActiveSession,
}

impl SessionMachine {
    pub fn new(
        store: Arc<dyn Store>,
        push_transport: Arc<dyn PushTransport>,
        log_sink: Arc<LogSink>,
        alert_loop: Arc<AlertLoop>,
        device_failure_threshold: u32,
    ) -> Self {
        Self { store, push_transport, log_sink, alert_loop, device_failure_threshold }
    }

    /// Create a session, or reactivate one already on record for this
    /// ephemeral client id (idempotency, spec §4.4).
    pub async fn create_session(
        &self,
        client_id: ClientId,
        user_id: UserId,
        hub_id: HubId,
        game: GameInfo,
    ) -> Result<Session> {
        let now = Utc::now();
        let session = match self.store.find_session_by_client_id(client_id).await? {
            Some(mut existing) => {
                existing.user_id = user_id;
                existing.hub_id = hub_id;
                existing.game = game;
                existing.status = SessionStatus::Active;
                existing.connected_at = now;
                existing.last_heartbeat_at = now;
                existing.disconnected_at = None;
                existing.disconnect_reason = None;
                existing.disconnect_message = None;
                existing.alert = AlertOutcome::default();
                existing
            }
            None => Session {
                id: SessionId::new(),
                user_id,
                hub_id,
                client_id,
                game,
                current_status: String::new(),
                connected_at: now,
                last_heartbeat_at: now,
                status: SessionStatus::Active,
                disconnected_at: None,
                disconnect_reason: None,
                disconnect_message: None,
                alert: AlertOutcome::default(),
            },
        };
        self.store.put_session(session.clone()).await?;
        Ok(session)
    }

    /// The watchdog may race the router; an unknown client id is a no-op.
    pub async fn update_heartbeat(&self, client_id: ClientId) -> Result<()> {
        if let Some(mut session) = self.store.find_session_by_client_id(client_id).await? {
            session.last_heartbeat_at = Utc::now();
            self.store.put_session(session).await?;
        }
        Ok(())
    }

    pub async fn update_status(&self, client_id: ClientId, text: &str) -> Result<Option<Session>> {
        let Some(mut session) = self.store.find_session_by_client_id(client_id).await? else {
            return Ok(None);
        };
        session.current_status = text.to_string();
        self.store.put_session(session.clone()).await?;
        Ok(Some(session))
    }

    pub async fn disconnect_by_client_id(
        &self,
        client_id: ClientId,
        reason: DisconnectReason,
        message: Option<String>,
    ) -> Result<Option<Session>> {
        let Some(session) = self.store.find_session_by_client_id(client_id).await? else {
            return Ok(None);
        };
        self.transition_to_disconnected(session, reason, message).await
    }

    pub async fn disconnect_by_session_id(
        &self,
        session_id: SessionId,
        reason: DisconnectReason,
        message: Option<String>,
    ) -> Result<Option<Session>> {
        let Some(session) = self.store.get_session(session_id).await? else {
            return Ok(None);
        };
        self.transition_to_disconnected(session, reason, message).await
    }

    /// Used on token regeneration and hub suspension (testable property 4).
    pub async fn disconnect_all_for_user(
        &self,
        user_id: UserId,
        reason: DisconnectReason,
        message: Option<String>,
    ) -> Result<Vec<Session>> {
        let mut disconnected = Vec::new();
        for session in self.store.list_sessions_for_user(user_id).await? {
            if session.is_active() {
                if let Some(updated) = self
                    .transition_to_disconnected(session, reason, message.clone())
                    .await?
                {
                    disconnected.push(updated);
                }
            }
        }
        Ok(disconnected)
    }

    async fn transition_to_disconnected(
        &self,
        mut session: Session,
        reason: DisconnectReason,
        message: Option<String>,
    ) -> Result<Option<Session>> {
        if !session.is_active() {
            return Ok(None);
        }
        session.status = SessionStatus::Disconnected;
        session.disconnected_at = Some(Utc::now());
        session.disconnect_reason = Some(reason);
        session.disconnect_message = message;
        self.store.put_session(session.clone()).await?;
        Ok(Some(session))
    }

    /// Startup reconciliation: every session left `active` by a prior
    /// process is disconnected before the router accepts any socket.
    pub async fn reconcile_orphaned_sessions(&self) -> Result<u64> {
        let mut count = 0u64;
        for session in self.store.list_active_sessions().await? {
            if self
                .transition_to_disconnected(
                    session,
                    DisconnectReason::ServerShutdown,
                    Some("Server restarted".to_string()),
                )
                .await?
                .is_some()
            {
                count += 1;
            }
        }
        Ok(count)
    }

    /// The heartbeat watchdog's timeout callback (spec §4.4). Idempotent:
    /// loading a non-active session makes this a no-op, since a timer may
    /// fire just as another path is transitioning the same session.
    pub async fn timeout(&self, client_id: ClientId) -> Result<TimeoutOutcome> {
        let Some(mut session) = self.store.find_session_by_client_id(client_id).await? else {
            return Ok(TimeoutOutcome::NoActiveSession);
        };
        if !session.is_active() {
            return Ok(TimeoutOutcome::NoActiveSession);
        }

        let Some(user) = self.store.get_user(session.user_id).await? else {
            return Ok(TimeoutOutcome::NoActiveSession);
        };
        let hub_name = self
            .store
            .get_hub(session.hub_id)
            .await?
            .map(|h| h.name)
            .unwrap_or_else(|| "unknown hub".to_string());

        if user.prefs.quiet_hours_enabled
            && in_quiet_hours(&user.prefs.quiet_hours_start, &user.prefs.quiet_hours_end, Utc::now())
        {
            session.status = SessionStatus::Timeout;
            session.disconnected_at = Some(Utc::now());
            session.disconnect_reason = Some(DisconnectReason::Timeout);
            session.disconnect_message = Some("Heartbeat timeout (quiet hours - no alert)".to_string());
            session.alert = AlertOutcome { sent: false, delivered: false, error: None };
            self.store.put_session(session).await?;
            return Ok(TimeoutOutcome::QuietHoursSuppressed);
        }

        let _ = self
            .log_sink
            .record(
                session.id,
                session.user_id,
                LogLevel::Error,
                &format!("Heartbeat timeout in {} ({})", session.game.name, hub_name),
            )
            .await;

        let devices = self.store.list_devices_for_user(session.user_id).await.unwrap_or_default();
        let reason = format!("Lost connection to {}", session.game.name);
        let body = format!("{} ({}) — last status: {}", hub_name, reason, session.current_status);
        let summary = push::fan_out(
            self.store.as_ref(),
            self.push_transport.as_ref(),
            &devices,
            "Heartbeat Timeout",
            &body,
            Some(user.prefs.alert_sound.as_str()),
            true,
            self.device_failure_threshold,
        )
        .await;

        let error = summary
            .per_device
            .iter()
            .find_map(|o| o.error.clone());
        session.alert = AlertOutcome { sent: true, delivered: summary.success, error };

        if user.prefs.life_or_death_mode {
            let _ = self
                .alert_loop
                .start(session.user_id, session.id, reason, session.game.name.clone())
                .await;
        }

        session.status = SessionStatus::Timeout;
        session.disconnected_at = Some(Utc::now());
        session.disconnect_reason = Some(DisconnectReason::Timeout);
        session.disconnect_message = Some("Heartbeat timeout".to_string());
        self.store.put_session(session).await?;

        Ok(TimeoutOutcome::AlertSent)
    }
}

fn parse_hhmm(s: &str) -> Option<(u32, u32)> {
    let (h, m) = s.split_once(':')?;
    Some((h.parse().ok()?, m.parse().ok()?))
}

/// Quiet-hours algorithm (spec §4.4): minute-of-day interval, wrapping
/// across midnight when `start > end`.
pub fn in_quiet_hours(start: &str, end: &str, now: chrono::DateTime<Utc>) -> bool {
    let Some((sh, sm)) = parse_hhmm(start) else { return false };
    let Some((eh, em)) = parse_hhmm(end) else { return false };
    let s = sh * 60 + sm;
    let e = eh * 60 + em;
    let m = now.hour() * 60 + now.minute();
    if s <= e {
        s <= m && m < e
    } else {
        m >= s || m < e
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 7, 27, h, m, 0).unwrap()
    }

    #[test]
    fn overnight_window_suppresses_before_dawn() {
        assert!(in_quiet_hours("23:00", "07:00", at(4, 30)));
    }

    #[test]
    fn overnight_window_does_not_suppress_daytime() {
        assert!(!in_quiet_hours("23:00", "07:00", at(9, 0)));
    }

    #[test]
    fn same_day_window_is_half_open() {
        assert!(in_quiet_hours("13:00", "14:00", at(13, 30)));
        assert!(!in_quiet_hours("13:00", "14:00", at(14, 0)));
    }
}
