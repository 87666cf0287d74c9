//! Life-or-death repeating alert loop (spec §4.5).
//!
//! Depends only on the store and push fan-out, never on the session state
//! machine, so the state machine can invoke it without a cycle (spec §9's
//! "shared push fan-out + store surface" note). `Arc`-wrapped inner state
//! mirrors the teacher's `AppState` shape so a clone can be moved into each
//! spawned interval task.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;

use sentrylink_core::domain::{ActiveAlert, ActiveAlertId, Platform, SessionId, UserId};
use sentrylink_core::error::{Result, SentrylinkError};

use crate::push::{self, PushTransport};
use crate::store::Store;

struct Inner {
    store: Arc<dyn Store>,
    push_transport: Arc<dyn PushTransport>,
    interval: Duration,
    max_notifications: u32,
    device_failure_threshold: u32,
    timers: DashMap<ActiveAlertId, JoinHandle<()>>,
}

#[derive(Clone)]
pub struct AlertLoop {
    inner: Arc<Inner>,
}

/// Alerts older than this on restart are considered stale (spec §4.5 restore).
const STALE_AFTER_MINUTES: i64 = 10;

impl AlertLoop {
    pub fn new(
        store: Arc<dyn Store>,
        push_transport: Arc<dyn PushTransport>,
        interval: Duration,
        max_notifications: u32,
        device_failure_threshold: u32,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                push_transport,
                interval,
                max_notifications,
                device_failure_threshold,
                timers: DashMap::new(),
            }),
        }
    }

    /// Start a repeating alert for `userId`, or return the existing
    /// in-flight one unchanged (at most one unacknowledged alert per user).
    pub async fn start(
        &self,
        user_id: UserId,
        session_id: SessionId,
        reason: String,
        game_name: String,
    ) -> Result<ActiveAlert> {
        if let Some(existing) = self.inner.store.find_unacknowledged_alert_for_user(user_id).await? {
            return Ok(existing);
        }

        let alert = ActiveAlert {
            id: ActiveAlertId::new(),
            user_id,
            session_id,
            reason,
            game_name,
            started_at: chrono::Utc::now(),
            notifications_sent: 1,
            max_notifications: self.inner.max_notifications,
            acknowledged: false,
            acknowledged_at: None,
        };
        self.inner.store.put_active_alert(alert.clone()).await?;
        self.install_timer(alert.id);
        Ok(alert)
    }

    fn install_timer(&self, alert_id: ActiveAlertId) {
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(inner.interval).await;
                if !tick(&inner, alert_id).await {
                    break;
                }
            }
        });
        self.inner.timers.insert(alert_id, handle);
    }

    /// Acknowledge an alert; idempotent against a second call.
    pub async fn acknowledge(&self, alert_id: ActiveAlertId, user_id: UserId) -> Result<()> {
        let mut alert = self
            .inner
            .store
            .get_active_alert(alert_id)
            .await?
            .ok_or(SentrylinkError::BadRequest("alert not found".into()))?;
        if alert.user_id != user_id {
            return Err(SentrylinkError::BadRequest("alert belongs to another user".into()));
        }
        if alert.acknowledged {
            return Err(SentrylinkError::BadRequest("ALREADY_ACKNOWLEDGED".into()));
        }
        alert.acknowledged = true;
        alert.acknowledged_at = Some(chrono::Utc::now());
        self.inner.store.put_active_alert(alert).await?;
        if let Some((_, handle)) = self.inner.timers.remove(&alert_id) {
            handle.abort();
        }
        Ok(())
    }

    /// Crash recovery: reinstall timers for alerts younger than the stale
    /// cutoff; auto-acknowledge anything older (spec §4.5 restore).
    pub async fn restore(&self) -> Result<()> {
        let cutoff = chrono::Utc::now() - chrono::Duration::minutes(STALE_AFTER_MINUTES);
        for alert in self.inner.store.list_active_alerts().await? {
            if alert.acknowledged {
                continue;
            }
            if alert.started_at < cutoff {
                let mut stale = alert;
                stale.acknowledged = true;
                stale.acknowledged_at = Some(chrono::Utc::now());
                self.inner.store.put_active_alert(stale).await?;
            } else {
                self.install_timer(alert.id);
            }
        }
        Ok(())
    }
}

/// One interval tick. Returns `false` if the loop should stop (acknowledged,
/// deleted, or the notification cap was reached).
async fn tick(inner: &Arc<Inner>, alert_id: ActiveAlertId) -> bool {
    let Ok(Some(mut alert)) = inner.store.get_active_alert(alert_id).await else {
        return false;
    };
    if alert.acknowledged || alert.is_exhausted() {
        return false;
    }

    let next = alert.notifications_sent + 1;
    alert.notifications_sent = next;
    if inner.store.put_active_alert(alert.clone()).await.is_err() {
        tracing::warn!(alert = %alert_id, "failed to persist alert loop tick count");
    }

    let Ok(devices) = inner.store.list_devices_for_user(alert.user_id).await else {
        return !alert.is_exhausted();
    };
    let web_devices: Vec<_> = devices
        .into_iter()
        .filter(|d| d.active && matches!(d.platform, Platform::Web))
        .collect();

    let reason = format!("\u{1f6a8} ALERT {next}/{}: {}", alert.max_notifications, alert.reason);
    push::fan_out(
        inner.store.as_ref(),
        inner.push_transport.as_ref(),
        &web_devices,
        "Critical Alert",
        &reason,
        None,
        true,
        inner.device_failure_threshold,
    )
    .await;

    !alert.is_exhausted()
}
