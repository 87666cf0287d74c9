//! Session log persistence (spec §4.7): clamp, store, and prune.

use std::sync::Arc;

use chrono::{Duration, Utc};

use sentrylink_core::domain::{clamp_log_message, LogLevel, SessionId, SessionLog, SessionLogId, UserId};
use sentrylink_core::error::Result;

use crate::store::Store;

pub struct LogSink {
    store: Arc<dyn Store>,
    retention_days: u32,
}

impl LogSink {
    pub fn new(store: Arc<dyn Store>, retention_days: u32) -> Self {
        Self { store, retention_days }
    }

    pub async fn record(
        &self,
        session_id: SessionId,
        user_id: UserId,
        level: LogLevel,
        message: &str,
    ) -> Result<()> {
        let log = SessionLog {
            id: SessionLogId::new(),
            session_id,
            user_id,
            level,
            message: clamp_log_message(message),
            created_at: Utc::now(),
        };
        self.store.put_session_log(log).await
    }

    pub async fn recent_for_user(&self, user_id: UserId, limit: usize) -> Result<Vec<SessionLog>> {
        self.store.list_recent_session_logs(user_id, limit).await
    }

    /// Drop logs older than the configured retention window (spec §4.7,
    /// run on a periodic housekeeping tick by the lifecycle module).
    pub async fn prune_expired(&self) -> Result<u64> {
        let cutoff = Utc::now() - Duration::days(self.retention_days as i64);
        self.store.prune_session_logs_older_than(cutoff).await
    }
}
