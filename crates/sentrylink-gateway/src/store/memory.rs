//! In-memory `Store`, the only implementation this gateway ships with
//! (spec non-goal: no real database). Grounded in the teacher's
//! `InMemoryTicketStore` and `SessionRegistry` — one `DashMap` per
//! collection, keyed by the entity's own id.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use sentrylink_core::domain::{
    ActiveAlert, ActiveAlertId, Device, DeviceId, Hub, HubId, Session, SessionId, SessionLog,
    UserId,
};
use sentrylink_core::error::Result;

use super::Store;

const RECENT_LOGS_RING_CAP: usize = 200;

#[derive(Default)]
pub struct InMemoryStore {
    users: DashMap<UserId, sentrylink_core::domain::User>,
    hubs: DashMap<HubId, Hub>,
    devices: DashMap<DeviceId, Device>,
    sessions: DashMap<SessionId, Session>,
    active_alerts: DashMap<ActiveAlertId, ActiveAlert>,
    /// user_id -> ring buffer of recent logs, capped per spec §4.7.
    recent_logs: DashMap<UserId, Mutex<VecDeque<SessionLog>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn get_user(&self, id: UserId) -> Result<Option<sentrylink_core::domain::User>> {
        Ok(self.users.get(&id).map(|r| r.value().clone()))
    }

    async fn find_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<sentrylink_core::domain::User>> {
        Ok(self
            .users
            .iter()
            .find(|r| r.value().username == username)
            .map(|r| r.value().clone()))
    }

    async fn find_user_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<sentrylink_core::domain::User>> {
        Ok(self
            .users
            .iter()
            .find(|r| r.value().token.hash == token_hash)
            .map(|r| r.value().clone()))
    }

    async fn put_user(&self, user: sentrylink_core::domain::User) -> Result<()> {
        self.users.insert(user.id, user);
        Ok(())
    }

    async fn get_hub(&self, id: HubId) -> Result<Option<Hub>> {
        Ok(self.hubs.get(&id).map(|r| r.value().clone()))
    }

    async fn find_hub_by_key_hash(&self, key_hash: &str) -> Result<Option<Hub>> {
        Ok(self
            .hubs
            .iter()
            .find(|r| r.value().api_key.hash == key_hash)
            .map(|r| r.value().clone()))
    }

    async fn put_hub(&self, hub: Hub) -> Result<()> {
        self.hubs.insert(hub.id, hub);
        Ok(())
    }

    async fn get_device(&self, id: DeviceId) -> Result<Option<Device>> {
        Ok(self.devices.get(&id).map(|r| r.value().clone()))
    }

    async fn list_devices_for_user(&self, user_id: UserId) -> Result<Vec<Device>> {
        Ok(self
            .devices
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn put_device(&self, device: Device) -> Result<()> {
        self.devices.insert(device.id, device);
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>> {
        Ok(self.sessions.get(&id).map(|r| r.value().clone()))
    }

    async fn find_session_by_client_id(
        &self,
        client_id: sentrylink_core::domain::ClientId,
    ) -> Result<Option<Session>> {
        Ok(self
            .sessions
            .iter()
            .find(|r| r.value().client_id == client_id)
            .map(|r| r.value().clone()))
    }

    async fn find_active_session_for_hub(&self, hub_id: HubId) -> Result<Option<Session>> {
        Ok(self
            .sessions
            .iter()
            .find(|r| r.value().hub_id == hub_id && r.value().is_active())
            .map(|r| r.value().clone()))
    }

    async fn list_active_sessions(&self) -> Result<Vec<Session>> {
        Ok(self
            .sessions
            .iter()
            .filter(|r| r.value().is_active())
            .map(|r| r.value().clone())
            .collect())
    }

    async fn list_sessions_for_user(&self, user_id: UserId) -> Result<Vec<Session>> {
        Ok(self
            .sessions
            .iter()
            .filter(|r| r.value().user_id == user_id)
            .map(|r| r.value().clone())
            .collect())
    }

    async fn put_session(&self, session: Session) -> Result<()> {
        self.sessions.insert(session.id, session);
        Ok(())
    }

    async fn get_active_alert(&self, id: ActiveAlertId) -> Result<Option<ActiveAlert>> {
        Ok(self.active_alerts.get(&id).map(|r| r.value().clone()))
    }

    async fn find_active_alert_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<ActiveAlert>> {
        Ok(self
            .active_alerts
            .iter()
            .find(|r| r.value().session_id == session_id)
            .map(|r| r.value().clone()))
    }

    async fn find_unacknowledged_alert_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<ActiveAlert>> {
        Ok(self
            .active_alerts
            .iter()
            .find(|r| r.value().user_id == user_id && !r.value().acknowledged)
            .map(|r| r.value().clone()))
    }

    async fn list_active_alerts(&self) -> Result<Vec<ActiveAlert>> {
        Ok(self.active_alerts.iter().map(|r| r.value().clone()).collect())
    }

    async fn put_active_alert(&self, alert: ActiveAlert) -> Result<()> {
        self.active_alerts.insert(alert.id, alert);
        Ok(())
    }

    async fn delete_active_alert(&self, id: ActiveAlertId) -> Result<()> {
        self.active_alerts.remove(&id);
        Ok(())
    }

    async fn put_session_log(&self, log: SessionLog) -> Result<()> {
        let ring = self
            .recent_logs
            .entry(log.user_id)
            .or_insert_with(|| Mutex::new(VecDeque::with_capacity(RECENT_LOGS_RING_CAP)));
        let mut ring = ring.lock().unwrap_or_else(|poison| poison.into_inner());
        if ring.len() == RECENT_LOGS_RING_CAP {
            ring.pop_front();
        }
        ring.push_back(log);
        Ok(())
    }

    async fn list_recent_session_logs(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<SessionLog>> {
        let Some(ring) = self.recent_logs.get(&user_id) else {
            return Ok(Vec::new());
        };
        let ring = ring.lock().unwrap_or_else(|poison| poison.into_inner());
        Ok(ring.iter().rev().take(limit).cloned().collect())
    }

    async fn prune_session_logs_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut pruned = 0u64;
        for entry in self.recent_logs.iter() {
            let mut ring = entry.value().lock().unwrap_or_else(|poison| poison.into_inner());
            let before = ring.len();
            ring.retain(|log| log.created_at >= cutoff);
            pruned += (before - ring.len()) as u64;
        }
        Ok(pruned)
    }
}
