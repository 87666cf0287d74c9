//! Persistence seam (spec §4.7 / §7).
//!
//! `Store` is the one trait every other gateway component talks to, the
//! same role `TicketStore` plays for the teacher's connect path — generalized
//! here to every persisted entity instead of one lookup table.

pub mod memory;

use async_trait::async_trait;

use sentrylink_core::domain::{
    ActiveAlert, ActiveAlertId, Device, DeviceId, Hub, HubId, Session, SessionId, SessionLog,
    User, UserId,
};
use sentrylink_core::error::Result;

pub use memory::InMemoryStore;

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn find_user_by_token_hash(&self, token_hash: &str) -> Result<Option<User>>;
    async fn put_user(&self, user: User) -> Result<()>;

    async fn get_hub(&self, id: HubId) -> Result<Option<Hub>>;
    async fn find_hub_by_key_hash(&self, key_hash: &str) -> Result<Option<Hub>>;
    async fn put_hub(&self, hub: Hub) -> Result<()>;

    async fn get_device(&self, id: DeviceId) -> Result<Option<Device>>;
    async fn list_devices_for_user(&self, user_id: UserId) -> Result<Vec<Device>>;
    async fn put_device(&self, device: Device) -> Result<()>;

    async fn get_session(&self, id: SessionId) -> Result<Option<Session>>;
    async fn find_session_by_client_id(
        &self,
        client_id: sentrylink_core::domain::ClientId,
    ) -> Result<Option<Session>>;
    async fn find_active_session_for_hub(&self, hub_id: HubId) -> Result<Option<Session>>;
    async fn list_active_sessions(&self) -> Result<Vec<Session>>;
    async fn list_sessions_for_user(&self, user_id: UserId) -> Result<Vec<Session>>;
    async fn put_session(&self, session: Session) -> Result<()>;

    async fn get_active_alert(&self, id: ActiveAlertId) -> Result<Option<ActiveAlert>>;
    async fn find_active_alert_for_session(
        &self,
        session_id: SessionId,
    ) -> Result<Option<ActiveAlert>>;
    async fn find_unacknowledged_alert_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Option<ActiveAlert>>;
    async fn list_active_alerts(&self) -> Result<Vec<ActiveAlert>>;
    async fn put_active_alert(&self, alert: ActiveAlert) -> Result<()>;
    async fn delete_active_alert(&self, id: ActiveAlertId) -> Result<()>;

    async fn put_session_log(&self, log: SessionLog) -> Result<()>;
    async fn list_recent_session_logs(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<SessionLog>>;
    async fn prune_session_logs_older_than(
        &self,
        cutoff: chrono::DateTime<chrono::Utc>,
    ) -> Result<u64>;
}
