use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ClientId, HubId, SessionId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Active,
    Disconnected,
    Timeout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisconnectReason {
    Manual,
    Timeout,
    TokenRevoked,
    Error,
    ServerShutdown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameInfo {
    pub name: String,
    pub place_id: i64,
    pub job_id: String,
    pub executor: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertOutcome {
    pub sent: bool,
    pub delivered: bool,
    pub error: Option<String>,
}

impl Default for AlertOutcome {
    fn default() -> Self {
        Self {
            sent: false,
            delivered: false,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub hub_id: HubId,
    pub client_id: ClientId,
    pub game: GameInfo,
    pub current_status: String,
    pub connected_at: DateTime<Utc>,
    pub last_heartbeat_at: DateTime<Utc>,
    pub status: SessionStatus,
    pub disconnected_at: Option<DateTime<Utc>>,
    pub disconnect_reason: Option<DisconnectReason>,
    pub disconnect_message: Option<String>,
    pub alert: AlertOutcome,
}

impl Session {
    pub fn is_active(&self) -> bool {
        matches!(self.status, SessionStatus::Active)
    }
}
