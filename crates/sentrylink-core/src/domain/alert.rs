use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{ActiveAlertId, SessionId, UserId};

/// Life-or-death repeating alert record (spec §3/§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveAlert {
    pub id: ActiveAlertId,
    pub user_id: UserId,
    pub session_id: SessionId,
    pub reason: String,
    pub game_name: String,
    pub started_at: DateTime<Utc>,
    pub notifications_sent: u32,
    pub max_notifications: u32,
    pub acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

impl ActiveAlert {
    pub const DEFAULT_MAX_NOTIFICATIONS: u32 = 30;

    pub fn is_exhausted(&self) -> bool {
        self.notifications_sent >= self.max_notifications
    }
}
