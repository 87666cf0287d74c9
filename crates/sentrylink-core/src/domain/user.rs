use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserStatus {
    Active,
    Suspended,
}

/// Hash + last-6 hint for the user's short connection token.
///
/// The hash is what gets compared against; the hint is display-only (e.g.
/// "...BC234" in a settings UI) and must never be sufficient to
/// reconstruct the token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserTokenRecord {
    pub hash: String,
    pub last6_hint: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPreferences {
    pub alert_sound: String,
    pub quiet_hours_enabled: bool,
    /// "HH:MM" in UTC (spec §9 flags this as an open question; resolved
    /// here to UTC rather than the server's local clock, see DESIGN.md).
    pub quiet_hours_start: String,
    /// "HH:MM" in UTC, see `quiet_hours_start`.
    pub quiet_hours_end: String,
    pub life_or_death_mode: bool,
}

impl Default for AlertPreferences {
    fn default() -> Self {
        Self {
            alert_sound: "default".to_string(),
            quiet_hours_enabled: false,
            quiet_hours_start: "23:00".to_string(),
            quiet_hours_end: "07:00".to_string(),
            life_or_death_mode: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub username: String,
    /// Opaque to this crate; owned by the (out-of-scope) auth collaborator.
    pub password_hash: String,
    pub status: UserStatus,
    pub token: UserTokenRecord,
    pub prefs: AlertPreferences,
}

impl User {
    pub fn is_active(&self) -> bool {
        matches!(self.status, UserStatus::Active)
    }
}
