use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{DeviceId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Android,
    Ios,
    Web,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub user_id: UserId,
    pub push_token: String,
    pub platform: Platform,
    pub active: bool,
    pub last_seen: DateTime<Utc>,
    pub failed_attempts: u32,
    pub last_fail_reason: Option<String>,
}

impl Device {
    /// Invariant 6: `failed_attempts >= threshold` implies `active == false`.
    /// Returns `true` if this call deactivated the device.
    pub fn record_failure(&mut self, reason: impl Into<String>, threshold: u32) -> bool {
        self.failed_attempts += 1;
        self.last_fail_reason = Some(reason.into());
        if self.failed_attempts >= threshold && self.active {
            self.active = false;
            return true;
        }
        false
    }

    pub fn record_success(&mut self) {
        self.failed_attempts = 0;
        self.last_fail_reason = None;
    }
}
