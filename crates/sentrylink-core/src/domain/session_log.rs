use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{SessionId, SessionLogId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Sink cap per spec §5 ("Per-session log writes are capped at 2000 chars").
pub const MAX_LOG_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLog {
    pub id: SessionLogId,
    pub session_id: SessionId,
    pub user_id: UserId,
    pub level: LogLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Truncate to the sink's per-message cap without splitting a UTF-8 boundary.
pub fn clamp_log_message(message: &str) -> String {
    if message.chars().count() <= MAX_LOG_MESSAGE_CHARS {
        return message.to_string();
    }
    message.chars().take(MAX_LOG_MESSAGE_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_leaves_short_messages_untouched() {
        assert_eq!(clamp_log_message("hello"), "hello");
    }

    #[test]
    fn clamp_truncates_long_messages() {
        let long = "a".repeat(MAX_LOG_MESSAGE_CHARS + 50);
        let clamped = clamp_log_message(&long);
        assert_eq!(clamped.chars().count(), MAX_LOG_MESSAGE_CHARS);
    }
}
