//! Persisted entities and the transient per-socket record (spec §3).

pub mod alert;
pub mod client_info;
pub mod device;
pub mod hub;
pub mod ids;
pub mod session;
pub mod session_log;
pub mod user;

pub use alert::ActiveAlert;
pub use client_info::{ClientInfo, ClientRole};
pub use device::{Device, Platform};
pub use hub::{Hub, HubApiKeyRecord, HubStatus};
pub use ids::{ActiveAlertId, ClientId, DeviceId, HubId, SessionId, SessionLogId, UserId};
pub use session::{AlertOutcome, DisconnectReason, GameInfo, Session, SessionStatus};
pub use session_log::{clamp_log_message, LogLevel, SessionLog, MAX_LOG_MESSAGE_CHARS};
pub use user::{AlertPreferences, User, UserStatus, UserTokenRecord};
