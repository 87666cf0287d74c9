//! Shared error type across sentrylink crates.

use thiserror::Error;

/// Client-facing error codes (stable wire API, see spec §6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    InvalidHubKey,
    HubNotApproved,
    HubSuspended,
    InvalidUserToken,
    UserSuspended,
    RateLimited,
    InvalidMessage,
    InvalidParams,
    NotAuthenticated,
    SessionNotFound,
    BadRequest,
    Internal,
}

impl ClientCode {
    /// String representation used in `{type:"error", code:...}` frames.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::InvalidHubKey => "INVALID_HUB_KEY",
            ClientCode::HubNotApproved => "HUB_NOT_APPROVED",
            ClientCode::HubSuspended => "HUB_SUSPENDED",
            ClientCode::InvalidUserToken => "INVALID_USER_TOKEN",
            ClientCode::UserSuspended => "USER_SUSPENDED",
            ClientCode::RateLimited => "RATE_LIMITED",
            ClientCode::InvalidMessage => "INVALID_MESSAGE",
            ClientCode::InvalidParams => "INVALID_PARAMS",
            ClientCode::NotAuthenticated => "NOT_AUTHENTICATED",
            ClientCode::SessionNotFound => "SESSION_NOT_FOUND",
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, SentrylinkError>;

/// Unified error type used across core and gateway.
#[derive(Debug, Error)]
pub enum SentrylinkError {
    #[error("invalid hub key")]
    InvalidHubKey,
    #[error("hub not approved")]
    HubNotApproved,
    #[error("hub suspended")]
    HubSuspended,
    #[error("invalid user token")]
    InvalidUserToken,
    #[error("user suspended")]
    UserSuspended,
    #[error("rate limited")]
    RateLimited,
    #[error("invalid message: {0}")]
    InvalidMessage(String),
    #[error("invalid params: {0}")]
    InvalidParams(String),
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("session not found")]
    SessionNotFound,
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl SentrylinkError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            SentrylinkError::InvalidHubKey => ClientCode::InvalidHubKey,
            SentrylinkError::HubNotApproved => ClientCode::HubNotApproved,
            SentrylinkError::HubSuspended => ClientCode::HubSuspended,
            SentrylinkError::InvalidUserToken => ClientCode::InvalidUserToken,
            SentrylinkError::UserSuspended => ClientCode::UserSuspended,
            SentrylinkError::RateLimited => ClientCode::RateLimited,
            SentrylinkError::InvalidMessage(_) => ClientCode::InvalidMessage,
            SentrylinkError::InvalidParams(_) => ClientCode::InvalidParams,
            SentrylinkError::NotAuthenticated => ClientCode::NotAuthenticated,
            SentrylinkError::SessionNotFound => ClientCode::SessionNotFound,
            SentrylinkError::BadRequest(_) => ClientCode::BadRequest,
            SentrylinkError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Human-readable message suitable for the `message` field of an error frame.
    pub fn client_message(&self) -> String {
        self.to_string()
    }
}
