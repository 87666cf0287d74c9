//! Credential verification for hub API keys and user connection tokens
//! (spec §4.1, §6.2). Hashing pattern (SHA-256 digest, hex-encoded, store
//! only the hash) is grounded in the teacher pack's `auth::validate_token`
//! (`iwismer-rusty-timer/services/server/src/auth.rs`); the short-token
//! alphabet is new, required by spec §4.1's human-typable 6-character form.

use rand::Rng;
use sha2::{Digest, Sha256};

use sentrylink_core::domain::{Hub, User};
use sentrylink_core::error::{Result, SentrylinkError};

use crate::store::Store;

pub const HUB_KEY_PREFIX: &str = "hub_live_";

/// Characters chosen to avoid visual ambiguity when read aloud or typed
/// (no 0/O, 1/I/L).
const TOKEN_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
pub const USER_TOKEN_LEN: usize = 6;

pub fn hash_credential(raw: &str) -> String {
    let digest = Sha256::digest(raw.as_bytes());
    hex::encode(digest)
}

pub fn generate_user_token() -> String {
    let mut rng = rand::thread_rng();
    (0..USER_TOKEN_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..TOKEN_ALPHABET.len());
            TOKEN_ALPHABET[idx] as char
        })
        .collect()
}

pub fn last6_hint(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let start = chars.len().saturating_sub(6);
    chars[start..].iter().collect()
}

/// Validate a hub's presented API key (spec §4.1 connect flow, step 1).
pub async fn validate_hub_key(store: &dyn Store, presented_key: &str) -> Result<Hub> {
    if !presented_key.starts_with(HUB_KEY_PREFIX) {
        return Err(SentrylinkError::InvalidHubKey);
    }
    let hash = hash_credential(presented_key);
    let hub = store
        .find_hub_by_key_hash(&hash)
        .await?
        .ok_or(SentrylinkError::InvalidHubKey)?;
    match hub.status {
        sentrylink_core::domain::HubStatus::Approved => Ok(hub),
        sentrylink_core::domain::HubStatus::Suspended => Err(SentrylinkError::HubSuspended),
        _ => Err(SentrylinkError::HubNotApproved),
    }
}

/// Validate a user's presented connection token. Accepts the 6-character
/// short form and a legacy prefixed form (spec §4.7/§9: dual-path kept
/// for migration, new deployments should accept only the short form).
pub async fn validate_user_token(store: &dyn Store, presented_token: &str) -> Result<User> {
    let normalized = presented_token.strip_prefix("stk_").unwrap_or(presented_token);
    let hash = hash_credential(normalized);
    let user = store
        .find_user_by_token_hash(&hash)
        .await?
        .ok_or(SentrylinkError::InvalidUserToken)?;
    if !user.is_active() {
        return Err(SentrylinkError::UserSuspended);
    }
    Ok(user)
}

/// Decode a consumer's bearer token into its owning user.
///
/// JWT issuance is the out-of-scope auth collaborator's job (spec §1/§6.2);
/// this crate only consumes the result. Lacking that collaborator, the
/// token is treated as carrying the user id directly, the same degenerate
/// stand-in the teacher uses for its own out-of-scope ticket resolver
/// (`app_state::resolve_ticket`) pending a real implementation.
pub async fn validate_bearer_token(store: &dyn Store, token: &str) -> Result<User> {
    let user_id: uuid::Uuid = token
        .parse()
        .map_err(|_| SentrylinkError::NotAuthenticated)?;
    let user = store
        .get_user(user_id.into())
        .await?
        .ok_or(SentrylinkError::NotAuthenticated)?;
    if !user.is_active() {
        return Err(SentrylinkError::UserSuspended);
    }
    Ok(user)
}
