//! Newtype ids for every persisted entity and the ephemeral client id.
//!
//! All share the same `Uuid` representation; the newtypes exist so a
//! `SessionId` and a `UserId` can never be swapped by accident at a call
//! site.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! uuid_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(u: Uuid) -> Self {
                Self(u)
            }
        }
    };
}

uuid_id!(UserId);
uuid_id!(HubId);
uuid_id!(DeviceId);
uuid_id!(SessionId);
uuid_id!(ActiveAlertId);
uuid_id!(SessionLogId);
/// Ephemeral, per-socket identifier assigned on accept (spec glossary).
uuid_id!(ClientId);
