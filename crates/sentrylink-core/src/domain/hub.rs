use serde::{Deserialize, Serialize};

use super::ids::HubId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HubStatus {
    Pending,
    Approved,
    Rejected,
    Suspended,
}

/// Hash + short fingerprint of the hub's API key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubApiKeyRecord {
    pub hash: String,
    pub hint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hub {
    pub id: HubId,
    pub name: String,
    pub slug: String,
    pub owner_email: String,
    pub api_key: HubApiKeyRecord,
    pub status: HubStatus,
    pub total_connections: u64,
}

impl Hub {
    pub fn is_approved(&self) -> bool {
        matches!(self.status, HubStatus::Approved)
    }
}
