use chrono::{DateTime, Utc};
use std::net::IpAddr;

use super::ids::{ClientId, DeviceId, HubId, SessionId, UserId};

/// In-memory only (spec §3: "Transient per-socket record").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientRole {
    Unauth,
    Producer,
    Consumer,
}

#[derive(Debug, Clone)]
pub struct ClientInfo {
    pub client_id: ClientId,
    pub role: ClientRole,
    pub authenticated: bool,
    pub user_id: Option<UserId>,
    pub hub_id: Option<HubId>,
    pub session_id: Option<SessionId>,
    pub device_id: Option<DeviceId>,
    pub peer_ip: Option<IpAddr>,
    pub connected_at: DateTime<Utc>,
}

impl ClientInfo {
    pub fn new(client_id: ClientId, peer_ip: Option<IpAddr>, connected_at: DateTime<Utc>) -> Self {
        Self {
            client_id,
            role: ClientRole::Unauth,
            authenticated: false,
            user_id: None,
            hub_id: None,
            session_id: None,
            device_id: None,
            peer_ip,
            connected_at,
        }
    }
}
