//! Per-socket registry: `ClientId -> (outbound queue, ClientInfo)` (spec §5).
//!
//! One `DashMap`, same discipline as the teacher's `SessionRegistry`: reads
//! for fan-out, the router is the only writer on accept/close/auth, and
//! mutations are short field writes never held across an I/O await.

use std::sync::Mutex;

use axum::extract::ws::Message;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::mpsc;

use sentrylink_core::domain::{ClientId, ClientInfo, ClientRole, SessionId, UserId};

pub struct ClientHandle {
    tx: mpsc::Sender<Message>,
    info: Mutex<ClientInfo>,
}

#[derive(Default)]
pub struct ClientRegistry {
    clients: DashMap<ClientId, ClientHandle>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, tx: mpsc::Sender<Message>, info: ClientInfo) {
        let client_id = info.client_id;
        self.clients.insert(client_id, ClientHandle { tx, info: Mutex::new(info) });
    }

    pub fn remove(&self, client_id: ClientId) -> Option<ClientInfo> {
        self.clients.remove(&client_id).map(|(_, handle)| {
            handle.info.into_inner().unwrap_or_else(|poison| poison.into_inner())
        })
    }

    pub fn info(&self, client_id: ClientId) -> Option<ClientInfo> {
        self.clients.get(&client_id).map(|h| {
            h.info.lock().unwrap_or_else(|poison| poison.into_inner()).clone()
        })
    }

    pub fn update<F: FnOnce(&mut ClientInfo)>(&self, client_id: ClientId, f: F) {
        if let Some(handle) = self.clients.get(&client_id) {
            let mut info = handle.info.lock().unwrap_or_else(|poison| poison.into_inner());
            f(&mut info);
        }
    }

    /// Best-effort: drop the frame if the socket's queue is full or closed.
    /// Fan-out isolation per spec §4.1/§7 — one dead peer never blocks others.
    pub fn send_to(&self, client_id: ClientId, value: &Value) {
        if let Some(handle) = self.clients.get(&client_id) {
            if let Ok(text) = serde_json::to_string(value) {
                let _ = handle.tx.try_send(Message::Text(text));
            }
        }
    }

    pub fn fan_out_to_consumers(&self, user_id: UserId, value: &Value) {
        let Ok(text) = serde_json::to_string(value) else { return };
        for entry in self.clients.iter() {
            let info = entry.value().info.lock().unwrap_or_else(|poison| poison.into_inner());
            if info.authenticated
                && matches!(info.role, ClientRole::Consumer)
                && info.user_id == Some(user_id)
            {
                let _ = entry.value().tx.try_send(Message::Text(text.clone()));
            }
        }
    }

    pub fn find_producer_client_for_session(&self, session_id: SessionId) -> Option<ClientId> {
        for entry in self.clients.iter() {
            let info = entry.value().info.lock().unwrap_or_else(|poison| poison.into_inner());
            if info.authenticated
                && matches!(info.role, ClientRole::Producer)
                && info.session_id == Some(session_id)
            {
                return Some(*entry.key());
            }
        }
        None
    }

    pub fn close(&self, client_id: ClientId) {
        if let Some(handle) = self.clients.get(&client_id) {
            let _ = handle.tx.try_send(Message::Close(None));
        }
    }
}
