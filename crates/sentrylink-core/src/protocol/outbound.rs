//! Server-originated wire frames (spec §6.1).
//!
//! Each is serialized independently (no shared enum) because the shapes
//! diverge enough between "producer authenticated" and "consumer
//! authenticated" that a single tagged enum would need as many optional
//! fields as variants. This mirrors the teacher's preference for building
//! payloads with `serde_json::json!` at the call site
//! (`services/chat.rs`), generalized into named constructors so every call
//! site stays typo-proof.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::ClientCode;

pub fn connected(client_id: &str, server_version: &str, timestamp: DateTime<Utc>) -> Value {
    json!({
        "type": "connected",
        "clientId": client_id,
        "serverVersion": server_version,
        "timestamp": timestamp,
    })
}

#[derive(Serialize)]
pub struct AuthenticatedUser {
    pub username: String,
    #[serde(rename = "hasDevices")]
    pub has_devices: bool,
}

#[derive(Serialize)]
pub struct AuthenticatedHub {
    pub name: String,
}

pub fn producer_authenticated(
    session_id: &str,
    user: AuthenticatedUser,
    hub: AuthenticatedHub,
) -> Value {
    json!({
        "type": "authenticated",
        "sessionId": session_id,
        "user": user,
        "hub": hub,
    })
}

#[derive(Serialize)]
pub struct ConsumerSessionSummary {
    pub id: String,
    #[serde(rename = "gameName")]
    pub game_name: String,
    #[serde(rename = "hubName")]
    pub hub_name: String,
    pub status: String,
    #[serde(rename = "connectedAt")]
    pub connected_at: DateTime<Utc>,
    #[serde(rename = "lastHeartbeatAt")]
    pub last_heartbeat_at: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ConsumerUser {
    pub id: String,
    pub username: String,
}

pub fn consumer_authenticated(user: ConsumerUser, sessions: Vec<ConsumerSessionSummary>) -> Value {
    json!({ "type": "authenticated", "user": user, "sessions": sessions })
}

pub fn registered(user: ConsumerUser, sessions: Vec<ConsumerSessionSummary>) -> Value {
    json!({ "type": "registered", "user": user, "sessions": sessions })
}

pub fn pong(timestamp: DateTime<Utc>) -> Value {
    json!({ "type": "pong", "timestamp": timestamp })
}

pub fn command(command: &str, data: Option<Value>) -> Value {
    json!({ "type": "command", "command": command, "data": data })
}

pub fn command_sent(session_id: &str) -> Value {
    json!({ "type": "command_sent", "sessionId": session_id })
}

pub fn error(code: ClientCode, message: impl Into<String>) -> Value {
    json!({ "type": "error", "code": code.as_str(), "message": message.into() })
}

pub fn session_started(session_id: &str, game_name: &str, hub_name: &str, timestamp: DateTime<Utc>) -> Value {
    json!({
        "type": "session_started",
        "sessionId": session_id,
        "gameName": game_name,
        "hubName": hub_name,
        "timestamp": timestamp,
    })
}

pub fn status_update(session_id: &str, status: &str, data: Option<Value>, timestamp: DateTime<Utc>) -> Value {
    json!({
        "type": "status_update",
        "sessionId": session_id,
        "status": status,
        "data": data,
        "timestamp": timestamp,
    })
}

pub fn log(session_id: &str, level: &str, message: &str, timestamp: DateTime<Utc>) -> Value {
    json!({
        "type": "log",
        "sessionId": session_id,
        "level": level,
        "message": message,
        "timestamp": timestamp,
    })
}

pub fn notification(session_id: &str, title: &str, body: &str, timestamp: DateTime<Utc>) -> Value {
    json!({
        "type": "notification",
        "sessionId": session_id,
        "title": title,
        "body": body,
        "timestamp": timestamp,
    })
}

pub fn critical_alert(session_id: &str, reason: &str, title: Option<&str>, timestamp: DateTime<Utc>) -> Value {
    json!({
        "type": "critical_alert",
        "sessionId": session_id,
        "reason": reason,
        "title": title,
        "timestamp": timestamp,
    })
}

pub fn session_ended(session_id: &str, reason: &str, timestamp: DateTime<Utc>) -> Value {
    json!({
        "type": "session_ended",
        "sessionId": session_id,
        "reason": reason,
        "timestamp": timestamp,
    })
}

pub fn disconnected(session_id: &str, timestamp: DateTime<Utc>) -> Value {
    json!({
        "type": "disconnected",
        "sessionId": session_id,
        "timestamp": timestamp,
    })
}

pub fn session_connection_lost(session_id: &str, timestamp: DateTime<Utc>) -> Value {
    json!({
        "type": "session_connection_lost",
        "sessionId": session_id,
        "timestamp": timestamp,
    })
}
