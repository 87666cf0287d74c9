//! Decode-once codec for the WS transport layer (spec §4.1/§6.1).
//!
//! Text frames decode straight into the typed `Inbound` enum; anything
//! else surfaces as its own variant so the read loop never has to match
//! on `axum`'s `Message` type more than once.

use axum::extract::ws::Message;

use sentrylink_core::error::{Result, SentrylinkError};
use sentrylink_core::protocol::Inbound;

#[derive(Debug)]
pub enum Decoded {
    Frame(Inbound),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    Close,
}

/// Malformed JSON (and unknown `type` tags, which fail the same
/// `serde` decode) is an `InvalidMessage`, not a connection-ending error
/// (spec §4.1: the socket stays open, only the offending frame is rejected).
pub fn decode(msg: Message) -> Result<Decoded> {
    match msg {
        Message::Text(s) => {
            let frame: Inbound = serde_json::from_str(&s)
                .map_err(|e| SentrylinkError::InvalidMessage(format!("invalid frame: {e}")))?;
            Ok(Decoded::Frame(frame))
        }
        Message::Binary(_) => Err(SentrylinkError::InvalidMessage("binary frames are not supported".into())),
        Message::Ping(v) => Ok(Decoded::Ping(v)),
        Message::Pong(v) => Ok(Decoded::Pong(v)),
        Message::Close(_) => Ok(Decoded::Close),
    }
}
