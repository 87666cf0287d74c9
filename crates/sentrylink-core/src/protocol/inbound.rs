//! Inbound wire frames (spec §4.1/§6.1): a single JSON object tagged by
//! `type`, decoded once by the transport layer the way the teacher's
//! `codec::decode` decodes a `Message` into an `Inbound` enum before any
//! routing happens.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::Platform;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameInfoWire {
    pub name: String,
    pub place_id: i64,
    pub job_id: String,
    #[serde(default)]
    pub executor: Option<String>,
}

/// Every typed frame a client may send, keyed by the wire `type` field.
///
/// Producer- and consumer-origin variants share one enum because the
/// transport decodes the frame exactly once; role enforcement (a producer
/// sending `command`, say) happens in the router, not the decoder.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inbound {
    Connect {
        #[serde(rename = "hubKey")]
        hub_key: String,
        #[serde(rename = "userToken")]
        user_token: String,
        #[serde(rename = "gameInfo")]
        game_info: GameInfoWire,
    },
    Authenticate {
        token: String,
    },
    RegisterDevice {
        #[serde(rename = "userToken", default)]
        user_token: Option<String>,
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
        #[serde(rename = "pushToken", default)]
        push_token: Option<String>,
        #[serde(default)]
        platform: Option<Platform>,
        #[serde(rename = "deviceName", default)]
        device_name: Option<String>,
    },
    Heartbeat {},
    Ping {},
    Status {
        status: String,
        #[serde(default)]
        data: Option<Value>,
    },
    Log {
        message: String,
        #[serde(default)]
        level: Option<String>,
    },
    Notify {
        title: String,
        body: String,
    },
    Alert {
        reason: String,
        #[serde(default)]
        title: Option<String>,
    },
    Disconnect {
        #[serde(default)]
        reason: Option<String>,
    },
    Command {
        #[serde(rename = "sessionId")]
        session_id: String,
        command: String,
        #[serde(default)]
        data: Option<Value>,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_connect_frame() {
        let raw = r#"{
            "type":"connect",
            "hubKey":"hub_live_abc",
            "userToken":"ABC234",
            "gameInfo":{"name":"G","placeId":1,"jobId":"j1"}
        }"#;
        let msg: Inbound = serde_json::from_str(raw).unwrap();
        match msg {
            Inbound::Connect { hub_key, user_token, game_info } => {
                assert_eq!(hub_key, "hub_live_abc");
                assert_eq!(user_token, "ABC234");
                assert_eq!(game_info.place_id, 1);
                assert_eq!(game_info.executor, None);
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn parses_status_with_optional_data() {
        let raw = r#"{"type":"status","status":"Farming"}"#;
        let msg: Inbound = serde_json::from_str(raw).unwrap();
        assert!(matches!(msg, Inbound::Status { status, data: None } if status == "Farming"));
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let raw = r#"{"type":"not_a_real_type"}"#;
        let res: Result<Inbound, _> = serde_json::from_str(raw);
        assert!(res.is_err());
    }
}
