//! Bridges the watchdog's fire-and-forget timeout callback back into the
//! session state machine and the client registry (spec §4.3/§4.4).

use std::sync::Arc;

use async_trait::async_trait;

use sentrylink_core::domain::ClientId;
use sentrylink_core::protocol::outbound;

use crate::session_machine::{SessionMachine, TimeoutOutcome};
use crate::watchdog::WatchdogSink;

use super::registry::ClientRegistry;

pub struct RouterWatchdogSink {
    session_machine: Arc<SessionMachine>,
    registry: Arc<ClientRegistry>,
}

impl RouterWatchdogSink {
    pub fn new(session_machine: Arc<SessionMachine>, registry: Arc<ClientRegistry>) -> Self {
        Self { session_machine, registry }
    }
}

#[async_trait]
impl WatchdogSink for RouterWatchdogSink {
    async fn on_timeout(&self, client_id: ClientId) {
        let outcome = match self.session_machine.timeout(client_id).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(client = %client_id, error = %err, "timeout transition failed");
                return;
            }
        };

        if matches!(outcome, TimeoutOutcome::NoActiveSession) {
            return;
        }

        if let Some(info) = self.registry.info(client_id) {
            if let Some(user_id) = info.user_id {
                if let Some(session_id) = info.session_id {
                    let reason = match outcome {
                        TimeoutOutcome::QuietHoursSuppressed => "quiet hours",
                        _ => "heartbeat timeout",
                    };
                    self.registry.fan_out_to_consumers(
                        user_id,
                        &outbound::session_ended(&session_id.to_string(), reason, chrono::Utc::now()),
                    );
                }
            }
        }
        self.registry.close(client_id);
        self.registry.remove(client_id);
    }
}
