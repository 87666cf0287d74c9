//! Push notification fan-out (spec §4.6).
//!
//! Concurrent per-device delivery grounded in the teacher's
//! `RealtimeCore::publish_room_reliable` (`realtime/core/realtime.rs`): a
//! `FuturesUnordered` collecting one future per recipient, drained to
//! completion rather than awaited sequentially. The recipient transport
//! differs — HTTP push via `reqwest` instead of an in-process mpsc — since
//! devices are phones, not open sockets.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use serde_json::json;

use sentrylink_core::domain::{Device, DeviceId, Platform};

use crate::store::Store;

static PUSH_FAIL_COUNT: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone)]
pub struct PushOutcome {
    pub device_id: DeviceId,
    pub delivered: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PushSummary {
    pub success: bool,
    pub total_devices: usize,
    pub success_count: usize,
    pub per_device: Vec<PushOutcome>,
}

/// The network boundary, so fan-out logic is testable without sockets.
#[async_trait]
pub trait PushTransport: Send + Sync {
    async fn send(
        &self,
        device: &Device,
        title: &str,
        body: &str,
        sound: Option<&str>,
        critical: bool,
    ) -> Result<(), String>;
}

pub struct HttpPushTransport {
    client: reqwest::Client,
    provider_url: Option<String>,
    api_key: Option<String>,
}

impl HttpPushTransport {
    pub fn new(provider_url: Option<String>, api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client, provider_url, api_key }
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn send(
        &self,
        device: &Device,
        title: &str,
        body: &str,
        sound: Option<&str>,
        critical: bool,
    ) -> Result<(), String> {
        let Some(url) = self.provider_url.as_deref() else {
            return Err("push provider not configured".into());
        };
        let sound = sound.unwrap_or(if critical { "critical.caf" } else { "default" });
        let payload = match device.platform {
            Platform::Ios => json!({
                "token": device.push_token,
                "aps": {
                    "alert": { "title": title, "body": body },
                    "sound": sound,
                    "interruption-level": if critical { "critical" } else { "active" },
                }
            }),
            Platform::Android => json!({
                "token": device.push_token,
                "notification": { "title": title, "body": body },
                "priority": if critical { "high" } else { "normal" },
            }),
            Platform::Web => json!({
                "token": device.push_token,
                "title": title,
                "body": body,
                "critical": critical,
            }),
        };

        let mut req = self.client.post(url).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req.send().await.map_err(|e| e.to_string())?;
        if !resp.status().is_success() {
            return Err(format!("push provider returned {}", resp.status()));
        }
        Ok(())
    }
}

/// Send one notification to every active device of a user, recording a
/// per-device outcome and aggregating into a `PushSummary` (spec §4.6).
///
/// Also applies invariant 6: each failure increments the device's counter
/// and, on reaching `failure_threshold` consecutive failures, deactivates
/// it; any success resets the counter. Updated devices are persisted back
/// through `store` before this returns.
pub async fn fan_out(
    store: &dyn Store,
    transport: &dyn PushTransport,
    devices: &[Device],
    title: &str,
    body: &str,
    sound: Option<&str>,
    critical: bool,
    failure_threshold: u32,
) -> PushSummary {
    let active: Vec<&Device> = devices.iter().filter(|d| d.active).collect();

    let mut futs = FuturesUnordered::new();
    for device in &active {
        let mut device = (*device).clone();
        futs.push(async move {
            let result = transport.send(&device, title, body, sound, critical).await;
            let outcome = match result {
                Ok(()) => {
                    device.record_success();
                    PushOutcome { device_id: device.id, delivered: true, error: None }
                }
                Err(e) => {
                    let n = PUSH_FAIL_COUNT.fetch_add(1, Ordering::Relaxed);
                    if n % 1024 == 1 {
                        tracing::warn!(device = %device.id, err = %e, "push delivery failed");
                    }
                    let deactivated = device.record_failure(e.clone(), failure_threshold);
                    if deactivated {
                        tracing::warn!(device = %device.id, "device deactivated after repeated push failures");
                    }
                    PushOutcome { device_id: device.id, delivered: false, error: Some(e) }
                }
            };
            if let Err(e) = store.put_device(device).await {
                tracing::warn!(error = %e, "failed to persist device push outcome");
            }
            outcome
        });
    }

    let mut per_device = Vec::with_capacity(active.len());
    while let Some(outcome) = futs.next().await {
        per_device.push(outcome);
    }

    let success_count = per_device.iter().filter(|o| o.delivered).count();
    PushSummary {
        success: success_count > 0,
        total_devices: active.len(),
        success_count,
        per_device,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::Utc;
    use sentrylink_core::domain::UserId;
    use std::sync::Mutex;

    struct FlakyTransport {
        fail_for: Mutex<Vec<DeviceId>>,
    }

    #[async_trait]
    impl PushTransport for FlakyTransport {
        async fn send(
            &self,
            device: &Device,
            _title: &str,
            _body: &str,
            _sound: Option<&str>,
            _critical: bool,
        ) -> Result<(), String> {
            if self.fail_for.lock().unwrap().contains(&device.id) {
                Err("simulated failure".into())
            } else {
                Ok(())
            }
        }
    }

    fn device(user_id: UserId, active: bool) -> Device {
        Device {
            id: DeviceId::new(),
            user_id,
            push_token: "tok".into(),
            platform: Platform::Ios,
            active,
            last_seen: Utc::now(),
            failed_attempts: 0,
            last_fail_reason: None,
        }
    }

    #[tokio::test]
    async fn fan_out_skips_inactive_devices() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let devices = vec![device(user_id, true), device(user_id, false)];
        let transport = FlakyTransport { fail_for: Mutex::new(vec![]) };
        let summary = fan_out(&store, &transport, &devices, "t", "b", None, true, 3).await;
        assert_eq!(summary.total_devices, 1);
        assert_eq!(summary.success_count, 1);
    }

    #[tokio::test]
    async fn one_device_failure_does_not_block_others() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let good = device(user_id, true);
        let bad = device(user_id, true);
        let transport = FlakyTransport { fail_for: Mutex::new(vec![bad.id]) };
        let summary = fan_out(&store, &transport, &[good, bad], "t", "b", None, false, 3).await;
        assert_eq!(summary.total_devices, 2);
        assert_eq!(summary.success_count, 1);
        assert!(summary.success);
    }

    #[tokio::test]
    async fn device_deactivates_after_reaching_failure_threshold() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let mut bad = device(user_id, true);
        bad.failed_attempts = 2;
        let bad_id = bad.id;
        let transport = FlakyTransport { fail_for: Mutex::new(vec![bad_id]) };

        fan_out(&store, &transport, &[bad], "t", "b", None, true, 3).await;

        let persisted = store.get_device(bad_id).await.unwrap().unwrap();
        assert_eq!(persisted.failed_attempts, 3);
        assert!(!persisted.active);
    }

    #[tokio::test]
    async fn success_resets_failure_counter() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();
        let mut flaky = device(user_id, true);
        flaky.failed_attempts = 2;
        let flaky_id = flaky.id;
        let transport = FlakyTransport { fail_for: Mutex::new(vec![]) };

        fan_out(&store, &transport, &[flaky], "t", "b", None, true, 3).await;

        let persisted = store.get_device(flaky_id).await.unwrap().unwrap();
        assert_eq!(persisted.failed_attempts, 0);
        assert!(persisted.active);
    }
}
