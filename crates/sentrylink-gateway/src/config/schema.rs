//! Config schema with strict parsing (spec §6.4).
//!
//! `deny_unknown_fields` prevents silent misconfiguration, same discipline
//! as the teacher's `GatewayConfig`.

use serde::Deserialize;

use sentrylink_core::error::{Result, SentrylinkError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct GatewayConfig {
    pub version: u32,
    #[serde(default)]
    pub gateway: GatewaySection,
    #[serde(default)]
    pub rate_limits: RateLimitsSection,
    #[serde(default)]
    pub push: PushSection,
    #[serde(default)]
    pub store: StoreSection,
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(SentrylinkError::BadRequest(
                "unsupported config version".into(),
            ));
        }
        if self.gateway.heartbeat_timeout_ms == 0 {
            return Err(SentrylinkError::BadRequest(
                "gateway.heartbeatTimeoutMs must be > 0".into(),
            ));
        }
        if self.gateway.alert_loop_max == 0 {
            return Err(SentrylinkError::BadRequest(
                "gateway.alertLoopMax must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct GatewaySection {
    #[serde(default = "default_listen")]
    pub listen: String,
    #[serde(default = "default_heartbeat_timeout_ms")]
    pub heartbeat_timeout_ms: u64,
    #[serde(default = "default_grace_period_ms")]
    pub reconnect_grace_period_ms: u64,
    #[serde(default = "default_alert_loop_interval_ms")]
    pub alert_loop_interval_ms: u64,
    #[serde(default = "default_alert_loop_max")]
    pub alert_loop_max: u32,
    #[serde(default = "default_log_retention_days")]
    pub log_retention_days: u32,
    #[serde(default = "default_device_failure_threshold")]
    pub device_failure_threshold: u32,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            heartbeat_timeout_ms: default_heartbeat_timeout_ms(),
            reconnect_grace_period_ms: default_grace_period_ms(),
            alert_loop_interval_ms: default_alert_loop_interval_ms(),
            alert_loop_max: default_alert_loop_max(),
            log_retention_days: default_log_retention_days(),
            device_failure_threshold: default_device_failure_threshold(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_heartbeat_timeout_ms() -> u64 {
    30_000
}
fn default_grace_period_ms() -> u64 {
    5_000
}
fn default_alert_loop_interval_ms() -> u64 {
    10_000
}
fn default_alert_loop_max() -> u32 {
    30
}
fn default_log_retention_days() -> u32 {
    7
}
fn default_device_failure_threshold() -> u32 {
    3
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RateLimitClass {
    pub max: u32,
    pub window_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct RateLimitsSection {
    #[serde(default = "default_status_limit")]
    pub status: RateLimitClass,
    #[serde(default = "default_log_limit")]
    pub log: RateLimitClass,
    #[serde(default = "default_notify_limit")]
    pub notify: RateLimitClass,
    #[serde(default = "default_alert_limit")]
    pub alert: RateLimitClass,
}

impl Default for RateLimitsSection {
    fn default() -> Self {
        Self {
            status: default_status_limit(),
            log: default_log_limit(),
            notify: default_notify_limit(),
            alert: default_alert_limit(),
        }
    }
}

fn default_status_limit() -> RateLimitClass {
    RateLimitClass { max: 6, window_ms: 60_000 }
}
fn default_log_limit() -> RateLimitClass {
    RateLimitClass { max: 30, window_ms: 60_000 }
}
fn default_notify_limit() -> RateLimitClass {
    RateLimitClass { max: 5, window_ms: 60_000 }
}
fn default_alert_limit() -> RateLimitClass {
    RateLimitClass { max: 5, window_ms: 60_000 }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct PushSection {
    #[serde(default)]
    pub provider_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for PushSection {
    fn default() -> Self {
        Self { provider_url: None, api_key: None }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Default)]
#[serde(deny_unknown_fields, rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct StoreSection {
    #[serde(default)]
    pub kind: StoreKind,
    #[serde(default)]
    pub connection_string: Option<String>,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self { kind: StoreKind::Memory, connection_string: None }
    }
}
