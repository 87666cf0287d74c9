//! Gateway config loader (strict parsing).

pub mod schema;

use std::fs;

use sentrylink_core::error::{Result, SentrylinkError};

pub use schema::{
    GatewayConfig, GatewaySection, PushSection, RateLimitClass, RateLimitsSection, StoreKind,
    StoreSection,
};

pub fn load_from_file(path: &str) -> Result<GatewayConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| SentrylinkError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| SentrylinkError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in_when_sections_omitted() {
        let cfg = load_from_str("version: 1\n").expect("minimal config should parse");
        assert_eq!(cfg.gateway.heartbeat_timeout_ms, 30_000);
        assert_eq!(cfg.rate_limits.status.max, 6);
        assert_eq!(cfg.gateway.alert_loop_max, 30);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let raw = "version: 1\ngateway:\n  bogusField: true\n";
        assert!(load_from_str(raw).is_err());
    }

    #[test]
    fn zero_heartbeat_timeout_fails_validation() {
        let raw = "version: 1\ngateway:\n  heartbeatTimeoutMs: 0\n";
        assert!(load_from_str(raw).is_err());
    }
}
