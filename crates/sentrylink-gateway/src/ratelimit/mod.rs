//! Fixed-window rate limiter (spec §4.2).
//!
//! A deliberate departure from the teacher's unwired token-bucket sketch in
//! `policy/engine.rs`: the spec calls for per-class counters that reset
//! wholesale once a window elapses, not a continuously refilling bucket.
//! Keyed by `(ClientId, MessageClass)` in a single `DashMap`, following the
//! same "one concurrent map, no outer lock" shape as the teacher's
//! `SessionRegistry`.

use std::time::Instant;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use sentrylink_core::domain::ClientId;

use crate::config::RateLimitClass;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageClass {
    Status,
    Log,
    Notify,
    Alert,
}

impl MessageClass {
    pub fn as_str(self) -> &'static str {
        match self {
            MessageClass::Status => "status",
            MessageClass::Log => "log",
            MessageClass::Notify => "notify",
            MessageClass::Alert => "alert",
        }
    }
}

struct Window {
    started_at: Instant,
    count: u32,
}

pub struct RateLimiter {
    windows: DashMap<(ClientId, MessageClass), Window>,
    status: RateLimitClass,
    log: RateLimitClass,
    notify: RateLimitClass,
    alert: RateLimitClass,
}

impl RateLimiter {
    pub fn new(
        status: RateLimitClass,
        log: RateLimitClass,
        notify: RateLimitClass,
        alert: RateLimitClass,
    ) -> Self {
        Self { windows: DashMap::new(), status, log, notify, alert }
    }

    fn class_config(&self, class: MessageClass) -> RateLimitClass {
        match class {
            MessageClass::Status => self.status,
            MessageClass::Log => self.log,
            MessageClass::Notify => self.notify,
            MessageClass::Alert => self.alert,
        }
    }

    /// Returns `true` if the message is allowed (and counts toward the
    /// window), `false` if the client has exhausted this class's budget.
    pub fn check(&self, client_id: ClientId, class: MessageClass) -> bool {
        let cfg = self.class_config(class);
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry((client_id, class))
            .or_insert_with(|| Window { started_at: now, count: 0 });

        if now.duration_since(entry.started_at).as_millis() as u64 >= cfg.window_ms {
            entry.started_at = now;
            entry.count = 0;
        }

        if entry.count >= cfg.max {
            return false;
        }
        entry.count += 1;
        true
    }

    pub fn clear_client(&self, client_id: ClientId) {
        self.windows.retain(|(cid, _), _| *cid != client_id);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn limiter() -> RateLimiter {
        let tight = RateLimitClass { max: 2, window_ms: 50 };
        RateLimiter::new(tight, tight, tight, tight)
    }

    #[test]
    fn allows_up_to_max_then_blocks() {
        let rl = limiter();
        let id = ClientId::new();
        assert!(rl.check(id, MessageClass::Status));
        assert!(rl.check(id, MessageClass::Status));
        assert!(!rl.check(id, MessageClass::Status));
    }

    #[test]
    fn window_reset_restores_budget() {
        let rl = limiter();
        let id = ClientId::new();
        assert!(rl.check(id, MessageClass::Log));
        assert!(rl.check(id, MessageClass::Log));
        assert!(!rl.check(id, MessageClass::Log));
        std::thread::sleep(Duration::from_millis(60));
        assert!(rl.check(id, MessageClass::Log));
    }

    #[test]
    fn classes_are_independent_per_client() {
        let rl = limiter();
        let id = ClientId::new();
        assert!(rl.check(id, MessageClass::Alert));
        assert!(rl.check(id, MessageClass::Alert));
        assert!(!rl.check(id, MessageClass::Alert));
        assert!(rl.check(id, MessageClass::Notify));
    }
}
