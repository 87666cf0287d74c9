//! Heartbeat watchdog (spec §4.3).
//!
//! One timer task per producer client, held in a `DashMap` the same way the
//! teacher keys per-user state (`SessionRegistry`). The spec's own wording
//! ("if a timer exists, cancel and reschedule") maps directly onto
//! abort-and-respawn rather than a resettable timer wheel: simpler, and the
//! teacher's `writer.abort()` in `transport/ws.rs` shows the same
//! abort-on-teardown idiom already in use for the writer task.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;

use sentrylink_core::domain::ClientId;

/// What fires when a client's heartbeat timer elapses without a reset.
#[async_trait::async_trait]
pub trait WatchdogSink: Send + Sync {
    async fn on_timeout(&self, client_id: ClientId);
}

pub struct Watchdog {
    timers: DashMap<ClientId, JoinHandle<()>>,
    timeout: Duration,
    sink: Arc<dyn WatchdogSink>,
}

impl Watchdog {
    pub fn new(timeout: Duration, sink: Arc<dyn WatchdogSink>) -> Self {
        Self { timers: DashMap::new(), timeout, sink }
    }

    fn spawn_timer(&self, client_id: ClientId) -> JoinHandle<()> {
        let timeout = self.timeout;
        let sink = self.sink.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            sink.on_timeout(client_id).await;
        })
    }

    /// Start (or restart) the timer for a freshly authenticated producer.
    pub fn start(&self, client_id: ClientId) {
        self.reset(client_id);
    }

    /// Cancel any existing timer for this client and schedule a fresh one,
    /// per spec §4.3's heartbeat/status/log/notify/alert reset rule.
    pub fn reset(&self, client_id: ClientId) {
        if let Some((_, old)) = self.timers.remove(&client_id) {
            old.abort();
        }
        self.timers.insert(client_id, self.spawn_timer(client_id));
    }

    /// Stop the timer outright (session ended, socket closed cleanly).
    pub fn stop(&self, client_id: ClientId) {
        if let Some((_, handle)) = self.timers.remove(&client_id) {
            handle.abort();
        }
    }

    /// Start a shorter-lived timer for the reconnect grace window
    /// (spec §4.3: abrupt close starts a grace timer instead of an
    /// immediate timeout).
    pub fn grace_close(&self, client_id: ClientId, grace: Duration) {
        if let Some((_, old)) = self.timers.remove(&client_id) {
            old.abort();
        }
        let sink = self.sink.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            sink.on_timeout(client_id).await;
        });
        self.timers.insert(client_id, handle);
    }

    pub fn is_active(&self, client_id: ClientId) -> bool {
        self.timers.contains_key(&client_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSink(Arc<AtomicUsize>);

    #[async_trait::async_trait]
    impl WatchdogSink for CountingSink {
        async fn on_timeout(&self, _client_id: ClientId) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reset_before_deadline_prevents_timeout() {
        let count = Arc::new(AtomicUsize::new(0));
        let wd = Watchdog::new(Duration::from_millis(100), Arc::new(CountingSink(count.clone())));
        let id = ClientId::new();
        wd.start(id);

        tokio::time::advance(Duration::from_millis(60)).await;
        wd.reset(id);
        tokio::time::advance(Duration::from_millis(60)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_millis(110)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_without_firing() {
        let count = Arc::new(AtomicUsize::new(0));
        let wd = Watchdog::new(Duration::from_millis(50), Arc::new(CountingSink(count.clone())));
        let id = ClientId::new();
        wd.start(id);
        wd.stop(id);
        tokio::time::advance(Duration::from_millis(200)).await;
        tokio::task::yield_now().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!wd.is_active(id));
    }
}
