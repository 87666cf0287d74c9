//! Shared application state (spec §9: singletons constructed in boot
//! dependency order: store → push → limiter → watchdog → state machine →
//! alert loop → router). `Arc`-wrapped inner struct mirrors the teacher's
//! `AppState` (`app_state.rs`), generalized from one config field to the
//! whole component graph.

use std::sync::Arc;
use std::time::Duration;

use crate::alert_loop::AlertLoop;
use crate::config::GatewayConfig;
use crate::logsink::LogSink;
use crate::obs::metrics::GatewayMetrics;
use crate::push::PushTransport;
use crate::ratelimit::RateLimiter;
use crate::router::registry::ClientRegistry;
use crate::session_machine::SessionMachine;
use crate::store::Store;
use crate::watchdog::Watchdog;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: GatewayConfig,
    store: Arc<dyn Store>,
    push_transport: Arc<dyn PushTransport>,
    rate_limiter: Arc<RateLimiter>,
    watchdog: Arc<Watchdog>,
    session_machine: Arc<SessionMachine>,
    alert_loop: Arc<AlertLoop>,
    log_sink: Arc<LogSink>,
    registry: Arc<ClientRegistry>,
    metrics: Arc<GatewayMetrics>,
}

impl AppState {
    /// Construct every singleton in the dependency order spec §9 mandates:
    /// store → push → limiter → watchdog → state machine → alert loop →
    /// router. The watchdog's timeout sink closes back into the state
    /// machine and the client registry, so those two are built first and
    /// handed to the watchdog rather than the other way around.
    pub fn new(cfg: GatewayConfig, store: Arc<dyn Store>, push_transport: Arc<dyn PushTransport>) -> Self {
        let rate_limiter = Arc::new(RateLimiter::new(
            cfg.rate_limits.status,
            cfg.rate_limits.log,
            cfg.rate_limits.notify,
            cfg.rate_limits.alert,
        ));
        let log_sink = Arc::new(LogSink::new(store.clone(), cfg.gateway.log_retention_days));
        let alert_loop = Arc::new(AlertLoop::new(
            store.clone(),
            push_transport.clone(),
            Duration::from_millis(cfg.gateway.alert_loop_interval_ms),
            cfg.gateway.alert_loop_max,
            cfg.gateway.device_failure_threshold,
        ));
        let session_machine = Arc::new(SessionMachine::new(
            store.clone(),
            push_transport.clone(),
            log_sink.clone(),
            alert_loop.clone(),
            cfg.gateway.device_failure_threshold,
        ));
        let registry = Arc::new(ClientRegistry::new());

        let sink = Arc::new(crate::router::watchdog_sink::RouterWatchdogSink::new(
            session_machine.clone(),
            registry.clone(),
        ));
        let watchdog = Arc::new(Watchdog::new(
            Duration::from_millis(cfg.gateway.heartbeat_timeout_ms),
            sink,
        ));

        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                store,
                push_transport,
                rate_limiter,
                watchdog,
                session_machine,
                alert_loop,
                log_sink,
                registry,
                metrics: Arc::new(GatewayMetrics::default()),
            }),
        }
    }

    pub fn cfg(&self) -> &GatewayConfig {
        &self.inner.cfg
    }
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.inner.store
    }
    pub fn push_transport(&self) -> &Arc<dyn PushTransport> {
        &self.inner.push_transport
    }
    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.inner.rate_limiter
    }
    pub fn watchdog(&self) -> &Arc<Watchdog> {
        &self.inner.watchdog
    }
    pub fn session_machine(&self) -> &Arc<SessionMachine> {
        &self.inner.session_machine
    }
    pub fn alert_loop(&self) -> &Arc<AlertLoop> {
        &self.inner.alert_loop
    }
    pub fn log_sink(&self) -> &Arc<LogSink> {
        &self.inner.log_sink
    }
    pub fn registry(&self) -> &Arc<ClientRegistry> {
        &self.inner.registry
    }
    pub fn metrics(&self) -> &Arc<GatewayMetrics> {
        &self.inner.metrics
    }
}
