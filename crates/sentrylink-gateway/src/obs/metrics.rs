//! Minimal metrics registry for the gateway (ambient observability stack).
//!
//! No Prometheus client dependency; counters/gauges with dynamic labels
//! backed by `DashMap`, rendered in the Prometheus text exposition format
//! by hand. Pattern lifted directly from the teacher's own
//! zero-dependency `obs/metrics.rs` — this crate's label set is smaller
//! since there is no hot binary frame path to time.

use std::fmt::Write;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use dashmap::DashMap;

fn escape_label(v: &str) -> String {
    v.replace('\\', "\\\\").replace('"', "\\\"").replace('\n', "\\n")
}

#[derive(Default)]
pub struct CounterVec {
    map: DashMap<Vec<(String, String)>, AtomicU64>,
}

impl CounterVec {
    pub fn inc(&self, labels: &[(&str, &str)]) {
        self.add(labels, 1);
    }

    pub fn add(&self, labels: &[(&str, &str)], v: u64) {
        let mut key: Vec<(String, String)> =
            labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        key.sort();
        self.map.entry(key).or_insert_with(|| AtomicU64::new(0)).fetch_add(v, Ordering::Relaxed);
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} counter");
        for r in self.map.iter() {
            let labels = label_str(r.key());
            let _ = writeln!(out, "{name}{{{labels}}} {}", r.value().load(Ordering::Relaxed));
        }
    }
}

#[derive(Default)]
pub struct GaugeVec {
    map: DashMap<Vec<(String, String)>, AtomicI64>,
}

impl GaugeVec {
    pub fn set(&self, labels: &[(&str, &str)], v: i64) {
        let mut key: Vec<(String, String)> =
            labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        key.sort();
        self.map.entry(key).or_insert_with(|| AtomicI64::new(0)).store(v, Ordering::Relaxed);
    }

    pub fn add(&self, labels: &[(&str, &str)], delta: i64) {
        let mut key: Vec<(String, String)> =
            labels.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        key.sort();
        self.map.entry(key).or_insert_with(|| AtomicI64::new(0)).fetch_add(delta, Ordering::Relaxed);
    }

    fn render(&self, name: &str, out: &mut String) {
        let _ = writeln!(out, "# TYPE {name} gauge");
        for r in self.map.iter() {
            let labels = label_str(r.key());
            let _ = writeln!(out, "{name}{{{labels}}} {}", r.value().load(Ordering::Relaxed));
        }
    }
}

fn label_str(key: &[(String, String)]) -> String {
    key.iter().map(|(k, v)| format!("{k}=\"{}\"", escape_label(v))).collect::<Vec<_>>().join(",")
}

#[derive(Default)]
pub struct GatewayMetrics {
    pub ws_connections_total: CounterVec,
    pub ws_sessions_active: GaugeVec,
    pub heartbeat_timeouts_total: CounterVec,
    pub alerts_sent_total: CounterVec,
    pub push_failures_total: CounterVec,
    pub rate_limited_total: CounterVec,
    pub decode_errors_total: CounterVec,
}

impl GatewayMetrics {
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.ws_connections_total.render("sentrylink_ws_connections_total", &mut out);
        self.ws_sessions_active.render("sentrylink_ws_sessions_active", &mut out);
        self.heartbeat_timeouts_total.render("sentrylink_heartbeat_timeouts_total", &mut out);
        self.alerts_sent_total.render("sentrylink_alerts_sent_total", &mut out);
        self.push_failures_total.render("sentrylink_push_failures_total", &mut out);
        self.rate_limited_total.render("sentrylink_rate_limited_total", &mut out);
        self.decode_errors_total.render("sentrylink_decode_errors_total", &mut out);
        out
    }
}
