//! Machine-readable output: one JSON object per event on stdout

use serde_json::{json, Value};
use std::time::Duration;

use super::Observer;
use crate::state::Statistics;

#[derive(Debug, Default)]
pub struct JsonPrinter;

impl JsonPrinter {
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, value: Value) {
        println!("{}", value);
    }
}

fn probe_value(stats: &Statistics, success: bool) -> Value {
    let mut value = json!({
        "event": "probe",
        "success": success,
        "host": stats.target.original,
        "ip": stats.target.resolved,
        "port": stats.target.port,
        "total_successful": stats.total_successful,
        "total_unsuccessful": stats.total_unsuccessful,
    });
    if success {
        if let Some(rtt) = stats.latency_samples.last() {
            value["rtt_ms"] = json!(rtt.as_secs_f64() * 1000.0);
        }
    }
    value
}

impl Observer for JsonPrinter {
    fn on_start(&mut self, stats: &Statistics) {
        self.emit(json!({
            "event": "start",
            "host": stats.target.original,
            "ip": stats.target.resolved,
            "port": stats.target.port,
        }));
    }

    fn on_probe_success(&mut self, stats: &Statistics) {
        self.emit(probe_value(stats, true));
    }

    fn on_probe_failure(&mut self, stats: &Statistics) {
        self.emit(probe_value(stats, false));
    }

    fn on_retrying_resolve(&mut self, stats: &Statistics) {
        self.emit(json!({
            "event": "retrying_resolve",
            "host": stats.target.original,
            "retries": stats.resolution_retries,
        }));
    }

    fn on_total_downtime(&mut self, _stats: &Statistics, downtime: Duration) {
        self.emit(json!({
            "event": "total_downtime",
            "downtime_ms": downtime.as_secs_f64() * 1000.0,
        }));
    }

    fn on_statistics(&mut self, stats: &Statistics) {
        self.emit(json!({ "event": "statistics", "stats": stats }));
    }

    fn on_error(&mut self, message: &str) {
        self.emit(json!({ "event": "error", "message": message }));
    }

    fn on_shutdown(&mut self, stats: &Statistics) {
        self.emit(json!({ "event": "shutdown", "stats": stats }));
    }
}
