//! Bootstrap and security metrics.
//!
//! # Metrics
//! - `expressway_boot_phase_seconds` (histogram): duration by `phase`
//! - `expressway_csrf_rejections_total` (counter): requests refused for a
//!   bad or missing CSRF token

use std::time::Instant;

/// Record how long a bootstrap phase took.
pub fn record_phase(phase: &'static str, started: Instant) {
    let elapsed = started.elapsed();
    metrics::histogram!("expressway_boot_phase_seconds", "phase" => phase)
        .record(elapsed.as_secs_f64());
    tracing::debug!(phase, elapsed_ms = elapsed.as_millis() as u64, "Boot phase finished");
}

pub fn record_csrf_rejection() {
    metrics::counter!("expressway_csrf_rejections_total").increment(1);
}
