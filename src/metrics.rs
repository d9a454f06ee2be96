//! Prometheus metrics collection for sputnikd.
//!
//! Exposed over HTTP by [`crate::http`].
//!
//! - `sputnik_active_rooms` - Live room actors (gauge)
//! - `sputnik_room_commands_total{command}` - Room actor commands by type
//! - `sputnik_room_command_duration_seconds{command}` - Room command latency histogram
//! - `sputnik_fanout_rooms` - Rooms addressed per fan-out call (histogram)
//! - `sputnik_fanout_skipped_total{reason}` - Rooms left out of a fan-out result
//! - `sputnik_broadcast_dropped_total` - Subscribers disconnected on a full or closed queue
//! - `sputnik_service_errors_total{op,error}` - Service errors by operation and kind

use prometheus::{
    Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Gauges
// ========================================================================

/// Room actors currently registered.
pub static ACTIVE_ROOMS: OnceLock<IntGauge> = OnceLock::new();

// ========================================================================
// Room actor metrics
// ========================================================================

/// Commands processed by room actors, by type.
pub static ROOM_COMMANDS: OnceLock<IntCounterVec> = OnceLock::new();

/// Room command latency by type.
pub static ROOM_COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Subscribers disconnected because their queue was full or closed.
pub static BROADCAST_DROPPED: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Fan-out and service metrics
// ========================================================================

/// Rooms addressed per fan-out call.
pub static FANOUT_ROOMS: OnceLock<Histogram> = OnceLock::new();

/// Rooms skipped during fan-out, by reason.
pub static FANOUT_SKIPPED: OnceLock<IntCounterVec> = OnceLock::new();

/// Service errors by operation and error kind.
pub static SERVICE_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Called once at startup; later calls are no-ops for already-set metrics.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, concat!("Failed to create metric ", stringify!($metric)));
                    }
                }
            }
        };
    }

    register!(ACTIVE_ROOMS, IntGauge::new("sputnik_active_rooms", "Live room actors"));
    register!(ROOM_COMMANDS, IntCounterVec::new(Opts::new("sputnik_room_commands_total", "Room actor commands by type"), &["command"]));
    register!(ROOM_COMMAND_LATENCY, HistogramVec::new(
        HistogramOpts::new("sputnik_room_command_duration_seconds", "Room actor command latency by type")
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["command"]));
    register!(BROADCAST_DROPPED, IntCounter::new("sputnik_broadcast_dropped_total", "Subscribers disconnected on a full or closed queue"));
    register!(FANOUT_ROOMS, Histogram::with_opts(
        HistogramOpts::new("sputnik_fanout_rooms", "Rooms addressed per fan-out call")
            .buckets(vec![1.0, 2.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 1000.0])));
    register!(FANOUT_SKIPPED, IntCounterVec::new(Opts::new("sputnik_fanout_skipped_total", "Rooms skipped during fan-out"), &["reason"]));
    register!(SERVICE_ERRORS, IntCounterVec::new(Opts::new("sputnik_service_errors_total", "Service errors by operation and kind"), &["op", "error"]));
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

// ============================================================================
// Helper functions for metric updates
// ============================================================================

/// Record a room command execution with latency.
#[inline]
pub fn record_room_command(command: &str, duration_secs: f64) {
    if let Some(c) = ROOM_COMMANDS.get() {
        c.with_label_values(&[command]).inc();
    }
    if let Some(h) = ROOM_COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

#[inline]
pub fn set_active_rooms(count: usize) {
    if let Some(g) = ACTIVE_ROOMS.get() {
        g.set(count as i64);
    }
}

/// Record how many rooms one fan-out call addressed.
#[inline]
pub fn record_fanout(rooms: usize) {
    if let Some(h) = FANOUT_ROOMS.get() {
        h.observe(rooms as f64);
    }
}

/// Record a room left out of a fan-out result (`timeout`, `unavailable`, `panicked`).
#[inline]
pub fn record_fanout_skipped(reason: &str) {
    if let Some(c) = FANOUT_SKIPPED.get() {
        c.with_label_values(&[reason]).inc();
    }
}

#[inline]
pub fn record_broadcast_dropped() {
    if let Some(c) = BROADCAST_DROPPED.get() {
        c.inc();
    }
}

/// Record a service error.
#[inline]
pub fn record_service_error(op: &str, error: &str) {
    if let Some(c) = SERVICE_ERRORS.get() {
        c.with_label_values(&[op, error]).inc();
    }
}
