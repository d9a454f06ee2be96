//! Telemetry utilities for command timing and tracing spans.

use std::time::Instant;

/// Guard for timing a room command and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    command: &'static str,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(command: &'static str) -> Self {
        Self {
            command,
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_room_command(self.command, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Span covering a room actor's lifetime.
    pub fn room(room_id: &str) -> Span {
        info_span!("room", room_id = %room_id)
    }

    /// Span for one service call.
    pub fn service_call(op: &'static str, user_id: Option<&str>) -> Span {
        if let Some(user_id) = user_id {
            info_span!("service_call", op = op, user_id = %user_id)
        } else {
            info_span!("service_call", op = op)
        }
    }
}
