//! Room actor and fan-out limits configuration.

use serde::Deserialize;
use std::time::Duration;

/// Capacity and timeout limits.
///
/// These bound every queue in the system and every wait on another task, so
/// one slow room or subscriber cannot hold a caller indefinitely.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Room actor mailbox capacity (default: 100).
    /// Senders wait when the mailbox is full.
    #[serde(default = "default_room_mailbox_capacity")]
    pub room_mailbox_capacity: usize,
    /// Per-subscriber broadcast queue capacity (default: 64).
    /// A subscriber whose queue fills up is disconnected.
    #[serde(default = "default_subscriber_queue_capacity")]
    pub subscriber_queue_capacity: usize,
    /// Upper bound on a single storage call made by a room actor, in ms (default: 5000).
    #[serde(default = "default_storage_timeout_ms")]
    pub storage_timeout_ms: u64,
    /// Upper bound on one room's reply during fan-out, in ms (default: 10000).
    #[serde(default = "default_fanout_timeout_ms")]
    pub fanout_timeout_ms: u64,
    /// Event limit used when a sync filter carries none (default: 50).
    #[serde(default = "default_event_limit")]
    pub default_event_limit: u32,
    /// Ceiling applied to every requested event limit (default: 500).
    #[serde(default = "default_max_event_limit")]
    pub max_event_limit: u32,
}

impl LimitsConfig {
    pub fn storage_timeout(&self) -> Duration {
        Duration::from_millis(self.storage_timeout_ms)
    }

    pub fn fanout_timeout(&self) -> Duration {
        Duration::from_millis(self.fanout_timeout_ms)
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            room_mailbox_capacity: default_room_mailbox_capacity(),
            subscriber_queue_capacity: default_subscriber_queue_capacity(),
            storage_timeout_ms: default_storage_timeout_ms(),
            fanout_timeout_ms: default_fanout_timeout_ms(),
            default_event_limit: default_event_limit(),
            max_event_limit: default_max_event_limit(),
        }
    }
}

fn default_room_mailbox_capacity() -> usize {
    100
}

fn default_subscriber_queue_capacity() -> usize {
    64
}

fn default_storage_timeout_ms() -> u64 {
    5_000
}

fn default_fanout_timeout_ms() -> u64 {
    10_000
}

fn default_event_limit() -> u32 {
    50
}

fn default_max_event_limit() -> u32 {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values_are_correct() {
        let config = LimitsConfig::default();
        assert_eq!(config.room_mailbox_capacity, 100);
        assert_eq!(config.subscriber_queue_capacity, 64);
        assert_eq!(config.storage_timeout(), Duration::from_secs(5));
        assert_eq!(config.fanout_timeout(), Duration::from_secs(10));
        assert_eq!(config.default_event_limit, 50);
        assert_eq!(config.max_event_limit, 500);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: LimitsConfig = toml::from_str("fanout_timeout_ms = 250").unwrap();
        assert_eq!(config.fanout_timeout(), Duration::from_millis(250));
        assert_eq!(config.room_mailbox_capacity, 100);
    }
}
