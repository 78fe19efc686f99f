/// Largest number of messages a single receive may return.
pub const MAX_RECEIVE_MESSAGES: i32 = 10;

/// Largest number of entries a single batch send may carry.
pub const MAX_BATCH_ENTRIES: usize = 10;

/// Configuration for receiving messages from a queue.
///
/// # Fields
/// - `max_number_of_messages`: used when the caller passes no cap (or zero).
/// - `wait_time_seconds`: long-poll window used when the caller passes none.
/// - `visibility_timeout`: lease length applied to every received message.
#[derive(Debug, Clone)]
pub struct ReceiveConfig {
    /// The maximum number of messages to receive in a single request.
    pub max_number_of_messages: i32,

    /// The wait time for long polling, in seconds.
    pub wait_time_seconds: i32,

    /// How long received messages stay hidden from other receivers, in seconds.
    pub visibility_timeout: i32,
}

impl Default for ReceiveConfig {
    fn default() -> Self {
        ReceiveConfig {
            max_number_of_messages: MAX_RECEIVE_MESSAGES,
            wait_time_seconds: 10,
            visibility_timeout: 30,
        }
    }
}

impl ReceiveConfig {
    /// Resolves the cap for one receive call. `None` and non-positive values
    /// fall back to the configured default; everything is clamped to
    /// [`MAX_RECEIVE_MESSAGES`].
    pub fn effective_max_messages(&self, requested: Option<i32>) -> i32 {
        match requested {
            Some(n) if n > 0 => n.min(MAX_RECEIVE_MESSAGES),
            _ => self.max_number_of_messages.clamp(1, MAX_RECEIVE_MESSAGES),
        }
    }

    /// Resolves the long-poll window. `None` and non-positive values fall
    /// back to the configured default; set `wait_time_seconds` to 0 for
    /// short polling.
    pub fn effective_wait_seconds(&self, requested: Option<i32>) -> i32 {
        match requested {
            Some(n) if n > 0 => n,
            _ => self.wait_time_seconds,
        }
    }
}

/// How deduplication ids are attached to outgoing messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeduplicationPolicy {
    /// A fresh token from the client's id generator on every message.
    ///
    /// With the default random generator no two sends ever share an id, so
    /// the broker never deduplicates. This is intentional: the client does
    /// not want deduplication unless the caller opts in.
    #[default]
    FreshToken,

    /// No id is sent; the broker's own (content-based) deduplication applies.
    Omit,
}

/// How message group ids are attached to outgoing messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GroupingPolicy {
    /// Single sends get a fresh token, so their order is irrelevant. Batch
    /// entries use their caller-supplied id, so entries sharing an id stay
    /// ordered relative to each other.
    #[default]
    PerMessage,

    /// Every message goes to the same group and is delivered in send order.
    Fixed(String),

    /// No group id is sent (standard, non-FIFO queues).
    Omit,
}

/// Deduplication and grouping strategy applied by the send operations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendPolicy {
    pub deduplication: DeduplicationPolicy,
    pub grouping: GroupingPolicy,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_defaults_match_long_poll_settings() {
        let config = ReceiveConfig::default();
        assert_eq!(config.max_number_of_messages, 10);
        assert_eq!(config.wait_time_seconds, 10);
        assert_eq!(config.visibility_timeout, 30);
    }

    #[test]
    fn max_messages_falls_back_and_clamps() {
        let config = ReceiveConfig::default();
        assert_eq!(config.effective_max_messages(None), 10);
        assert_eq!(config.effective_max_messages(Some(0)), 10);
        assert_eq!(config.effective_max_messages(Some(-3)), 10);
        assert_eq!(config.effective_max_messages(Some(4)), 4);
        assert_eq!(config.effective_max_messages(Some(25)), 10);

        let config = ReceiveConfig {
            max_number_of_messages: 3,
            ..ReceiveConfig::default()
        };
        assert_eq!(config.effective_max_messages(None), 3);
    }

    #[test]
    fn wait_seconds_fall_back_to_config() {
        let config = ReceiveConfig::default();
        assert_eq!(config.effective_wait_seconds(None), 10);
        assert_eq!(config.effective_wait_seconds(Some(0)), 10);
        assert_eq!(config.effective_wait_seconds(Some(2)), 2);

        let short_poll = ReceiveConfig {
            wait_time_seconds: 0,
            ..ReceiveConfig::default()
        };
        assert_eq!(short_poll.effective_wait_seconds(Some(0)), 0);
    }

    #[test]
    fn default_send_policy_never_deduplicates() {
        let policy = SendPolicy::default();
        assert_eq!(policy.deduplication, DeduplicationPolicy::FreshToken);
        assert_eq!(policy.grouping, GroupingPolicy::PerMessage);
    }
}
