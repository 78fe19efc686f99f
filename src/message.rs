use std::collections::HashMap;

/// A message received from the broker.
///
/// The same message may be received more than once: when its lease lapses
/// before [`crate::QueueClient::delete_message`] is called it becomes
/// available again. Callers must tolerate duplicate processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Broker-assigned message id.
    pub id: String,

    /// Opaque token proving the current lease; required to delete the message.
    pub receipt_handle: String,

    /// MD5 hex digest of the body as computed by the broker.
    pub body_checksum: String,

    pub body: String,

    /// System attributes keyed by the broker's attribute names.
    pub attributes: HashMap<String, String>,
}

impl Message {
    pub const SENDER_ID: &'static str = "SenderId";
    pub const SENT_TIMESTAMP: &'static str = "SentTimestamp";
    pub const APPROXIMATE_RECEIVE_COUNT: &'static str = "ApproximateReceiveCount";
    pub const APPROXIMATE_FIRST_RECEIVE_TIMESTAMP: &'static str =
        "ApproximateFirstReceiveTimestamp";
    pub const SEQUENCE_NUMBER: &'static str = "SequenceNumber";
    pub const MESSAGE_DEDUPLICATION_ID: &'static str = "MessageDeduplicationId";
    pub const MESSAGE_GROUP_ID: &'static str = "MessageGroupId";

    /// How many times the broker has handed this message out, if reported.
    pub fn receive_count(&self) -> Option<u32> {
        self.attributes
            .get(Self::APPROXIMATE_RECEIVE_COUNT)
            .and_then(|count| count.parse().ok())
    }

    pub fn deduplication_id(&self) -> Option<&str> {
        self.attributes
            .get(Self::MESSAGE_DEDUPLICATION_ID)
            .map(String::as_str)
    }

    pub fn group_id(&self) -> Option<&str> {
        self.attributes.get(Self::MESSAGE_GROUP_ID).map(String::as_str)
    }
}

/// A message to submit as part of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Caller-assigned id, unique within a batch.
    pub id: String,
    pub body: String,
}

impl OutboundMessage {
    pub fn new(id: impl Into<String>, body: impl Into<String>) -> Self {
        OutboundMessage {
            id: id.into(),
            body: body.into(),
        }
    }
}

/// Broker acknowledgement of a single send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendReceipt {
    pub message_id: String,
    pub body_checksum: String,
}

/// Outcome of one entry of a batch send.
///
/// `position` is the index of the entry in the submitted slice; success and
/// failure entries coexist in one batch response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchResultEntry {
    Success {
        position: usize,
        id: String,
        message_id: String,
        body_checksum: String,
    },
    Failure {
        position: usize,
        id: String,
        code: String,
        message: Option<String>,
        sender_fault: bool,
    },
}

impl BatchResultEntry {
    pub fn position(&self) -> usize {
        match self {
            BatchResultEntry::Success { position, .. } => *position,
            BatchResultEntry::Failure { position, .. } => *position,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            BatchResultEntry::Success { id, .. } => id,
            BatchResultEntry::Failure { id, .. } => id,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, BatchResultEntry::Success { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_accessors_read_broker_names() {
        let attributes = HashMap::from([
            ("ApproximateReceiveCount".to_string(), "2".to_string()),
            ("MessageGroupId".to_string(), "orders".to_string()),
        ]);
        let message = Message {
            id: "m-1".to_string(),
            receipt_handle: "rh-1".to_string(),
            body_checksum: String::new(),
            body: "x".to_string(),
            attributes,
        };

        assert_eq!(message.receive_count(), Some(2));
        assert_eq!(message.group_id(), Some("orders"));
        assert_eq!(message.deduplication_id(), None);
    }
}
