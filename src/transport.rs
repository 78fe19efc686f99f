use async_trait::async_trait;

use crate::errors::QueueClientError;
use crate::message::{Message, SendReceipt};

pub mod memory;
pub mod sqs;

pub use memory::InMemoryBroker;
pub use sqs::SqsTransport;

/// Receive request as shaped by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveRequest {
    pub queue_url: String,
    pub max_number_of_messages: i32,
    pub wait_time_seconds: i32,
    pub visibility_timeout: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendRequest {
    pub queue_url: String,
    pub body: String,
    pub delay_seconds: i32,
    pub deduplication_id: Option<String>,
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendBatchRequestEntry {
    pub id: String,
    pub body: String,
    pub delay_seconds: i32,
    pub deduplication_id: Option<String>,
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendBatchRequest {
    pub queue_url: String,
    pub entries: Vec<SendBatchRequestEntry>,
}

/// Broker answer to a batch send, reported by entry id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SendBatchResponse {
    pub successful: Vec<BatchSuccess>,
    pub failed: Vec<BatchFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSuccess {
    pub id: String,
    pub message_id: String,
    pub body_checksum: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchFailure {
    pub id: String,
    pub code: String,
    pub message: Option<String>,
    pub sender_fault: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteRequest {
    pub queue_url: String,
    pub receipt_handle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeVisibilityRequest {
    pub queue_url: String,
    pub receipt_handle: String,
    pub visibility_timeout: i32,
}

/// The broker capability the queue client talks through.
///
/// Each method is one request/response round trip. Implementations map
/// broker failures to [`QueueClientError::TransportError`] and report a dead
/// lease as [`QueueClientError::InvalidHandle`]. They must not retry.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Long-polls for up to `max_number_of_messages` messages, returning no
    /// later than `wait_time_seconds`. An empty queue yields an empty vector.
    async fn receive(&self, request: ReceiveRequest) -> Result<Vec<Message>, QueueClientError>;

    async fn send(&self, request: SendRequest) -> Result<SendReceipt, QueueClientError>;

    async fn send_batch(
        &self,
        request: SendBatchRequest,
    ) -> Result<SendBatchResponse, QueueClientError>;

    async fn delete(&self, request: DeleteRequest) -> Result<(), QueueClientError>;

    async fn change_visibility(
        &self,
        request: ChangeVisibilityRequest,
    ) -> Result<(), QueueClientError>;
}
