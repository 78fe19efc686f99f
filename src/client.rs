use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use tracing::debug;

use crate::config::{DeduplicationPolicy, GroupingPolicy, ReceiveConfig, SendPolicy};
use crate::connection::Connection;
use crate::errors::{QueueClientError, TransportError};
use crate::id::{IdGenerator, UuidGenerator};
use crate::message::{BatchResultEntry, Message, OutboundMessage, SendReceipt};
use crate::transport::{
    BatchFailure, BatchSuccess, ChangeVisibilityRequest, DeleteRequest, ReceiveRequest,
    SendBatchRequest, SendBatchRequestEntry, SendRequest, SqsTransport, Transport,
};

/// Client for a single queue.
///
/// Every operation is one independent round trip through the [`Transport`].
/// The client holds no queue state, performs no retries and may be shared
/// between tasks (it is cheap to clone).
///
/// # Example
///
/// ```rust,no_run
/// use rs_sqs_client::QueueClient;
///
/// # async fn run() -> Result<(), rs_sqs_client::errors::QueueClientError> {
/// let client = QueueClient::connect(
///     "https://sqs.us-east-1.amazonaws.com/123456789012/orders.fifo",
///     None,
/// )
/// .await?;
///
/// client.send_message("hello").await?;
/// for message in client.receive_messages(Some(1), Some(5)).await? {
///     println!("{}", message.body);
///     client.delete_message(&message.receipt_handle).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueueClient {
    queue_url: String,
    transport: Arc<dyn Transport>,
    id_generator: Arc<dyn IdGenerator>,
    send_policy: SendPolicy,
    receive_config: ReceiveConfig,
}

impl QueueClient {
    /// Creates a client for `queue_url` talking through `transport`, with the
    /// default send policy and receive configuration.
    pub fn new(queue_url: impl Into<String>, transport: impl Transport + 'static) -> Self {
        Self::with_transport(queue_url, Arc::new(transport))
    }

    pub fn with_transport(queue_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        QueueClient {
            queue_url: queue_url.into(),
            transport,
            id_generator: Arc::new(UuidGenerator),
            send_policy: SendPolicy::default(),
            receive_config: ReceiveConfig::default(),
        }
    }

    /// Creates a client backed by AWS SQS.
    ///
    /// # Arguments
    ///
    /// * `queue_url` - The SQS queue URL
    /// * `connection` - Optional region/credential overrides; `None` resolves
    ///   everything from the environment
    pub async fn connect(
        queue_url: impl Into<String>,
        connection: Option<Connection>,
    ) -> Result<Self, QueueClientError> {
        let transport = SqsTransport::connect(&connection.unwrap_or_default()).await?;
        Ok(Self::new(queue_url, transport))
    }

    pub fn with_id_generator(mut self, id_generator: impl IdGenerator + 'static) -> Self {
        self.id_generator = Arc::new(id_generator);
        self
    }

    pub fn with_send_policy(mut self, send_policy: SendPolicy) -> Self {
        self.send_policy = send_policy;
        self
    }

    pub fn with_receive_config(mut self, receive_config: ReceiveConfig) -> Self {
        self.receive_config = receive_config;
        self
    }

    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    /// Receives up to `max_messages` messages, long-polling for at most
    /// `wait_seconds`.
    ///
    /// `None` or `0` asks for the configured default (10); larger values are
    /// capped at 10. Received messages are leased for the configured
    /// visibility timeout (30 seconds by default) and are redelivered if not
    /// deleted before it lapses. An empty queue yields an empty vector.
    pub async fn receive_messages(
        &self,
        max_messages: Option<i32>,
        wait_seconds: Option<i32>,
    ) -> Result<Vec<Message>, QueueClientError> {
        let max_number_of_messages = self.receive_config.effective_max_messages(max_messages);
        let request = ReceiveRequest {
            queue_url: self.queue_url.clone(),
            max_number_of_messages,
            wait_time_seconds: self.receive_config.effective_wait_seconds(wait_seconds),
            visibility_timeout: self.receive_config.visibility_timeout,
        };

        let mut messages = self.transport.receive(request).await?;
        messages.truncate(max_number_of_messages as usize);

        debug!(queue_url = %self.queue_url, count = messages.len(), "received messages");
        Ok(messages)
    }

    /// Sends one message with zero delay.
    ///
    /// Under the default [`SendPolicy`] every call carries a fresh random
    /// deduplication id and a fresh random group id: nothing is ever
    /// deduplicated and no ordering is implied between calls.
    pub async fn send_message(&self, body: impl Into<String>) -> Result<SendReceipt, QueueClientError> {
        let request = SendRequest {
            queue_url: self.queue_url.clone(),
            body: body.into(),
            delay_seconds: 0,
            deduplication_id: self.deduplication_id(),
            group_id: match &self.send_policy.grouping {
                GroupingPolicy::PerMessage => Some(self.id_generator.next_id()),
                GroupingPolicy::Fixed(group_id) => Some(group_id.clone()),
                GroupingPolicy::Omit => None,
            },
        };

        let receipt = self.transport.send(request).await?;
        debug!(queue_url = %self.queue_url, message_id = %receipt.message_id, "sent message");
        Ok(receipt)
    }

    /// Sends up to ten messages in one request.
    ///
    /// Returns exactly one [`BatchResultEntry`] per entry, in input order.
    /// Some entries may fail while others succeed; inspect each result.
    /// Entry ids should be unique: duplicates are forwarded as-is and the
    /// broker's verdict is reported on the affected entries.
    ///
    /// # Errors
    ///
    /// Fails as a whole only when the request cannot be submitted (empty or
    /// oversized batch, authentication, network).
    pub async fn send_messages(
        &self,
        entries: &[OutboundMessage],
    ) -> Result<Vec<BatchResultEntry>, QueueClientError> {
        let request = SendBatchRequest {
            queue_url: self.queue_url.clone(),
            entries: entries
                .iter()
                .map(|entry| SendBatchRequestEntry {
                    id: entry.id.clone(),
                    body: entry.body.clone(),
                    delay_seconds: 0,
                    deduplication_id: self.deduplication_id(),
                    group_id: match &self.send_policy.grouping {
                        GroupingPolicy::PerMessage => Some(entry.id.clone()),
                        GroupingPolicy::Fixed(group_id) => Some(group_id.clone()),
                        GroupingPolicy::Omit => None,
                    },
                })
                .collect(),
        };

        let response = self.transport.send_batch(request).await?;
        let results = align_batch_results(entries, response.successful, response.failed);

        debug!(
            queue_url = %self.queue_url,
            entries = results.len(),
            failed = results.iter().filter(|result| !result.is_success()).count(),
            "sent message batch"
        );
        Ok(results)
    }

    /// Deletes a received message so it is never redelivered.
    ///
    /// Deleting an already deleted handle succeeds again. A handle whose lease
    /// has lapsed fails with [`QueueClientError::InvalidHandle`].
    pub async fn delete_message(&self, receipt_handle: &str) -> Result<(), QueueClientError> {
        check_receipt_handle("DeleteMessage", receipt_handle)?;

        self.transport
            .delete(DeleteRequest {
                queue_url: self.queue_url.clone(),
                receipt_handle: receipt_handle.to_string(),
            })
            .await?;

        debug!(queue_url = %self.queue_url, "deleted message");
        Ok(())
    }

    /// Changes the remaining lease of a received message. `0` releases it for
    /// immediate redelivery.
    pub async fn change_message_visibility(
        &self,
        receipt_handle: &str,
        visibility_timeout: i32,
    ) -> Result<(), QueueClientError> {
        check_receipt_handle("ChangeMessageVisibility", receipt_handle)?;

        self.transport
            .change_visibility(ChangeVisibilityRequest {
                queue_url: self.queue_url.clone(),
                receipt_handle: receipt_handle.to_string(),
                visibility_timeout,
            })
            .await
    }

    fn deduplication_id(&self) -> Option<String> {
        match self.send_policy.deduplication {
            DeduplicationPolicy::FreshToken => Some(self.id_generator.next_id()),
            DeduplicationPolicy::Omit => None,
        }
    }
}

fn check_receipt_handle(operation: &str, receipt_handle: &str) -> Result<(), QueueClientError> {
    if receipt_handle.trim().is_empty() {
        return Err(TransportError::new(operation, "receipt handle must not be empty")
            .with_code("MalformedReceiptHandle")
            .into());
    }
    Ok(())
}

enum Outcome {
    Success(BatchSuccess),
    Failure(BatchFailure),
}

/// Maps the broker's id-keyed results back onto input positions.
///
/// For an id used more than once, results are consumed in order of
/// occurrence with successes first. An entry the broker did not report on
/// becomes a `MissingBatchResult` failure.
fn align_batch_results(
    entries: &[OutboundMessage],
    successful: Vec<BatchSuccess>,
    failed: Vec<BatchFailure>,
) -> Vec<BatchResultEntry> {
    let mut outcomes: HashMap<String, VecDeque<Outcome>> = HashMap::new();
    for success in successful {
        outcomes
            .entry(success.id.clone())
            .or_default()
            .push_back(Outcome::Success(success));
    }
    for failure in failed {
        outcomes
            .entry(failure.id.clone())
            .or_default()
            .push_back(Outcome::Failure(failure));
    }

    entries
        .iter()
        .enumerate()
        .map(|(position, entry)| {
            match outcomes.get_mut(&entry.id).and_then(VecDeque::pop_front) {
                Some(Outcome::Success(success)) => BatchResultEntry::Success {
                    position,
                    id: success.id,
                    message_id: success.message_id,
                    body_checksum: success.body_checksum,
                },
                Some(Outcome::Failure(failure)) => BatchResultEntry::Failure {
                    position,
                    id: failure.id,
                    code: failure.code,
                    message: failure.message,
                    sender_fault: failure.sender_fault,
                },
                None => BatchResultEntry::Failure {
                    position,
                    id: entry.id.clone(),
                    code: "MissingBatchResult".to_string(),
                    message: Some("broker returned no result for this entry".to_string()),
                    sender_fault: false,
                },
            }
        })
        .collect()
}
