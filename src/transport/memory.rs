//! Embedded stub broker.
//!
//! `InMemoryBroker` behaves like a FIFO SQS queue closely enough to test a
//! queue client against it:
//! - received messages are leased for the requested visibility timeout and
//!   become available again when the lease lapses,
//! - every lease gets a fresh receipt handle; a lapsed handle is rejected,
//! - receives long-poll and wake up as soon as a message arrives,
//! - deduplication ids are remembered for a five minute window,
//! - messages sharing a group id are handed out one lease at a time,
//! - batch sends report per-entry failures.
//!
//! All timing uses `tokio::time`, so tests can drive it with paused time.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use md5::{Digest, Md5};
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::{debug, trace};
use uuid::Uuid;

use super::{
    BatchFailure, BatchSuccess, ChangeVisibilityRequest, DeleteRequest, ReceiveRequest,
    SendBatchRequest, SendBatchResponse, SendRequest, Transport,
};
use crate::config::{MAX_BATCH_ENTRIES, MAX_RECEIVE_MESSAGES};
use crate::errors::{QueueClientError, TransportError};
use crate::message::{Message, SendReceipt};

const RECEIPT_HANDLE_PREFIX: &str = "rh-";
const MAX_WAIT_TIME_SECONDS: i32 = 20;
const MAX_VISIBILITY_TIMEOUT: i32 = 43_200;
const MAX_DELAY_SECONDS: i32 = 900;

/// Settings of the stub broker.
#[derive(Debug, Clone)]
pub struct InMemoryBrokerConfig {
    /// Largest accepted body, in bytes.
    pub max_message_size: usize,

    /// How long a deduplication id suppresses repeated sends.
    pub deduplication_window: Duration,

    /// Derive a deduplication id from the body when the sender gives none.
    pub content_based_deduplication: bool,

    /// Value reported in the `SenderId` attribute.
    pub sender_id: String,
}

impl Default for InMemoryBrokerConfig {
    fn default() -> Self {
        InMemoryBrokerConfig {
            max_message_size: 256 * 1024,
            deduplication_window: Duration::from_secs(300),
            content_based_deduplication: false,
            sender_id: "in-memory".to_string(),
        }
    }
}

/// Snapshot of how many messages a queue holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueDepth {
    /// Messages that can be received (including delayed ones).
    pub available: usize,
    /// Messages currently leased to a receiver.
    pub in_flight: usize,
}

#[derive(Debug, Clone)]
struct StoredMessage {
    message_id: String,
    body: String,
    body_checksum: String,
    deduplication_id: Option<String>,
    group_id: Option<String>,
    sequence_number: u64,
    sent_timestamp: u128,
    visible_at: Instant,
    receive_count: u32,
    first_receive_timestamp: Option<u128>,
}

#[derive(Debug)]
struct Lease {
    message: StoredMessage,
    deadline: Instant,
}

#[derive(Debug, Default)]
struct QueueState {
    available: VecDeque<StoredMessage>,
    in_flight: HashMap<String, Lease>,
    /// Deleted handles, kept until their lease would have lapsed.
    deleted_handles: HashMap<String, Instant>,
    deduplication: HashMap<String, (SendReceipt, Instant)>,
    next_sequence: u64,
}

impl QueueState {
    /// Returns lapsed leases to the queue, keeping send order.
    fn reclaim_expired(&mut self, now: Instant) {
        self.deleted_handles.retain(|_, lease_deadline| *lease_deadline > now);

        let expired: Vec<String> = self
            .in_flight
            .iter()
            .filter(|(_, lease)| lease.deadline <= now)
            .map(|(handle, _)| handle.clone())
            .collect();

        for handle in expired {
            if let Some(lease) = self.in_flight.remove(&handle) {
                trace!(message_id = %lease.message.message_id, "lease expired");
                self.make_available(lease.message);
            }
        }
    }

    fn make_available(&mut self, message: StoredMessage) {
        let position = self
            .available
            .iter()
            .position(|queued| queued.sequence_number > message.sequence_number)
            .unwrap_or(self.available.len());
        self.available.insert(position, message);
    }

    /// Earliest instant at which something may become receivable.
    fn next_change(&self, now: Instant) -> Option<Instant> {
        let delayed = self
            .available
            .iter()
            .map(|message| message.visible_at)
            .filter(|visible_at| *visible_at > now);
        let leases = self.in_flight.values().map(|lease| lease.deadline);
        delayed.chain(leases).min()
    }

    fn lease_messages(
        &mut self,
        max: usize,
        visibility_timeout: Duration,
        sender_id: &str,
        now: Instant,
    ) -> Vec<Message> {
        let mut locked_groups: HashSet<String> = self
            .in_flight
            .values()
            .filter_map(|lease| lease.message.group_id.clone())
            .collect();

        let mut picked = Vec::new();
        for (index, message) in self.available.iter().enumerate() {
            if picked.len() >= max {
                break;
            }
            if message.visible_at > now {
                continue;
            }
            if let Some(group_id) = &message.group_id {
                if !locked_groups.insert(group_id.clone()) {
                    continue;
                }
            }
            picked.push(index);
        }

        let mut leased = Vec::with_capacity(picked.len());
        for index in picked.into_iter().rev() {
            if let Some(mut message) = self.available.remove(index) {
                let now_millis = unix_millis();
                message.receive_count += 1;
                message.first_receive_timestamp.get_or_insert(now_millis);

                let receipt_handle = format!("{RECEIPT_HANDLE_PREFIX}{}", Uuid::new_v4().simple());
                leased.push(received_view(&message, &receipt_handle, sender_id));
                self.in_flight.insert(
                    receipt_handle,
                    Lease {
                        message,
                        deadline: now + visibility_timeout,
                    },
                );
            }
        }
        leased.reverse();
        leased
    }
}

fn received_view(message: &StoredMessage, receipt_handle: &str, sender_id: &str) -> Message {
    let mut attributes = HashMap::from([
        (Message::SENDER_ID.to_string(), sender_id.to_string()),
        (
            Message::SENT_TIMESTAMP.to_string(),
            message.sent_timestamp.to_string(),
        ),
        (
            Message::APPROXIMATE_RECEIVE_COUNT.to_string(),
            message.receive_count.to_string(),
        ),
        (
            Message::SEQUENCE_NUMBER.to_string(),
            format!("{:020}", message.sequence_number),
        ),
    ]);
    if let Some(first) = message.first_receive_timestamp {
        attributes.insert(
            Message::APPROXIMATE_FIRST_RECEIVE_TIMESTAMP.to_string(),
            first.to_string(),
        );
    }
    if let Some(deduplication_id) = &message.deduplication_id {
        attributes.insert(
            Message::MESSAGE_DEDUPLICATION_ID.to_string(),
            deduplication_id.clone(),
        );
    }
    if let Some(group_id) = &message.group_id {
        attributes.insert(Message::MESSAGE_GROUP_ID.to_string(), group_id.clone());
    }

    Message {
        id: message.message_id.clone(),
        receipt_handle: receipt_handle.to_string(),
        body_checksum: message.body_checksum.clone(),
        body: message.body.clone(),
        attributes,
    }
}

fn md5_hex(data: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

fn unix_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default()
}

fn invalid_parameter(operation: &str, message: impl Into<String>) -> QueueClientError {
    TransportError::new(operation, message)
        .with_code("InvalidParameterValue")
        .into()
}

fn seconds(value: i32) -> Duration {
    Duration::from_secs(u64::try_from(value).unwrap_or_default())
}

/// In-process [`Transport`] with SQS FIFO semantics.
///
/// Cloning yields another handle to the same queues.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    queues: Arc<Mutex<HashMap<String, QueueState>>>,
    arrivals: Arc<Notify>,
    config: Arc<InMemoryBrokerConfig>,
}

impl InMemoryBroker {
    pub fn new(config: InMemoryBrokerConfig) -> Self {
        InMemoryBroker {
            queues: Arc::default(),
            arrivals: Arc::default(),
            config: Arc::new(config),
        }
    }

    /// Creates `queue_url` if it does not exist yet.
    pub fn create_queue(&self, queue_url: impl Into<String>) {
        self.lock().entry(queue_url.into()).or_default();
    }

    /// Returns `None` when the queue does not exist.
    pub fn queue_depth(&self, queue_url: &str) -> Option<QueueDepth> {
        let now = Instant::now();
        let mut queues = self.lock();
        let queue = queues.get_mut(queue_url)?;
        queue.reclaim_expired(now);
        Some(QueueDepth {
            available: queue.available.len(),
            in_flight: queue.in_flight.len(),
        })
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, QueueState>> {
        // Every mutation completes before the guard drops, so a poisoned map is intact.
        self.queues.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_queue<T>(
        &self,
        operation: &str,
        queue_url: &str,
        f: impl FnOnce(&mut QueueState) -> Result<T, QueueClientError>,
    ) -> Result<T, QueueClientError> {
        let now = Instant::now();
        let mut queues = self.lock();
        let queue = queues.get_mut(queue_url).ok_or_else(|| {
            TransportError::new(operation, format!("queue {queue_url} does not exist"))
                .with_code("AWS.SimpleQueueService.NonExistentQueue")
        })?;
        queue.reclaim_expired(now);
        f(queue)
    }

    fn validate_body(&self, operation: &str, body: &str) -> Result<(), QueueClientError> {
        if body.is_empty() {
            return Err(invalid_parameter(operation, "message body must not be empty"));
        }
        if body.len() > self.config.max_message_size {
            return Err(invalid_parameter(
                operation,
                format!(
                    "message body is {} bytes, limit is {}",
                    body.len(),
                    self.config.max_message_size
                ),
            ));
        }
        Ok(())
    }

    fn validate_handle(operation: &str, receipt_handle: &str) -> Result<(), QueueClientError> {
        let well_formed = receipt_handle
            .strip_prefix(RECEIPT_HANDLE_PREFIX)
            .is_some_and(|rest| !rest.is_empty());
        if well_formed {
            Ok(())
        } else {
            Err(TransportError::new(operation, "receipt handle is malformed")
                .with_code("ReceiptHandleIsInvalid")
                .into())
        }
    }

    fn enqueue(
        &self,
        queue: &mut QueueState,
        body: &str,
        delay_seconds: i32,
        deduplication_id: Option<String>,
        group_id: Option<String>,
    ) -> SendReceipt {
        let now = Instant::now();
        let body_checksum = md5_hex(body.as_bytes());
        let deduplication_id = deduplication_id.or_else(|| {
            self.config
                .content_based_deduplication
                .then(|| body_checksum.clone())
        });

        let window = self.config.deduplication_window;
        queue
            .deduplication
            .retain(|_, (_, sent_at)| now.duration_since(*sent_at) < window);
        if let Some(id) = &deduplication_id {
            if let Some((receipt, _)) = queue.deduplication.get(id) {
                debug!(deduplication_id = %id, "duplicate send suppressed");
                return receipt.clone();
            }
        }

        queue.next_sequence += 1;
        let message = StoredMessage {
            message_id: Uuid::new_v4().to_string(),
            body: body.to_string(),
            body_checksum,
            deduplication_id: deduplication_id.clone(),
            group_id,
            sequence_number: queue.next_sequence,
            sent_timestamp: unix_millis(),
            visible_at: now + seconds(delay_seconds),
            receive_count: 0,
            first_receive_timestamp: None,
        };
        let receipt = SendReceipt {
            message_id: message.message_id.clone(),
            body_checksum: message.body_checksum.clone(),
        };

        if let Some(id) = deduplication_id {
            queue.deduplication.insert(id, (receipt.clone(), now));
        }
        queue.available.push_back(message);
        receipt
    }
}

#[async_trait]
impl Transport for InMemoryBroker {
    async fn receive(&self, request: ReceiveRequest) -> Result<Vec<Message>, QueueClientError> {
        const OPERATION: &str = "ReceiveMessage";

        if !(1..=MAX_RECEIVE_MESSAGES).contains(&request.max_number_of_messages) {
            return Err(invalid_parameter(
                OPERATION,
                format!(
                    "MaxNumberOfMessages must be between 1 and {MAX_RECEIVE_MESSAGES}, got {}",
                    request.max_number_of_messages
                ),
            ));
        }
        if !(0..=MAX_WAIT_TIME_SECONDS).contains(&request.wait_time_seconds) {
            return Err(invalid_parameter(
                OPERATION,
                format!(
                    "WaitTimeSeconds must be between 0 and {MAX_WAIT_TIME_SECONDS}, got {}",
                    request.wait_time_seconds
                ),
            ));
        }
        if !(0..=MAX_VISIBILITY_TIMEOUT).contains(&request.visibility_timeout) {
            return Err(invalid_parameter(
                OPERATION,
                format!(
                    "VisibilityTimeout must be between 0 and {MAX_VISIBILITY_TIMEOUT}, got {}",
                    request.visibility_timeout
                ),
            ));
        }

        let max = request.max_number_of_messages as usize;
        let visibility_timeout = seconds(request.visibility_timeout);
        let poll_deadline = Instant::now() + seconds(request.wait_time_seconds);

        loop {
            // Register interest before inspecting the queue so a send that
            // lands in between is not missed.
            let arrival = self.arrivals.notified();
            tokio::pin!(arrival);
            arrival.as_mut().enable();

            let now = Instant::now();
            let (leased, next_change) =
                self.with_queue(OPERATION, &request.queue_url, |queue| {
                    let leased =
                        queue.lease_messages(max, visibility_timeout, &self.config.sender_id, now);
                    Ok((leased, queue.next_change(now)))
                })?;

            if !leased.is_empty() || now >= poll_deadline {
                trace!(
                    queue_url = %request.queue_url,
                    count = leased.len(),
                    "receive completed"
                );
                return Ok(leased);
            }

            let wake_at = next_change.map_or(poll_deadline, |at| at.min(poll_deadline));
            tokio::select! {
                _ = &mut arrival => {}
                _ = tokio::time::sleep_until(wake_at) => {}
            }
        }
    }

    async fn send(&self, request: SendRequest) -> Result<SendReceipt, QueueClientError> {
        const OPERATION: &str = "SendMessage";

        self.validate_body(OPERATION, &request.body)?;
        if !(0..=MAX_DELAY_SECONDS).contains(&request.delay_seconds) {
            return Err(invalid_parameter(
                OPERATION,
                format!(
                    "DelaySeconds must be between 0 and {MAX_DELAY_SECONDS}, got {}",
                    request.delay_seconds
                ),
            ));
        }

        let receipt = self.with_queue(OPERATION, &request.queue_url, |queue| {
            Ok(self.enqueue(
                queue,
                &request.body,
                request.delay_seconds,
                request.deduplication_id,
                request.group_id,
            ))
        })?;
        self.arrivals.notify_waiters();
        Ok(receipt)
    }

    async fn send_batch(
        &self,
        request: SendBatchRequest,
    ) -> Result<SendBatchResponse, QueueClientError> {
        const OPERATION: &str = "SendMessageBatch";

        if request.entries.is_empty() {
            return Err(TransportError::new(OPERATION, "batch request contains no entries")
                .with_code("AWS.SimpleQueueService.EmptyBatchRequest")
                .into());
        }
        if request.entries.len() > MAX_BATCH_ENTRIES {
            return Err(TransportError::new(
                OPERATION,
                format!(
                    "batch request contains {} entries, limit is {MAX_BATCH_ENTRIES}",
                    request.entries.len()
                ),
            )
            .with_code("AWS.SimpleQueueService.TooManyEntriesInBatchRequest")
            .into());
        }

        let response = self.with_queue(OPERATION, &request.queue_url, |queue| {
            let mut response = SendBatchResponse::default();
            let mut seen_ids = HashSet::new();

            for entry in request.entries {
                if !seen_ids.insert(entry.id.clone()) {
                    response.failed.push(BatchFailure {
                        id: entry.id,
                        code: "AWS.SimpleQueueService.BatchEntryIdsNotDistinct".to_string(),
                        message: Some("entry id already used in this batch".to_string()),
                        sender_fault: true,
                    });
                    continue;
                }

                let valid = self.validate_body(OPERATION, &entry.body).and_then(|()| {
                    if (0..=MAX_DELAY_SECONDS).contains(&entry.delay_seconds) {
                        Ok(())
                    } else {
                        Err(invalid_parameter(OPERATION, "DelaySeconds out of range"))
                    }
                });
                if let Err(err) = valid {
                    response.failed.push(BatchFailure {
                        id: entry.id,
                        code: err.code().unwrap_or("InvalidParameterValue").to_string(),
                        message: Some(err.to_string()),
                        sender_fault: true,
                    });
                    continue;
                }

                let receipt = self.enqueue(
                    queue,
                    &entry.body,
                    entry.delay_seconds,
                    entry.deduplication_id,
                    entry.group_id,
                );
                response.successful.push(BatchSuccess {
                    id: entry.id,
                    message_id: receipt.message_id,
                    body_checksum: receipt.body_checksum,
                });
            }
            Ok(response)
        })?;

        if !response.successful.is_empty() {
            self.arrivals.notify_waiters();
        }
        Ok(response)
    }

    async fn delete(&self, request: DeleteRequest) -> Result<(), QueueClientError> {
        const OPERATION: &str = "DeleteMessage";

        Self::validate_handle(OPERATION, &request.receipt_handle)?;
        let removed = self.with_queue(OPERATION, &request.queue_url, |queue| {
            if let Some(lease) = queue.in_flight.remove(&request.receipt_handle) {
                queue
                    .deleted_handles
                    .insert(request.receipt_handle, lease.deadline);
                Ok(lease.message.group_id.is_some())
            } else if queue.deleted_handles.contains_key(&request.receipt_handle) {
                Ok(false)
            } else {
                Err(QueueClientError::InvalidHandle {
                    receipt_handle: request.receipt_handle,
                })
            }
        })?;

        // Removing a lease unlocks its group for waiting receivers.
        if removed {
            self.arrivals.notify_waiters();
        }
        Ok(())
    }

    async fn change_visibility(
        &self,
        request: ChangeVisibilityRequest,
    ) -> Result<(), QueueClientError> {
        const OPERATION: &str = "ChangeMessageVisibility";

        Self::validate_handle(OPERATION, &request.receipt_handle)?;
        if !(0..=MAX_VISIBILITY_TIMEOUT).contains(&request.visibility_timeout) {
            return Err(invalid_parameter(
                OPERATION,
                format!(
                    "VisibilityTimeout must be between 0 and {MAX_VISIBILITY_TIMEOUT}, got {}",
                    request.visibility_timeout
                ),
            ));
        }

        let released = self.with_queue(OPERATION, &request.queue_url, |queue| {
            let Some(lease) = queue.in_flight.get_mut(&request.receipt_handle) else {
                return Err(QueueClientError::InvalidHandle {
                    receipt_handle: request.receipt_handle,
                });
            };

            if request.visibility_timeout == 0 {
                if let Some(lease) = queue.in_flight.remove(&request.receipt_handle) {
                    queue.make_available(lease.message);
                }
                Ok(true)
            } else {
                lease.deadline = Instant::now() + seconds(request.visibility_timeout);
                Ok(false)
            }
        })?;

        if released {
            self.arrivals.notify_waiters();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUEUE: &str = "https://sqs.local/000000000000/test.fifo";

    fn broker() -> InMemoryBroker {
        let broker = InMemoryBroker::default();
        broker.create_queue(QUEUE);
        broker
    }

    fn send_request(body: &str, group_id: Option<&str>) -> SendRequest {
        SendRequest {
            queue_url: QUEUE.to_string(),
            body: body.to_string(),
            delay_seconds: 0,
            deduplication_id: None,
            group_id: group_id.map(str::to_string),
        }
    }

    fn receive_request(max: i32, wait: i32) -> ReceiveRequest {
        ReceiveRequest {
            queue_url: QUEUE.to_string(),
            max_number_of_messages: max,
            wait_time_seconds: wait,
            visibility_timeout: 30,
        }
    }

    #[test]
    fn checksum_is_md5_hex_of_body() {
        assert_eq!(md5_hex(b"hello"), "5d41402abc4b2a76b9719d911017c592");
    }

    #[tokio::test(start_paused = true)]
    async fn group_is_leased_to_one_receiver_at_a_time() {
        let broker = broker();
        broker.send(send_request("first", Some("g"))).await.unwrap();
        broker.send(send_request("second", Some("g"))).await.unwrap();

        let first = broker.receive(receive_request(10, 0)).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].body, "first");

        let blocked = broker.receive(receive_request(10, 0)).await.unwrap();
        assert!(blocked.is_empty());

        broker
            .delete(DeleteRequest {
                queue_url: QUEUE.to_string(),
                receipt_handle: first[0].receipt_handle.clone(),
            })
            .await
            .unwrap();

        let second = broker.receive(receive_request(10, 0)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].body, "second");
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_messages_stay_hidden_until_due() {
        let broker = broker();
        let mut request = send_request("later", None);
        request.delay_seconds = 5;
        broker.send(request).await.unwrap();

        assert!(broker.receive(receive_request(1, 0)).await.unwrap().is_empty());

        let started = Instant::now();
        let received = broker.receive(receive_request(1, 20)).await.unwrap();
        assert_eq!(received.len(), 1);
        assert!(started.elapsed() >= Duration::from_secs(5));
        assert!(started.elapsed() < Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn deleted_handles_are_forgotten_once_the_lease_would_have_lapsed() {
        let broker = broker();
        broker.send(send_request("x", None)).await.unwrap();
        let leased = broker.receive(receive_request(1, 0)).await.unwrap();
        let delete = DeleteRequest {
            queue_url: QUEUE.to_string(),
            receipt_handle: leased[0].receipt_handle.clone(),
        };

        broker.delete(delete.clone()).await.unwrap();
        broker.delete(delete.clone()).await.unwrap();
        assert_eq!(broker.lock()[QUEUE].deleted_handles.len(), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        let err = broker.delete(delete).await.unwrap_err();
        assert!(matches!(err, QueueClientError::InvalidHandle { .. }));
        assert!(broker.lock()[QUEUE].deleted_handles.is_empty());
    }

    #[tokio::test]
    async fn unknown_queue_is_a_transport_error() {
        let broker = InMemoryBroker::default();
        let err = broker.send(send_request("x", None)).await.unwrap_err();
        assert_eq!(err.code(), Some("AWS.SimpleQueueService.NonExistentQueue"));
    }

    #[tokio::test]
    async fn out_of_range_receive_parameters_are_rejected() {
        let broker = broker();
        for request in [
            receive_request(0, 0),
            receive_request(11, 0),
            receive_request(1, 21),
            ReceiveRequest {
                visibility_timeout: -1,
                ..receive_request(1, 0)
            },
        ] {
            let err = broker.receive(request).await.unwrap_err();
            assert_eq!(err.code(), Some("InvalidParameterValue"));
        }
    }

    #[tokio::test]
    async fn content_based_deduplication_uses_the_body() {
        let broker = InMemoryBroker::new(InMemoryBrokerConfig {
            content_based_deduplication: true,
            ..InMemoryBrokerConfig::default()
        });
        broker.create_queue(QUEUE);

        let first = broker.send(send_request("same", None)).await.unwrap();
        let second = broker.send(send_request("same", None)).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(
            broker.queue_depth(QUEUE),
            Some(QueueDepth {
                available: 1,
                in_flight: 0
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn deduplication_window_expires() {
        let broker = broker();
        let mut request = send_request("x", None);
        request.deduplication_id = Some("d-1".to_string());

        let first = broker.send(request.clone()).await.unwrap();
        tokio::time::advance(Duration::from_secs(301)).await;
        let second = broker.send(request).await.unwrap();

        assert_ne!(first.message_id, second.message_id);
        assert_eq!(broker.queue_depth(QUEUE).map(|depth| depth.available), Some(2));
    }
}
