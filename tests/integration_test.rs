//! Tests against a real SQS FIFO queue.
//!
//! Run with `cargo test -- --ignored` after setting `TEST_SQS_QUEUE_URL`
//! (a `.env` file is honoured) and the usual AWS credentials.

use rs_sqs_client::{OutboundMessage, QueueClient, QueueClientError};
use std::env;
use std::time::Duration;
use tokio::time::timeout;

async fn live_client() -> QueueClient {
    dotenvy::dotenv().ok();

    let queue_url = env::var("TEST_SQS_QUEUE_URL").expect("TEST_SQS_QUEUE_URL must be set");
    QueueClient::connect(queue_url, None)
        .await
        .expect("SQS client should initialize from the environment")
}

async fn drain(client: &QueueClient) {
    loop {
        let messages = client
            .receive_messages(None, Some(1))
            .await
            .expect("Failed to drain queue");
        if messages.is_empty() {
            break;
        }
        for message in messages {
            client
                .delete_message(&message.receipt_handle)
                .await
                .expect("Failed to delete drained message");
        }
    }
}

#[tokio::test]
#[ignore = "requires TEST_SQS_QUEUE_URL and AWS credentials"]
async fn test_sqs_send_receive_delete() {
    let client = live_client().await;
    drain(&client).await;

    client
        .send_message("Test message 1")
        .await
        .expect("Failed to send test message 1");

    let received = timeout(Duration::from_secs(30), async {
        loop {
            let messages = client
                .receive_messages(Some(1), Some(5))
                .await
                .expect("Failed to receive messages");
            if let Some(message) = messages.into_iter().next() {
                break message;
            }
        }
    })
    .await
    .expect("Test timed out waiting for the message");

    assert_eq!(received.body, "Test message 1");
    assert!(received.deduplication_id().is_some());

    client
        .delete_message(&received.receipt_handle)
        .await
        .expect("Failed to delete message");

    let remaining = client
        .receive_messages(Some(1), Some(1))
        .await
        .expect("Failed to receive messages");
    assert!(remaining.is_empty());
}

#[tokio::test]
#[ignore = "requires TEST_SQS_QUEUE_URL and AWS credentials"]
async fn test_sqs_batch_with_duplicate_ids() {
    let client = live_client().await;

    let results = client
        .send_messages(&[
            OutboundMessage::new("a", "x"),
            OutboundMessage::new("a", "y"),
        ])
        .await
        .expect("duplicate ids must be reported per entry");

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|result| !result.is_success()));
}

#[tokio::test]
#[ignore = "requires TEST_SQS_QUEUE_URL and AWS credentials"]
async fn test_sqs_rejects_unknown_queue() {
    dotenvy::dotenv().ok();

    let client = QueueClient::connect(
        "https://sqs.us-east-1.amazonaws.com/000000000000/does-not-exist.fifo",
        None,
    )
    .await
    .expect("SQS client should initialize from the environment");

    let err = client
        .receive_messages(Some(1), Some(1))
        .await
        .expect_err("unknown queue must fail");
    assert!(matches!(err, QueueClientError::TransportError(_)));
}
