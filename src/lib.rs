//! # SQS Queue Client
//!
//! A small asynchronous client for a managed message queue (AWS SQS), built
//! around a pluggable broker [`Transport`](transport::Transport).
//!
//! ## Features
//!
//! - Long-polling receive with a fixed visibility timeout
//! - Single and batch send with per-entry results
//! - Idempotent delete and lease changes by receipt handle
//! - Configurable deduplication and grouping ids
//! - AWS SQS transport and an in-memory stub broker for tests
//!
//! Delivery is at-least-once: a message whose lease lapses before it is
//! deleted is handed out again, so handlers must tolerate duplicates. The
//! client never retries; wrap calls yourself if you need resilience.
//!
//! ## Quick Start
//!
//! ```rust
//! use rs_sqs_client::{transport::InMemoryBroker, QueueClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let broker = InMemoryBroker::default();
//!     broker.create_queue("Q1");
//!     let client = QueueClient::new("Q1", broker);
//!
//!     client.send_message("hello").await?;
//!     let messages = client.receive_messages(Some(1), Some(5)).await?;
//!     for message in &messages {
//!         println!("Processing message: {}", message.body);
//!         client.delete_message(&message.receipt_handle).await?;
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod errors;
pub mod id;
pub mod message;
pub mod transport;

pub use client::QueueClient;
pub use config::{DeduplicationPolicy, GroupingPolicy, ReceiveConfig, SendPolicy};
pub use connection::Connection;
pub use errors::{QueueClientError, TransportError};
pub use id::{IdGenerator, UuidGenerator};
pub use message::{BatchResultEntry, Message, OutboundMessage, SendReceipt};
