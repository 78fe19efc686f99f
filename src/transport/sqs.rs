use async_trait::async_trait;
use aws_sdk_sqs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_sqs::operation::delete_message::DeleteMessageError;
use aws_sdk_sqs::operation::send_message_batch::SendMessageBatchError;
use aws_sdk_sqs::types::{MessageSystemAttributeName, SendMessageBatchRequestEntry};
use tracing::{debug, warn};

use super::{
    BatchFailure, BatchSuccess, ChangeVisibilityRequest, DeleteRequest, ReceiveRequest,
    SendBatchRequest, SendBatchResponse, SendRequest, Transport,
};
use crate::connection::{create_sqs_client, Connection};
use crate::errors::{QueueClientError, TransportError};
use crate::message::{Message, SendReceipt};

const BATCH_ENTRY_IDS_NOT_DISTINCT: &str = "AWS.SimpleQueueService.BatchEntryIdsNotDistinct";

/// [`Transport`] backed by the managed AWS SQS service.
#[derive(Debug, Clone)]
pub struct SqsTransport {
    sqs_client: aws_sdk_sqs::Client,
}

impl SqsTransport {
    pub fn new(sqs_client: aws_sdk_sqs::Client) -> Self {
        SqsTransport { sqs_client }
    }

    /// Builds the transport with `connection` overrides layered over the
    /// ambient AWS environment.
    pub async fn connect(connection: &Connection) -> Result<Self, QueueClientError> {
        Ok(Self::new(create_sqs_client(connection).await?))
    }

    pub fn sqs_client(&self) -> &aws_sdk_sqs::Client {
        &self.sqs_client
    }
}

fn transport_error<E, R>(operation: &str, err: &SdkError<E, R>) -> TransportError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let message = err
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| DisplayErrorContext(err).to_string());
    let error = TransportError::new(operation, message);
    match err.code() {
        Some(code) => error.with_code(code),
        None => error,
    }
}

fn convert_message(message: &aws_sdk_sqs::types::Message) -> Option<Message> {
    let (Some(id), Some(receipt_handle)) = (message.message_id(), message.receipt_handle()) else {
        warn!(
            message_id = ?message.message_id(),
            "broker returned a message without id or receipt handle"
        );
        return None;
    };

    let attributes = message
        .attributes()
        .map(|attributes| {
            attributes
                .iter()
                .map(|(name, value)| (name.as_str().to_string(), value.clone()))
                .collect()
        })
        .unwrap_or_default();

    Some(Message {
        id: id.to_string(),
        receipt_handle: receipt_handle.to_string(),
        body_checksum: message.md5_of_body().unwrap_or_default().to_string(),
        body: message.body().unwrap_or_default().to_string(),
        attributes,
    })
}

#[async_trait]
impl Transport for SqsTransport {
    async fn receive(&self, request: ReceiveRequest) -> Result<Vec<Message>, QueueClientError> {
        let output = self
            .sqs_client
            .receive_message()
            .queue_url(&request.queue_url)
            .max_number_of_messages(request.max_number_of_messages)
            .wait_time_seconds(request.wait_time_seconds)
            .visibility_timeout(request.visibility_timeout)
            .message_system_attribute_names(MessageSystemAttributeName::All)
            .message_attribute_names("All")
            .send()
            .await
            .map_err(|err| transport_error("ReceiveMessage", &err))?;

        Ok(output.messages().iter().filter_map(convert_message).collect())
    }

    async fn send(&self, request: SendRequest) -> Result<SendReceipt, QueueClientError> {
        let output = self
            .sqs_client
            .send_message()
            .queue_url(&request.queue_url)
            .message_body(request.body)
            .delay_seconds(request.delay_seconds)
            .set_message_deduplication_id(request.deduplication_id)
            .set_message_group_id(request.group_id)
            .send()
            .await
            .map_err(|err| transport_error("SendMessage", &err))?;

        Ok(SendReceipt {
            message_id: output.message_id().unwrap_or_default().to_string(),
            body_checksum: output.md5_of_message_body().unwrap_or_default().to_string(),
        })
    }

    async fn send_batch(
        &self,
        request: SendBatchRequest,
    ) -> Result<SendBatchResponse, QueueClientError> {
        let entries = request
            .entries
            .iter()
            .map(|entry| {
                SendMessageBatchRequestEntry::builder()
                    .id(&entry.id)
                    .message_body(&entry.body)
                    .delay_seconds(entry.delay_seconds)
                    .set_message_deduplication_id(entry.deduplication_id.clone())
                    .set_message_group_id(entry.group_id.clone())
                    .build()
                    .map_err(|err| TransportError::new("SendMessageBatch", err.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let result = self
            .sqs_client
            .send_message_batch()
            .queue_url(&request.queue_url)
            .set_entries(Some(entries))
            .send()
            .await;

        match result {
            Ok(output) => Ok(SendBatchResponse {
                successful: output
                    .successful()
                    .iter()
                    .map(|entry| BatchSuccess {
                        id: entry.id().to_string(),
                        message_id: entry.message_id().to_string(),
                        body_checksum: entry.md5_of_message_body().to_string(),
                    })
                    .collect(),
                failed: output
                    .failed()
                    .iter()
                    .map(|entry| BatchFailure {
                        id: entry.id().to_string(),
                        code: entry.code().to_string(),
                        message: entry.message().map(str::to_string),
                        sender_fault: entry.sender_fault(),
                    })
                    .collect(),
            }),
            // SQS rejects the whole request; surface it on every entry so the
            // caller still gets one result per submitted message.
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(SendMessageBatchError::is_batch_entry_ids_not_distinct) =>
            {
                debug!(queue_url = %request.queue_url, "batch rejected for duplicate entry ids");
                let message = err.message().map(str::to_string);
                Ok(SendBatchResponse {
                    successful: Vec::new(),
                    failed: request
                        .entries
                        .iter()
                        .map(|entry| BatchFailure {
                            id: entry.id.clone(),
                            code: BATCH_ENTRY_IDS_NOT_DISTINCT.to_string(),
                            message: message.clone(),
                            sender_fault: true,
                        })
                        .collect(),
                })
            }
            Err(err) => Err(transport_error("SendMessageBatch", &err).into()),
        }
    }

    async fn delete(&self, request: DeleteRequest) -> Result<(), QueueClientError> {
        let result = self
            .sqs_client
            .delete_message()
            .queue_url(&request.queue_url)
            .receipt_handle(&request.receipt_handle)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(DeleteMessageError::is_receipt_handle_is_invalid) =>
            {
                Err(QueueClientError::InvalidHandle {
                    receipt_handle: request.receipt_handle,
                })
            }
            Err(err) => Err(transport_error("DeleteMessage", &err).into()),
        }
    }

    async fn change_visibility(
        &self,
        request: ChangeVisibilityRequest,
    ) -> Result<(), QueueClientError> {
        let result = self
            .sqs_client
            .change_message_visibility()
            .queue_url(&request.queue_url)
            .receipt_handle(&request.receipt_handle)
            .visibility_timeout(request.visibility_timeout)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(err)
                if err.as_service_error().is_some_and(|service_err| {
                    service_err.is_receipt_handle_is_invalid()
                        || service_err.is_message_not_inflight()
                }) =>
            {
                Err(QueueClientError::InvalidHandle {
                    receipt_handle: request.receipt_handle,
                })
            }
            Err(err) => Err(transport_error("ChangeMessageVisibility", &err).into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sqs::types::Message as SqsMessage;
    use std::collections::HashMap;

    #[test]
    fn sdk_messages_keep_system_attribute_names() {
        let message = SqsMessage::builder()
            .message_id("m-1")
            .receipt_handle("rh-1")
            .md5_of_body("5d41402abc4b2a76b9719d911017c592")
            .body("hello")
            .set_attributes(Some(HashMap::from([(
                MessageSystemAttributeName::ApproximateReceiveCount,
                "1".to_string(),
            )])))
            .build();

        let converted = convert_message(&message).expect("message has id and handle");
        assert_eq!(converted.id, "m-1");
        assert_eq!(converted.receipt_handle, "rh-1");
        assert_eq!(converted.body, "hello");
        assert_eq!(converted.receive_count(), Some(1));
    }

    #[test]
    fn sdk_messages_without_receipt_handle_are_dropped() {
        let message = SqsMessage::builder().message_id("m-1").body("hello").build();
        assert!(convert_message(&message).is_none());
    }
}
