use std::sync::Arc;

use chrono::Utc;
use models::document::{self, text_field};
use models::message;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::storage::{DocumentCollection, Filter};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MessageSummary {
    pub id: String,
    pub identifier: String,
    /// RFC 3339; empty when the stored document has no readable timestamp
    pub timestamp: String,
}

/// CRUD over messages. `origin` and `destination` are free strings, not checked
/// against the users collection.
pub struct MessageService {
    messages: Arc<dyn DocumentCollection>,
}

impl MessageService {
    pub fn new(messages: Arc<dyn DocumentCollection>) -> Self {
        Self { messages }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Value>, ServiceError> {
        let docs = self.messages.find(&Filter::all()).await?;
        info!(collection = self.messages.name(), count = docs.len(), "list messages");
        Ok(document::to_portable_list(docs)?)
    }

    pub async fn get(&self, id: &str) -> Result<Value, ServiceError> {
        let oid = document::parse_id(id)?;
        let found = self
            .messages
            .find_one(&Filter::by_id(oid))
            .await?
            .ok_or_else(|| ServiceError::not_found("message", id))?;
        Ok(document::to_portable_json(found)?)
    }

    /// Insert a message stamped with the current UTC time.
    ///
    /// # Examples
    /// ```
    /// use service::{messages::MessageService, storage::Collections};
    /// let svc = MessageService::new(Collections::in_memory().messages);
    /// let body = serde_json::json!({"identifier": "m1", "origin": "u1", "destination": "u2", "text": "hi"});
    /// let created = tokio_test::block_on(svc.create(body)).unwrap();
    /// assert_eq!(created.identifier, "m1");
    /// ```
    #[instrument(skip(self, body))]
    pub async fn create(&self, body: Value) -> Result<MessageSummary, ServiceError> {
        let new = message::new_message(body, Utc::now())?;
        let timestamp = document::format_timestamp(new.timestamp)?;
        let id = self.messages.insert_one(new.document).await?;
        info!(message_id = %id, identifier = %new.identifier, %timestamp, "message_created");
        Ok(MessageSummary { id: id.to_hex(), identifier: new.identifier, timestamp })
    }

    #[instrument(skip(self, body))]
    pub async fn update(&self, id: &str, body: Value) -> Result<MessageSummary, ServiceError> {
        let oid = document::parse_id(id)?;
        let patch = message::patch(body)?;
        let updated = self
            .messages
            .update_one(&Filter::by_id(oid), patch)
            .await?
            .ok_or_else(|| ServiceError::not_found("message", id))?;
        info!(message_id = %oid, "message_updated");
        Ok(MessageSummary {
            id: oid.to_hex(),
            identifier: text_field(&updated, message::IDENTIFIER).unwrap_or_default(),
            timestamp: updated
                .get_datetime(message::TIMESTAMP)
                .ok()
                .and_then(|at| document::format_timestamp(*at).ok())
                .unwrap_or_default(),
        })
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let oid = document::parse_id(id)?;
        if self.messages.delete_one(&Filter::by_id(oid)).await? == 0 {
            return Err(ServiceError::not_found("message", id));
        }
        info!(message_id = %oid, "message_deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Collections;
    use serde_json::json;

    fn service() -> MessageService {
        MessageService::new(Collections::in_memory().messages)
    }

    #[tokio::test]
    async fn created_message_gets_a_server_timestamp() -> Result<(), anyhow::Error> {
        let svc = service();
        let before = Utc::now();
        let created = svc
            .create(json!({"identifier": "m1", "origin": "u1", "destination": "u2", "text": "hi"}))
            .await?;
        let found = svc.get(&created.id).await?;

        assert_eq!(found["identifier"], "m1");
        assert_eq!(found["origin"], "u1");
        assert_eq!(found["destination"], "u2");
        assert_eq!(found["text"], "hi");
        let stamped = chrono::DateTime::parse_from_rfc3339(found["timestamp"].as_str().unwrap())?;
        assert!(stamped.timestamp_millis() >= before.timestamp_millis());
        assert_eq!(found["timestamp"], created.timestamp.as_str());
        Ok(())
    }

    #[tokio::test]
    async fn client_timestamp_is_ignored() -> Result<(), anyhow::Error> {
        let svc = service();
        let created = svc
            .create(json!({"identifier": "m2", "origin": "u1", "destination": "u2", "text": "hi", "timestamp": "1970-01-01T00:00:00Z"}))
            .await?;
        let found = svc.get(&created.id).await?;
        assert_ne!(found["timestamp"], "1970-01-01T00:00:00Z");
        Ok(())
    }

    #[tokio::test]
    async fn update_and_delete() -> Result<(), anyhow::Error> {
        let svc = service();
        let m = svc
            .create(json!({"identifier": "m3", "origin": "u1", "destination": "u2", "text": "hi"}))
            .await?;
        let updated = svc.update(&m.id, json!({"text": "edited"})).await?;
        assert_eq!(updated.identifier, "m3");
        assert_eq!(updated.timestamp, m.timestamp);
        assert_eq!(svc.get(&m.id).await?["text"], "edited");

        svc.delete(&m.id).await?;
        assert!(matches!(svc.delete(&m.id).await, Err(ServiceError::NotFound(_))));
        assert!(svc.list().await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn incomplete_message_is_rejected() {
        let svc = service();
        let err = svc.create(json!({"identifier": "m4", "origin": "u1"})).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
