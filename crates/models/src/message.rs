use chrono::{DateTime, Utc};
use mongodb::bson::{self, Document};
use serde_json::Value;

use crate::document::{self, ID, PUBLIC_ID};
use crate::errors::ModelError;

pub const COLLECTION: &str = "messages";
/// Client-supplied correlation id.
pub const IDENTIFIER: &str = "identifier";
pub const ORIGIN: &str = "origin";
pub const DESTINATION: &str = "destination";
pub const TEXT: &str = "text";
/// Creation time, set by the server.
pub const TIMESTAMP: &str = "timestamp";

const REQUIRED: &[&str] = &[IDENTIFIER, ORIGIN, DESTINATION, TEXT];
const SERVER_OWNED: &[&str] = &[ID, PUBLIC_ID, TIMESTAMP];

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub identifier: String,
    pub timestamp: bson::DateTime,
    pub document: Document,
}

/// Validate a message body and stamp it with `now`.
pub fn new_message(body: Value, now: DateTime<Utc>) -> Result<NewMessage, ModelError> {
    let mut body = document::into_object(body)?;
    document::strip_fields(&mut body, SERVER_OWNED);
    for field in REQUIRED {
        document::require_text(&body, field)?;
    }
    let identifier = document::require_text(&body, IDENTIFIER)?;

    let timestamp = document::to_bson_datetime(now);
    let mut document = document::to_document(body)?;
    document.insert(TIMESTAMP, timestamp);
    Ok(NewMessage { identifier, timestamp, document })
}

pub fn patch(body: Value) -> Result<Document, ModelError> {
    let mut body = document::into_object(body)?;
    document::strip_fields(&mut body, SERVER_OWNED);
    for field in REQUIRED {
        document::check_text_if_present(&body, field)?;
    }
    document::to_patch(body)
}
