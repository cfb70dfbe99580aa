use mongodb::bson::{oid::ObjectId, Document};
use serde_json::Value;

use crate::document::{self, ID, PUBLIC_ID};
use crate::errors::ModelError;

pub const COLLECTION: &str = "contacts";
pub const PHONE: &str = "phone";
pub const ALIAS: &str = "alias";
/// Hex id of the owning user, set by the server.
pub const LIST_ID: &str = "listId";
/// Free-text tag used by the alias lookup.
pub const LIST_ALIAS: &str = "listAlias";

const SERVER_OWNED: &[&str] = &[ID, PUBLIC_ID, LIST_ID];

#[derive(Debug, Clone)]
pub struct NewContact {
    pub list_id: String,
    pub phone: String,
    pub alias: String,
    pub document: Document,
}

/// Validate a contact body and tag it with its owner.
pub fn new_contact(owner: &ObjectId, body: Value) -> Result<NewContact, ModelError> {
    let mut body = document::into_object(body)?;
    document::strip_fields(&mut body, SERVER_OWNED);
    let phone = document::require_text(&body, PHONE)?;
    let alias = document::require_text(&body, ALIAS)?;
    document::optional_text(&body, LIST_ALIAS)?;

    let list_id = owner.to_hex();
    let mut document = document::to_document(body)?;
    document.insert(LIST_ID, list_id.clone());
    Ok(NewContact { list_id, phone, alias, document })
}

pub fn patch(body: Value) -> Result<Document, ModelError> {
    let mut body = document::into_object(body)?;
    document::strip_fields(&mut body, SERVER_OWNED);
    document::check_text_if_present(&body, PHONE)?;
    document::check_text_if_present(&body, ALIAS)?;
    document::optional_text(&body, LIST_ALIAS)?;
    document::to_patch(body)
}
