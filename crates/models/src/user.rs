use mongodb::bson::Document;
use serde_json::Value;

use crate::document::{self, ID, PUBLIC_ID};
use crate::errors::ModelError;

pub const COLLECTION: &str = "users";
pub const PHONE: &str = "phone";
pub const ALIAS: &str = "alias";

const SERVER_OWNED: &[&str] = &[ID, PUBLIC_ID];

/// A validated user ready to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub phone: String,
    pub alias: String,
    pub document: Document,
}

pub fn new_user(body: Value) -> Result<NewUser, ModelError> {
    let mut body = document::into_object(body)?;
    document::strip_fields(&mut body, SERVER_OWNED);
    let phone = document::require_text(&body, PHONE)?;
    let alias = document::require_text(&body, ALIAS)?;
    let document = document::to_document(body)?;
    Ok(NewUser { phone, alias, document })
}

/// Merge-patch for a user. `phone` and `alias` may change but not be blanked.
pub fn patch(body: Value) -> Result<Document, ModelError> {
    let mut body = document::into_object(body)?;
    document::strip_fields(&mut body, SERVER_OWNED);
    document::check_text_if_present(&body, PHONE)?;
    document::check_text_if_present(&body, ALIAS)?;
    document::to_patch(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_user_requires_phone_and_alias() {
        let u = new_user(json!({"phone": "600111222", "alias": "John", "status": "busy"})).unwrap();
        assert_eq!(u.phone, "600111222");
        assert_eq!(u.alias, "John");
        assert_eq!(u.document.get_str("status").unwrap(), "busy");

        assert!(matches!(new_user(json!({"alias": "John"})), Err(ModelError::Validation(_))));
        assert!(matches!(new_user(json!({"phone": "1", "alias": ""})), Err(ModelError::Validation(_))));
    }

    #[test]
    fn client_cannot_choose_the_id() {
        let u = new_user(json!({"_id": "x", "id": "y", "phone": "1", "alias": "a"})).unwrap();
        assert!(!u.document.contains_key("_id"));
        assert!(!u.document.contains_key("id"));
    }

    #[test]
    fn patch_keeps_only_client_fields() {
        let p = patch(json!({"alias": "Johnny", "id": "zzz"})).unwrap();
        assert_eq!(p.len(), 1);
        assert!(patch(json!({"phone": ""})).is_err());
        assert!(patch(json!({"id": "only-server-field"})).is_err());
    }
}
