use std::sync::Arc;

use models::document::{self, text_field};
use models::user;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::storage::{DocumentCollection, Filter, StoreError};

/// Identity of a user as echoed back by write operations.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UserSummary {
    pub id: String,
    pub phone: String,
    pub alias: String,
}

/// CRUD over user documents, keyed by a unique phone number.
pub struct UserService {
    users: Arc<dyn DocumentCollection>,
}

impl UserService {
    pub fn new(users: Arc<dyn DocumentCollection>) -> Self {
        Self { users }
    }

    /// All users, or those whose alias contains `alias` (case-insensitive).
    /// An empty filter returns everyone.
    #[instrument(skip(self))]
    pub async fn list(&self, alias: Option<&str>) -> Result<Vec<Value>, ServiceError> {
        let filter = match alias.filter(|a| !a.is_empty()) {
            Some(needle) => Filter::all().contains_ignore_case(user::ALIAS, needle),
            None => Filter::all(),
        };
        let docs = self.users.find(&filter).await?;
        info!(collection = self.users.name(), count = docs.len(), "list users");
        Ok(document::to_portable_list(docs)?)
    }

    pub async fn get(&self, id: &str) -> Result<Value, ServiceError> {
        let oid = document::parse_id(id)?;
        let found = self
            .users
            .find_one(&Filter::by_id(oid))
            .await?
            .ok_or_else(|| ServiceError::not_found("user", id))?;
        Ok(document::to_portable_json(found)?)
    }

    /// Insert a user. The unique index on `phone` decides conflicts.
    #[instrument(skip(self, body))]
    pub async fn create(&self, body: Value) -> Result<UserSummary, ServiceError> {
        let new = user::new_user(body)?;
        let id = match self.users.insert_one(new.document).await {
            Ok(id) => id,
            Err(StoreError::Duplicate(_)) => {
                return Err(ServiceError::Conflict(format!("user with phone {} already exists", new.phone)));
            }
            Err(e) => return Err(e.into()),
        };
        info!(user_id = %id, phone = %new.phone, "user_created");
        Ok(UserSummary { id: id.to_hex(), phone: new.phone, alias: new.alias })
    }

    /// Merge-patch a user; returns its state after the update.
    #[instrument(skip(self, body))]
    pub async fn update(&self, id: &str, body: Value) -> Result<UserSummary, ServiceError> {
        let oid = document::parse_id(id)?;
        let patch = user::patch(body)?;
        let updated = match self.users.update_one(&Filter::by_id(oid), patch).await {
            Ok(found) => found.ok_or_else(|| ServiceError::not_found("user", id))?,
            Err(StoreError::Duplicate(_)) => {
                return Err(ServiceError::Conflict("phone is already used by another user".into()));
            }
            Err(e) => return Err(e.into()),
        };
        info!(user_id = %id, "user_updated");
        Ok(UserSummary {
            id: oid.to_hex(),
            phone: text_field(&updated, user::PHONE).unwrap_or_default(),
            alias: text_field(&updated, user::ALIAS).unwrap_or_default(),
        })
    }

    /// Delete by id. Returns `false` when nothing matched; that is not an error.
    /// Contacts owned by the user are left in place.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<bool, ServiceError> {
        let oid = document::parse_id(id)?;
        let deleted = self.users.delete_one(&Filter::by_id(oid)).await?;
        info!(user_id = %id, deleted, "user_deleted");
        Ok(deleted > 0)
    }
}
