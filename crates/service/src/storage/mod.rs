//! Storage abstractions for service layer
//!
//! A `DocumentCollection` is one schema-flexible collection queried by field
//! equality and case-insensitive substring filters. Two backends implement it:
//! MongoDB for deployments and an in-process store for local runs and tests.

pub mod memory;
pub mod mongo;

use std::sync::Arc;

use async_trait::async_trait;
use configs::{DatabaseConfig, StoreBackend};
use models::{contact, document::ID, message, user};
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use thiserror::Error;
use tracing::info;

pub use memory::MemoryCollection;
pub use mongo::MongoCollection;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for unique field `{0}`")]
    Duplicate(String),
    #[error("store error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Eq(String, Bson),
    /// Case-insensitive substring match on a string field.
    ContainsIgnoreCase(String, String),
}

/// Conjunction of conditions; empty matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn by_id(id: ObjectId) -> Self {
        Self::all().eq(ID, id)
    }

    pub fn eq(mut self, field: &str, value: impl Into<Bson>) -> Self {
        self.conditions.push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    pub fn contains_ignore_case(mut self, field: &str, needle: &str) -> Self {
        self.conditions
            .push(Condition::ContainsIgnoreCase(field.to_string(), needle.to_string()));
        self
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions.iter().all(|c| match c {
            Condition::Eq(field, value) => doc.get(field) == Some(value),
            Condition::ContainsIgnoreCase(field, needle) => doc
                .get_str(field)
                .map(|v| v.to_lowercase().contains(&needle.to_lowercase()))
                .unwrap_or(false),
        })
    }

    /// MongoDB query document. Substring needles are regex-escaped.
    pub fn to_query(&self) -> Document {
        let mut query = Document::new();
        for c in &self.conditions {
            match c {
                Condition::Eq(field, value) => {
                    query.insert(field.clone(), value.clone());
                }
                Condition::ContainsIgnoreCase(field, needle) => {
                    query.insert(
                        field.clone(),
                        doc! { "$regex": regex::escape(needle), "$options": "i" },
                    );
                }
            }
        }
        query
    }
}

#[async_trait]
pub trait DocumentCollection: Send + Sync {
    fn name(&self) -> &str;
    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, StoreError>;
    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError>;
    /// Insert and return the store-assigned id.
    async fn insert_one(&self, doc: Document) -> Result<ObjectId, StoreError>;
    /// Merge `patch` into the first match; returns the document after the update.
    async fn update_one(&self, filter: &Filter, patch: Document) -> Result<Option<Document>, StoreError>;
    /// Returns the number of deleted documents (0 or 1).
    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError>;
    async fn count(&self, filter: &Filter) -> Result<u64, StoreError>;
}

/// The three collections the directory works with.
#[derive(Clone)]
pub struct Collections {
    pub users: Arc<dyn DocumentCollection>,
    pub contacts: Arc<dyn DocumentCollection>,
    pub messages: Arc<dyn DocumentCollection>,
}

impl Collections {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryCollection::new(user::COLLECTION).with_unique(user::PHONE)),
            contacts: Arc::new(MemoryCollection::new(contact::COLLECTION)),
            messages: Arc::new(MemoryCollection::new(message::COLLECTION)),
        }
    }

    /// Bind the MongoDB collections and make sure their indexes exist.
    pub async fn mongo(db: &mongodb::Database) -> Result<Self, StoreError> {
        let users = MongoCollection::new(db, user::COLLECTION)
            .ensure_unique_index(user::PHONE)
            .await?;
        let contacts = MongoCollection::new(db, contact::COLLECTION)
            .ensure_index(contact::LIST_ID)
            .await?
            .ensure_index(contact::LIST_ALIAS)
            .await?;
        let messages = MongoCollection::new(db, message::COLLECTION);
        Ok(Self {
            users: Arc::new(users),
            contacts: Arc::new(contacts),
            messages: Arc::new(messages),
        })
    }

    pub async fn from_config(cfg: &DatabaseConfig) -> anyhow::Result<Self> {
        match cfg.backend {
            StoreBackend::Memory => {
                info!(event = "store_selected", backend = "memory", "using in-memory document store");
                Ok(Self::in_memory())
            }
            StoreBackend::Mongodb => {
                let db = models::db::connect(cfg).await?;
                let collections = Self::mongo(&db).await?;
                info!(event = "store_selected", backend = "mongodb", database = %cfg.name, "indexes ensured");
                Ok(collections)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_matches_equality_and_substring() {
        let d = doc! { "alias": "John", "listId": "abc" };
        assert!(Filter::all().matches(&d));
        assert!(Filter::all().eq("listId", "abc").matches(&d));
        assert!(!Filter::all().eq("listId", "abd").matches(&d));
        assert!(Filter::all().contains_ignore_case("alias", "jo").matches(&d));
        assert!(!Filter::all().contains_ignore_case("alias", "amy").matches(&d));
        assert!(!Filter::all().contains_ignore_case("missing", "x").matches(&d));
    }

    #[test]
    fn mongo_query_escapes_regex_metacharacters() {
        let q = Filter::all().contains_ignore_case("alias", "a.b*").to_query();
        let cond = q.get_document("alias").unwrap();
        assert_eq!(cond.get_str("$regex").unwrap(), r"a\.b\*");
        assert_eq!(cond.get_str("$options").unwrap(), "i");
    }

    #[test]
    fn by_id_targets_the_primary_key() {
        let id = ObjectId::new();
        let q = Filter::by_id(id).to_query();
        assert_eq!(q.get_object_id("_id").unwrap(), id);
    }
}
