use async_trait::async_trait;
use models::document::ID;
use mongodb::bson::{oid::ObjectId, Document};
use tokio::sync::RwLock;

use super::{DocumentCollection, Filter, StoreError};

/// In-process document collection.
///
/// Keeps documents in insertion order behind a `RwLock`. Unique fields are checked
/// under the write lock, so concurrent inserts cannot both claim the same value.
pub struct MemoryCollection {
    name: String,
    unique: Vec<String>,
    docs: RwLock<Vec<Document>>,
}

impl MemoryCollection {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), unique: Vec::new(), docs: RwLock::new(Vec::new()) }
    }

    /// Reject writes that would give two documents the same value for `field`.
    pub fn with_unique(mut self, field: &str) -> Self {
        self.unique.push(field.to_string());
        self
    }

    /// First unique field `candidate` shares with a document other than `skip`.
    fn unique_violation(&self, docs: &[Document], candidate: &Document, skip: Option<usize>) -> Option<String> {
        self.unique.iter().find_map(|field| {
            let value = candidate.get(field)?;
            docs.iter()
                .enumerate()
                .filter(|(i, _)| Some(*i) != skip)
                .any(|(_, other)| other.get(field) == Some(value))
                .then(|| field.clone())
        })
    }
}

#[async_trait]
impl DocumentCollection for MemoryCollection {
    fn name(&self) -> &str {
        &self.name
    }

    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read().await;
        Ok(docs.iter().filter(|d| filter.matches(d)).cloned().collect())
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        let docs = self.docs.read().await;
        Ok(docs.iter().find(|d| filter.matches(d)).cloned())
    }

    async fn insert_one(&self, doc: Document) -> Result<ObjectId, StoreError> {
        let id = match doc.get_object_id(ID) {
            Ok(id) => id,
            Err(_) => ObjectId::new(),
        };
        let mut stored = Document::new();
        stored.insert(ID, id);
        for (k, v) in doc {
            if k != ID {
                stored.insert(k, v);
            }
        }

        let mut docs = self.docs.write().await;
        if docs.iter().any(|d| d.get_object_id(ID).ok() == Some(id)) {
            return Err(StoreError::Duplicate(ID.to_string()));
        }
        if let Some(field) = self.unique_violation(&docs, &stored, None) {
            return Err(StoreError::Duplicate(field));
        }
        docs.push(stored);
        Ok(id)
    }

    async fn update_one(&self, filter: &Filter, patch: Document) -> Result<Option<Document>, StoreError> {
        let mut docs = self.docs.write().await;
        let Some(pos) = docs.iter().position(|d| filter.matches(d)) else {
            return Ok(None);
        };
        let mut merged = docs[pos].clone();
        for (k, v) in patch {
            if k != ID {
                merged.insert(k, v);
            }
        }
        if let Some(field) = self.unique_violation(&docs, &merged, Some(pos)) {
            return Err(StoreError::Duplicate(field));
        }
        docs[pos] = merged.clone();
        Ok(Some(merged))
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError> {
        let mut docs = self.docs.write().await;
        match docs.iter().position(|d| filter.matches(d)) {
            Some(pos) => {
                docs.remove(pos);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        let docs = self.docs.read().await;
        Ok(docs.iter().filter(|d| filter.matches(d)).count() as u64)
    }
}
