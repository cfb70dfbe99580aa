use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::{IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use tracing::{debug, instrument};

use super::{DocumentCollection, Filter, StoreError};

const DUPLICATE_KEY: i32 = 11000;

/// MongoDB-backed collection of raw documents.
#[derive(Clone)]
pub struct MongoCollection {
    inner: Collection<Document>,
    unique: Vec<String>,
}

impl MongoCollection {
    pub fn new(db: &Database, name: &str) -> Self {
        Self { inner: db.collection::<Document>(name), unique: Vec::new() }
    }

    /// Create (if missing) a unique ascending index on `field`.
    pub async fn ensure_unique_index(mut self, field: &str) -> Result<Self, StoreError> {
        let options = IndexOptions::builder().unique(true).build();
        let model = IndexModel::builder().keys(doc! { field: 1 }).options(options).build();
        self.inner.create_index(model).await.map_err(backend)?;
        debug!(collection = %self.inner.name(), %field, "unique index ensured");
        self.unique.push(field.to_string());
        Ok(self)
    }

    pub async fn ensure_index(self, field: &str) -> Result<Self, StoreError> {
        let model = IndexModel::builder().keys(doc! { field: 1 }).build();
        self.inner.create_index(model).await.map_err(backend)?;
        debug!(collection = %self.inner.name(), %field, "index ensured");
        Ok(self)
    }

    fn classify(&self, err: MongoError) -> StoreError {
        if is_duplicate_key(&err) {
            let field = self.unique.first().cloned().unwrap_or_else(|| "unique key".to_string());
            return StoreError::Duplicate(field);
        }
        backend(err)
    }
}

fn backend(err: MongoError) -> StoreError {
    StoreError::Backend(err.to_string())
}

fn is_duplicate_key(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(we)) => we.code == DUPLICATE_KEY,
        ErrorKind::Command(ce) => ce.code == DUPLICATE_KEY,
        _ => false,
    }
}

#[async_trait]
impl DocumentCollection for MongoCollection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    #[instrument(skip(self), fields(collection = %self.inner.name()))]
    async fn find(&self, filter: &Filter) -> Result<Vec<Document>, StoreError> {
        let cursor = self.inner.find(filter.to_query()).await.map_err(backend)?;
        cursor.try_collect().await.map_err(backend)
    }

    async fn find_one(&self, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.inner.find_one(filter.to_query()).await.map_err(backend)
    }

    async fn insert_one(&self, doc: Document) -> Result<ObjectId, StoreError> {
        let res = self.inner.insert_one(doc).await.map_err(|e| self.classify(e))?;
        res.inserted_id
            .as_object_id()
            .ok_or_else(|| StoreError::Backend(format!("unexpected inserted id: {}", res.inserted_id)))
    }

    async fn update_one(&self, filter: &Filter, patch: Document) -> Result<Option<Document>, StoreError> {
        self.inner
            .find_one_and_update(filter.to_query(), doc! { "$set": patch })
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| self.classify(e))
    }

    async fn delete_one(&self, filter: &Filter) -> Result<u64, StoreError> {
        let res = self.inner.delete_one(filter.to_query()).await.map_err(backend)?;
        Ok(res.deleted_count)
    }

    async fn count(&self, filter: &Filter) -> Result<u64, StoreError> {
        self.inner.count_documents(filter.to_query()).await.map_err(backend)
    }
}
