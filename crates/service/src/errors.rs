use common::metrics::STORE_ERRORS_TOTAL;
use models::errors::ModelError;
use thiserror::Error;
use tracing::error;

use crate::storage::StoreError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("{0}")]
    InvalidId(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("error querying the document store: {0}")]
    Query(String),
    #[error("error encoding results: {0}")]
    Serialization(String),
}

impl ServiceError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        Self::NotFound(format!("{entity} with id {id} not found"))
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::InvalidId(_) => 1002,
            ServiceError::NotFound(_) => 1003,
            ServiceError::Conflict(_) => 1004,
            ServiceError::Query(_) => 1200,
            ServiceError::Serialization(_) => 1201,
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Validation(msg) => Self::Validation(msg),
            ModelError::InvalidId(msg) => Self::InvalidId(msg),
            ModelError::Serialization(msg) => Self::Serialization(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate(field) => Self::Conflict(format!("a document with this `{field}` already exists")),
            StoreError::Backend(msg) => {
                STORE_ERRORS_TOTAL.inc();
                error!(err = %msg, "document store operation failed");
                Self::Query(msg)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_errors_keep_their_kind() {
        assert!(matches!(ServiceError::from(ModelError::InvalidId("x".into())), ServiceError::InvalidId(_)));
        assert!(matches!(ServiceError::from(ModelError::Validation("x".into())), ServiceError::Validation(_)));
        assert!(matches!(ServiceError::from(ModelError::Serialization("x".into())), ServiceError::Serialization(_)));
    }

    #[test]
    fn store_errors_map_to_conflict_or_query() {
        let dup = ServiceError::from(StoreError::Duplicate("phone".into()));
        assert_eq!(dup.code(), 1004);
        assert!(dup.to_string().contains("phone"));
        assert!(matches!(ServiceError::from(StoreError::Backend("down".into())), ServiceError::Query(_)));
    }
}
