use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Confirmation envelope for create/update/delete.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiMessage {
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl ApiMessage {
    pub fn new(response: impl Into<String>) -> Self {
        Self { response: response.into(), id: None }
    }

    pub fn with_id(response: impl Into<String>, id: impl Into<String>) -> Self {
        Self { response: response.into(), id: Some(id.into()) }
    }
}
