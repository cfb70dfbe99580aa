use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;

use crate::errors::ErrorBody;
use crate::responses::ApiMessage;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

/// Required fields for a new user. Extra fields are stored as-is.
#[derive(Serialize, ToSchema)]
pub struct UserInputDoc {
    pub phone: String,
    pub alias: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserPatchDoc {
    pub phone: Option<String>,
    pub alias: Option<String>,
}

/// `listId` is assigned from the path and ignored if sent.
#[derive(Serialize, ToSchema)]
pub struct ContactInputDoc {
    pub phone: String,
    pub alias: String,
    #[serde(rename = "listAlias")]
    pub list_alias: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ContactPatchDoc {
    pub phone: Option<String>,
    pub alias: Option<String>,
    #[serde(rename = "listAlias")]
    pub list_alias: Option<String>,
}

/// `timestamp` is stamped by the server.
#[derive(Serialize, ToSchema)]
pub struct MessageInputDoc {
    pub identifier: String,
    pub origin: String,
    pub destination: String,
    pub text: String,
}

#[derive(Serialize, ToSchema)]
pub struct MessagePatchDoc {
    pub identifier: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub text: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::users::list,
        crate::routes::users::get,
        crate::routes::users::create,
        crate::routes::users::update,
        crate::routes::users::delete,
        crate::routes::contacts::list,
        crate::routes::contacts::get,
        crate::routes::contacts::create,
        crate::routes::contacts::update,
        crate::routes::contacts::delete,
        crate::routes::contacts::by_list_alias,
        crate::routes::messages::list,
        crate::routes::messages::get,
        crate::routes::messages::create,
        crate::routes::messages::update,
        crate::routes::messages::delete,
    ),
    components(
        schemas(
            HealthResponse,
            ApiMessage,
            ErrorBody,
            UserInputDoc,
            UserPatchDoc,
            ContactInputDoc,
            ContactPatchDoc,
            MessageInputDoc,
            MessagePatchDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "users"),
        (name = "contacts"),
        (name = "messages")
    )
)]
pub struct ApiDoc;
