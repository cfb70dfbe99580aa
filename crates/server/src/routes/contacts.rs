use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::errors::ApiError;
use crate::responses::ApiMessage;
use crate::state::AppState;

#[utoipa::path(
    get, path = "/users/{id}/contacts", tag = "contacts",
    params(("id" = String, Path, description = "Owning user id")),
    responses(
        (status = 200, description = "Contacts in the user's list"),
        (status = 400, description = "Malformed id", body = crate::errors::ErrorBody)
    )
)]
pub async fn list(State(state): State<AppState>, Path(user_id): Path<String>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(state.contacts.list(&user_id).await?))
}

#[utoipa::path(
    get, path = "/users/{id}/contacts/{contact_id}", tag = "contacts",
    params(
        ("id" = String, Path, description = "Owning user id"),
        ("contact_id" = String, Path, description = "Contact id")
    ),
    responses(
        (status = 200, description = "The contact"),
        (status = 400, description = "Malformed id", body = crate::errors::ErrorBody),
        (status = 404, description = "Not in this user's list", body = crate::errors::ErrorBody)
    )
)]
pub async fn get(
    State(state): State<AppState>,
    Path((user_id, contact_id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.contacts.get(&user_id, &contact_id).await?))
}

#[utoipa::path(
    post, path = "/users/{id}/contacts", tag = "contacts",
    params(("id" = String, Path, description = "Owning user id")),
    request_body = crate::openapi::ContactInputDoc,
    responses(
        (status = 201, description = "Created", body = ApiMessage),
        (status = 400, description = "Malformed id", body = crate::errors::ErrorBody),
        (status = 422, description = "Validation Error", body = crate::errors::ErrorBody)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiMessage>), ApiError> {
    let Json(body) = payload?;
    let contact = state.contacts.create(&user_id, body).await?;
    let msg = format!("contact {} added to list {}", contact.alias, contact.list_id);
    Ok((StatusCode::CREATED, Json(ApiMessage::with_id(msg, contact.id))))
}

#[utoipa::path(
    put, path = "/users/{id}/contacts/{contact_id}", tag = "contacts",
    params(
        ("id" = String, Path, description = "Owning user id"),
        ("contact_id" = String, Path, description = "Contact id")
    ),
    request_body = crate::openapi::ContactPatchDoc,
    responses(
        (status = 200, description = "Updated", body = ApiMessage),
        (status = 404, description = "Not in this user's list", body = crate::errors::ErrorBody),
        (status = 422, description = "Validation Error", body = crate::errors::ErrorBody)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path((user_id, contact_id)): Path<(String, String)>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiMessage>, ApiError> {
    let Json(body) = payload?;
    let contact = state.contacts.update(&user_id, &contact_id, body).await?;
    let msg = format!("contact with alias {} updated", contact.alias);
    Ok(Json(ApiMessage::with_id(msg, contact.id)))
}

#[utoipa::path(
    delete, path = "/users/{id}/contacts/{contact_id}", tag = "contacts",
    params(
        ("id" = String, Path, description = "Owning user id"),
        ("contact_id" = String, Path, description = "Contact id")
    ),
    responses(
        (status = 200, description = "Deleted", body = ApiMessage),
        (status = 404, description = "Not in this user's list", body = crate::errors::ErrorBody)
    )
)]
pub async fn delete(
    State(state): State<AppState>,
    Path((user_id, contact_id)): Path<(String, String)>,
) -> Result<Json<ApiMessage>, ApiError> {
    state.contacts.delete(&user_id, &contact_id).await?;
    Ok(Json(ApiMessage::with_id(format!("contact {contact_id} deleted"), contact_id)))
}

#[utoipa::path(
    get, path = "/users/contacts/{alias}", tag = "contacts",
    params(("alias" = String, Path, description = "Exact listAlias value")),
    responses(
        (status = 200, description = "Contacts tagged with this list alias"),
        (status = 502, description = "Store failure", body = crate::errors::ErrorBody)
    )
)]
pub async fn by_list_alias(State(state): State<AppState>, Path(alias): Path<String>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(state.contacts.find_by_list_alias(&alias).await?))
}
