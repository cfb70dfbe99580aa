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
    get, path = "/messages", tag = "messages",
    responses(
        (status = 200, description = "All messages"),
        (status = 502, description = "Store failure", body = crate::errors::ErrorBody)
    )
)]
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<Value>>, ApiError> {
    Ok(Json(state.messages.list().await?))
}

#[utoipa::path(
    get, path = "/messages/{id}", tag = "messages",
    params(("id" = String, Path, description = "Message id")),
    responses(
        (status = 200, description = "The message"),
        (status = 400, description = "Malformed id", body = crate::errors::ErrorBody),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody)
    )
)]
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.messages.get(&id).await?))
}

#[utoipa::path(
    post, path = "/messages", tag = "messages",
    request_body = crate::openapi::MessageInputDoc,
    responses(
        (status = 201, description = "Created", body = ApiMessage),
        (status = 422, description = "Validation Error", body = crate::errors::ErrorBody)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiMessage>), ApiError> {
    let Json(body) = payload?;
    let message = state.messages.create(body).await?;
    let msg = format!("message {} created at {}", message.identifier, message.timestamp);
    Ok((StatusCode::CREATED, Json(ApiMessage::with_id(msg, message.id))))
}

#[utoipa::path(
    put, path = "/messages/{id}", tag = "messages",
    params(("id" = String, Path, description = "Message id")),
    request_body = crate::openapi::MessagePatchDoc,
    responses(
        (status = 200, description = "Updated", body = ApiMessage),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody),
        (status = 422, description = "Validation Error", body = crate::errors::ErrorBody)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiMessage>, ApiError> {
    let Json(body) = payload?;
    let message = state.messages.update(&id, body).await?;
    let msg = format!("message {} updated", message.identifier);
    Ok(Json(ApiMessage::with_id(msg, message.id)))
}

#[utoipa::path(
    delete, path = "/messages/{id}", tag = "messages",
    params(("id" = String, Path, description = "Message id")),
    responses(
        (status = 200, description = "Deleted", body = ApiMessage),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody)
    )
)]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ApiMessage>, ApiError> {
    state.messages.delete(&id).await?;
    Ok(Json(ApiMessage::with_id(format!("message {id} deleted"), id)))
}
