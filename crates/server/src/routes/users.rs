use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::IntoParams;

use crate::errors::ApiError;
use crate::responses::ApiMessage;
use crate::state::AppState;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AliasQuery {
    /// Case-insensitive substring of the alias; empty returns everyone
    pub alias: Option<String>,
}

#[utoipa::path(
    get, path = "/users", tag = "users",
    params(AliasQuery),
    responses(
        (status = 200, description = "Users, optionally filtered by alias"),
        (status = 400, description = "Malformed query string", body = crate::errors::ErrorBody),
        (status = 502, description = "Store failure", body = crate::errors::ErrorBody)
    )
)]
pub async fn list(
    State(state): State<AppState>,
    query: Result<Query<AliasQuery>, QueryRejection>,
) -> Result<Json<Vec<Value>>, ApiError> {
    let Query(q) = query?;
    let users = state.users.list(q.alias.as_deref()).await?;
    Ok(Json(users))
}

#[utoipa::path(
    get, path = "/users/{id}", tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "The user"),
        (status = 400, description = "Malformed id", body = crate::errors::ErrorBody),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody)
    )
)]
pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    Ok(Json(state.users.get(&id).await?))
}

#[utoipa::path(
    post, path = "/users", tag = "users",
    request_body = crate::openapi::UserInputDoc,
    responses(
        (status = 201, description = "Created", body = ApiMessage),
        (status = 409, description = "Phone already registered", body = crate::errors::ErrorBody),
        (status = 422, description = "Validation Error", body = crate::errors::ErrorBody)
    )
)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiMessage>), ApiError> {
    let Json(body) = payload?;
    let user = state.users.create(body).await?;
    let msg = format!("user with phone {} and alias {} created", user.phone, user.alias);
    Ok((StatusCode::CREATED, Json(ApiMessage::with_id(msg, user.id))))
}

#[utoipa::path(
    put, path = "/users/{id}", tag = "users",
    params(("id" = String, Path, description = "User id")),
    request_body = crate::openapi::UserPatchDoc,
    responses(
        (status = 200, description = "Updated", body = ApiMessage),
        (status = 404, description = "Not Found", body = crate::errors::ErrorBody),
        (status = 409, description = "Phone already registered", body = crate::errors::ErrorBody),
        (status = 422, description = "Validation Error", body = crate::errors::ErrorBody)
    )
)]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ApiMessage>, ApiError> {
    let Json(body) = payload?;
    let user = state.users.update(&id, body).await?;
    let msg = format!("user with alias {} updated", user.alias);
    Ok(Json(ApiMessage::with_id(msg, user.id)))
}

#[utoipa::path(
    delete, path = "/users/{id}", tag = "users",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Deleted, or nothing to delete", body = ApiMessage),
        (status = 400, description = "Malformed id", body = crate::errors::ErrorBody)
    )
)]
pub async fn delete(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<ApiMessage>, ApiError> {
    let msg = if state.users.delete(&id).await? {
        format!("user {id} deleted")
    } else {
        format!("user {id} does not exist, nothing was deleted")
    };
    Ok(Json(ApiMessage::with_id(msg, id)))
}
