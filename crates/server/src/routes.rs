use std::time::Instant;

use axum::{
    extract::Request,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::{metrics, types::Health};

use crate::openapi::ApiDoc;
use crate::state::AppState;

pub mod contacts;
pub mod messages;
pub mod users;

#[utoipa::path(
    get, path = "/health", tag = "health",
    responses((status = 200, description = "Service is up", body = crate::openapi::HealthResponse))
)]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

async fn prometheus_metrics() -> impl IntoResponse {
    metrics::encode_metrics()
}

async fn track_metrics(req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let started = Instant::now();
    let response = next.run(req).await;
    metrics::observe_request(&method, response.status().as_u16(), started.elapsed().as_secs_f64());
    response
}

/// Build the full application router: directory resources, health, metrics and docs.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let ops = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(prometheus_metrics));

    let directory = Router::new()
        .route("/users", get(users::list).post(users::create))
        // static segment wins over `:id`
        .route("/users/contacts/:alias", get(contacts::by_list_alias))
        .route("/users/:id", get(users::get).put(users::update).delete(users::delete))
        .route("/users/:id/contacts", get(contacts::list).post(contacts::create))
        .route(
            "/users/:id/contacts/:contact_id",
            get(contacts::get).put(contacts::update).delete(contacts::delete),
        )
        .route("/messages", get(messages::list).post(messages::create))
        .route(
            "/messages/:id",
            get(messages::get).put(messages::update).delete(messages::delete),
        )
        .with_state(state);

    ops.merge(directory)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(track_metrics))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO).include_headers(false))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO).include_headers(false))
                // 5xx
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
