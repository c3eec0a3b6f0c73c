use axum::{
    Json, Router,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use super::handlers::{self, AppState};
use crate::record::UserData;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Store API",
        version = "0.1.0",
        description = "REST API for the user store. Provides existence-aware create, read, update and delete of user records.",
        license(name = "Apache-2.0")
    ),
    tags(
        (name = "system", description = "System information"),
        (name = "users", description = "User CRUD operations")
    ),
    paths(
        handlers::get_version,
        handlers::create_user,
        handlers::get_user,
        handlers::list_users,
        handlers::update_user,
        handlers::delete_user,
    ),
    components(schemas(handlers::VersionInfo, handlers::ApiError, UserData))
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // System
        .route("/version", get(handlers::get_version))
        // Users
        .route("/users", get(handlers::list_users))
        .route("/users", post(handlers::create_user))
        .route("/users/{id}", get(handlers::get_user))
        .route("/users/{id}", put(handlers::update_user))
        .route("/users/{id}", delete(handlers::delete_user));

    Router::new()
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
