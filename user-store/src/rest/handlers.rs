use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::record::UserData;
use crate::store::{StoreError, UserStore};

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn UserStore>,
}

/// API error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code {
            404 => StatusCode::NOT_FOUND,
            409 => StatusCode::CONFLICT,
            400 => StatusCode::BAD_REQUEST,
            503 => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError {
            code: e.code(),
            error: e.to_string(),
        }
    }
}

// === Version ===

/// Version information
#[derive(Serialize, ToSchema)]
pub struct VersionInfo {
    pub version: String,
}

/// Get service version
#[utoipa::path(
    get,
    path = "/api/v1/version",
    responses(
        (status = 200, description = "Service version", body = VersionInfo)
    ),
    tag = "system"
)]
pub async fn get_version() -> Json<VersionInfo> {
    Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// === User CRUD ===

/// Create a user
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = UserData,
    responses(
        (status = 201, description = "User created", body = UserData),
        (status = 400, description = "Invalid user ID", body = ApiError),
        (status = 409, description = "User ID already exists", body = ApiError)
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(user): Json<UserData>,
) -> Result<(StatusCode, Json<UserData>), ApiError> {
    let created = state.store.create_user(user).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a user by ID
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserData),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<UserData>, ApiError> {
    Ok(Json(state.store.get_user(&id).await?))
}

/// List all users
#[utoipa::path(
    get,
    path = "/api/v1/users",
    responses(
        (status = 200, description = "List of users", body = Vec<UserData>)
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserData>>, ApiError> {
    Ok(Json(state.store.list_users().await?))
}

/// Replace a user
///
/// The body is the complete record; fields left out are reset, not merged.
#[utoipa::path(
    put,
    path = "/api/v1/users/{id}",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = UserData,
    responses(
        (status = 200, description = "User updated", body = UserData),
        (status = 400, description = "Body ID does not match path", body = ApiError),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(mut user): Json<UserData>,
) -> Result<Json<UserData>, ApiError> {
    if user.id.is_empty() {
        user.id = id;
    } else if user.id != id {
        return Err(StoreError::InvalidArgument(format!(
            "body ID '{}' does not match path ID '{}'",
            user.id, id
        ))
        .into());
    }

    Ok(Json(state.store.update_user(user).await?))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 404, description = "User not found", body = ApiError)
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_user(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
