use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
    users::{
        repo_types::{DeleteSummary, User},
        services::validate_new_user,
    },
};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/all", get(list_users))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_user))
        .route("/delete", delete(delete_users))
}

/// GET /all
#[instrument(skip(state))]
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<User>>> {
    let users = state
        .users
        .find_many()
        .await
        .map_err(|e| ApiError::infrastructure("Failed to fetch users", e))?;
    debug!(count = users.len(), "users listed");
    Ok(Json(users))
}

/// DELETE /delete removes every lead; there is no filter.
#[instrument(skip(state))]
pub async fn delete_users(State(state): State<AppState>) -> ApiResult<Json<DeleteSummary>> {
    let summary = state
        .users
        .delete_many()
        .await
        .map_err(|e| ApiError::infrastructure("Failed to delete users", e))?;
    info!(count = summary.count, "users deleted");
    Ok(Json(summary))
}

/// POST /create
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(body) = payload?;
    let new_user = validate_new_user(&body)?;

    let user = state
        .users
        .create(new_user)
        .await
        .map_err(ApiError::Persistence)?;
    info!(user_id = %user.id, "user created");
    Ok(Json(user))
}
