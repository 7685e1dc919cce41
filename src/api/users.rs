use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::api::pagination::{clamp_page, PaginatedResponse};
use crate::core::state::AppState;
use crate::repositories;
use crate::schemas::user::{ListUsersQuery, UserResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_users)).route("/:user_id", get(get_user))
}

async fn list_users(
    Query(params): Query<ListUsersQuery>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<PaginatedResponse<UserResponse>>, ApiError> {
    let (skip, limit) = clamp_page(params.skip, params.limit);
    let filter = repositories::users::ListUsersFilter {
        is_admin: params.is_admin,
        username_prefix: params.username,
        skip,
        limit,
    };

    let users = repositories::users::list(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list users"))?;
    let total_count = repositories::users::count(state.db(), &filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count users"))?;

    Ok(Json(PaginatedResponse {
        items: users.into_iter().map(UserResponse::from_db).collect(),
        total_count,
        skip,
        limit,
    }))
}

async fn get_user(
    Path(user_id): Path<String>,
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = repositories::users::find_by_id(state.db(), &user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;

    let Some(user) = user else {
        return Err(ApiError::NotFound("User not found".to_string()));
    };

    Ok(Json(UserResponse::from_db(user)))
}
