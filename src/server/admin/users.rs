use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::RequireAdmin;
use crate::server::AppState;
use crate::server::dto::{UserActionResponse, UserResponse};
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};

pub async fn list_users(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let users = state.store.list_users().api_err("Failed to list users")?;

    let responses: Vec<UserResponse> = users.iter().map(UserResponse::from).collect();

    Ok::<_, ApiError>(Json(responses))
}

pub async fn make_admin(
    _admin: RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let user = state
        .store
        .set_user_admin(id, true)
        .api_err("Failed to update user")?
        .or_not_found("User not found")?;

    Ok::<_, ApiError>(Json(UserActionResponse {
        message: "User granted admin privileges",
        user: UserResponse::from(&user),
    }))
}

pub async fn delete_user(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    if id == admin.id {
        return Err(ApiError::bad_request("Cannot delete your own account"));
    }

    let user = state
        .store
        .get_user(id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    // Expenses and sessions cascade with the user row.
    state
        .store
        .delete_user(user.id)
        .api_err("Failed to delete user")?;

    Ok::<_, ApiError>(Json(UserActionResponse {
        message: "User deleted successfully",
        user: UserResponse::from(&user),
    }))
}
