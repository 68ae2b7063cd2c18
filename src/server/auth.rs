use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::{RequireUser, SESSION_TTL_DAYS, hash_password, issue_token, verify_password};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{
    LoginRequest, LoginResponse, RegisterRequest, RegisterResponse, UserResponse,
};
use crate::server::response::{ApiError, StoreResultExt};
use crate::server::validation::validate_username;
use crate::store::Store;
use crate::types::{NewUser, Session};

pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
}

/// Issues a fresh session for the user and returns the raw bearer token.
/// Retries on the (unlikely) unique-lookup collision.
fn issue_session(store: &dyn Store, user_id: i64) -> Result<String, ApiError> {
    // Expired rows are dead weight; drop them while we are here anyway.
    if let Err(e) = store.purge_expired_sessions() {
        tracing::warn!("Failed to purge expired sessions: {e}");
    }

    const MAX_RETRIES: u32 = 3;
    for _ in 0..MAX_RETRIES {
        let issued = issue_token().api_err("Failed to generate session token")?;

        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            token_hash: issued.hash,
            token_lookup: issued.lookup,
            user_id,
            created_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
            last_used_at: None,
        };

        match store.create_session(&session) {
            Ok(()) => return Ok(issued.token),
            Err(Error::SessionLookupCollision) => continue,
            Err(e) => {
                tracing::error!("Failed to create session: {e}");
                return Err(ApiError::internal("Failed to create session"));
            }
        }
    }

    Err(ApiError::internal("Failed to create session after retries"))
}

async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    let username = validate_username(req.username.as_deref().unwrap_or_default())?;
    let password = req.password.unwrap_or_default();
    if password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let password_hash = hash_password(&password).api_err("Failed to hash password")?;

    let user = match state.store.create_user(&NewUser {
        username,
        password_hash,
        business_name: req.business_name.filter(|b| !b.trim().is_empty()),
    }) {
        Ok(user) => user,
        Err(Error::AlreadyExists) => {
            return Err(ApiError::bad_request("User already exists"));
        }
        Err(e) => {
            tracing::error!("Failed to create user: {e}");
            return Err(ApiError::internal("Failed to create user"));
        }
    };

    let token = issue_session(state.store.as_ref(), user.id)?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            message: "User created successfully",
            token,
            user: UserResponse::from(&user),
        }),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let username = req.username.as_deref().unwrap_or_default().trim();
    let password = req.password.unwrap_or_default();
    if username.is_empty() || password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    // Identical response for unknown user and wrong password, so callers
    // cannot probe which usernames exist.
    let user = state
        .store
        .get_user_by_username(username)
        .api_err("Failed to look up user")?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    let valid =
        verify_password(&password, &user.password_hash).api_err("Failed to verify password")?;
    if !valid {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = issue_session(state.store.as_ref(), user.id)?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(&user),
    }))
}

async fn me(RequireUser(user): RequireUser) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}
