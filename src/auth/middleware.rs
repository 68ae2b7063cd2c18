use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use super::{parse_token, verify_token};
use crate::server::AppState;
use crate::types::User;

/// Extractor that requires a valid session and resolves its owner.
pub struct RequireUser(pub User);

/// Extractor that additionally requires the admin flag. The flag is read
/// from the store on every request, never from the credential, so revoking
/// admin takes effect immediately.
pub struct RequireAdmin(pub User);

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    TokenExpired,
    UserNotFound,
    NotAdmin,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Not authenticated"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::TokenExpired => (StatusCode::UNAUTHORIZED, "Token expired"),
            AuthError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AuthError::NotAdmin => (StatusCode::FORBIDDEN, "Admin privileges required"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let body = json!({ "error": message });

        let mut response = (status, Json(body)).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                "WWW-Authenticate",
                "Bearer realm=\"tally\"".parse().unwrap(),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state)?;
        Ok(RequireUser(user))
    }
}

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let user = authenticate(parts, state)?;

        if !user.is_admin {
            return Err(AuthError::NotAdmin);
        }

        Ok(RequireAdmin(user))
    }
}

fn authenticate(parts: &Parts, state: &Arc<AppState>) -> Result<User, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let raw_token = extract_bearer_token(auth_header)?.ok_or(AuthError::MissingAuth)?;

    validate_session(state, &raw_token)
}

/// Validates a raw bearer token against the store and resolves the session's
/// user. Touches `last_used_at` on success.
pub fn validate_session(state: &Arc<AppState>, raw_token: &str) -> Result<User, AuthError> {
    let (lookup, _secret) = parse_token(raw_token).map_err(|_| AuthError::InvalidToken)?;

    let session = state
        .store
        .get_session_by_lookup(&lookup)
        .map_err(|_| AuthError::InternalError)?
        .ok_or(AuthError::InvalidToken)?;

    if !verify_token(raw_token, &session.token_hash).map_err(|_| AuthError::InternalError)? {
        return Err(AuthError::InvalidToken);
    }

    if session.expires_at < Utc::now() {
        return Err(AuthError::TokenExpired);
    }

    let user = state
        .store
        .get_user(session.user_id)
        .map_err(|_| AuthError::InternalError)?
        .ok_or(AuthError::UserNotFound)?;

    if let Err(e) = state.store.update_session_last_used(&session.id) {
        tracing::warn!("Failed to update session last_used_at: {e}");
    }

    Ok(user)
}

/// Extracts the token from a Bearer Authorization header.
/// Returns None if no auth header is present.
fn extract_bearer_token(auth_header: Option<&str>) -> Result<Option<String>, AuthError> {
    match auth_header {
        Some(header) if header.starts_with("Bearer ") => {
            Ok(Some(header.strip_prefix("Bearer ").unwrap().to_string()))
        }
        Some(_) => Err(AuthError::InvalidScheme),
        None => Ok(None),
    }
}
