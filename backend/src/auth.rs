//! Registration, login and session resolution.

use axum::{extract::State, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ApiError, Result, ValidationError};
use crate::store::User;
use crate::SharedState;

/// View of a user safe to return to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
        }
    }
}

/// Pull the opaque token out of an `Authorization: Bearer` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the request's bearer token to a user id or fail with 401.
pub async fn require_user(state: &SharedState, headers: &HeaderMap) -> Result<i64> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthorized)?;
    state
        .store
        .user_id_for_token(token)
        .await?
        .ok_or(ApiError::Unauthorized)
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// POST /api/register
pub async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<Value>> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_lowercase();

    if username.is_empty() {
        return Err(ValidationError::UsernameRequired.into());
    }
    if !email.contains('@') {
        return Err(ValidationError::EmailInvalid.into());
    }
    if req.password.len() < 8 {
        return Err(ValidationError::PasswordTooShort.into());
    }

    let user = state.store.create_user(&username, &email, &req.password).await?;
    tracing::info!(user_id = user.id, "registered new account");

    Ok(Json(json!({ "ok": true, "user": PublicUser::from(user) })))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

/// POST /api/login
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<Value>> {
    let identifier = req.identifier.trim();
    if identifier.is_empty() {
        return Err(ValidationError::IdentifierRequired.into());
    }
    if req.password.len() < 8 {
        return Err(ValidationError::PasswordInvalid.into());
    }

    let user = state
        .store
        .find_user(identifier)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !crate::store::verify_password(&user.password_hash, &req.password) {
        return Err(ApiError::InvalidCredentials);
    }

    let token = state.store.create_session(user.id, req.remember).await?;
    tracing::info!(user_id = user.id, remember = req.remember, "login");

    Ok(Json(json!({
        "ok": true,
        "user": PublicUser::from(user),
        "token": token,
    })))
}

/// POST /api/logout
pub async fn logout(State(state): State<SharedState>, headers: HeaderMap) -> Result<Json<Value>> {
    if let Some(token) = bearer_token(&headers) {
        state.store.revoke_session(token).await?;
    }
    Ok(Json(json!({ "ok": true })))
}

/// GET /api/me — `user` is null rather than an error when unauthenticated,
/// so the client can branch without special-casing a 401.
pub async fn me(State(state): State<SharedState>, headers: HeaderMap) -> Result<Json<Value>> {
    let user = match bearer_token(&headers) {
        Some(token) => match state.store.user_id_for_token(token).await? {
            Some(user_id) => state.store.get_user(user_id).await?.map(PublicUser::from),
            None => None,
        },
        None => None,
    };

    Ok(Json(json!({ "ok": true, "user": user })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_token_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers), None);

        headers.insert(axum::http::header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));

        headers.insert(axum::http::header::AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);

        headers.insert(axum::http::header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
    }
}
