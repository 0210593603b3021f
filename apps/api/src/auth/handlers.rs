//! Axum route handlers for signup, login, and session introspection.

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, token_digest, verify_password};
use crate::errors::AppError;
use crate::models::user::{User, UserResponse};
use crate::state::AppState;

const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub user: UserResponse,
}

/// POST /api/auth/signup
pub async fn handle_signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Validation(
            "a valid email address is required".to_string(),
        ));
    }
    if request.password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let existing: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::Validation("Email already registered".to_string()));
    }

    let user: User = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, password_hash)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(request.name.trim())
    .bind(hash_password(&request.password))
    .fetch_one(&state.db)
    .await?;

    info!("Registered user {}", user.id);

    let access_token = issue_session(&state.db, user.id).await?;
    Ok(Json(TokenResponse {
        access_token,
        user: UserResponse::from(&user),
    }))
}

/// POST /api/auth/login
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn handle_login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let email = request.email.trim().to_lowercase();

    let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let Some(user) = user else {
        return Err(AppError::Unauthorized);
    };
    if !verify_password(&request.password, &user.password_hash) {
        return Err(AppError::Unauthorized);
    }

    let access_token = issue_session(&state.db, user.id).await?;
    Ok(Json(TokenResponse {
        access_token,
        user: UserResponse::from(&user),
    }))
}

/// GET /api/auth/me
pub async fn handle_me(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, AppError> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;

    let user: Option<User> = sqlx::query_as(
        r#"
        SELECT u.* FROM users u
        JOIN sessions s ON s.user_id = u.id
        WHERE s.token_digest = $1 AND s.expires_at > now()
        "#,
    )
    .bind(token_digest(token))
    .fetch_optional(&state.db)
    .await?;

    match user {
        Some(user) => Ok(Json(UserResponse::from(&user))),
        None => Err(AppError::Unauthorized),
    }
}

/// Creates a session row and returns the raw token for the client.
async fn issue_session(pool: &PgPool, user_id: Uuid) -> Result<String, AppError> {
    let token = Uuid::new_v4().simple().to_string();
    let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);

    sqlx::query(
        r#"
        INSERT INTO sessions (id, user_id, token_digest, expires_at)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(token_digest(&token))
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(token)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token_parses_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_rejects_other_schemes() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }
}
