use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use crate::auth::AuthUser;
use crate::constants::{DEFAULT_THEME, ERR_INVALID_CREDENTIALS, ERR_USER_NOT_FOUND};
use crate::error::{AppError, Result};
use crate::extract::ApiJson;
use crate::models::user::{AuthResponse, LoginRequest, ProfilePatch, RegisterRequest, UserSummary};
use crate::models::User;
use crate::security::{hash_password, issue_token, verify_password};
use crate::AppState;

fn auth_response(state: &AppState, user: &User) -> Result<AuthResponse> {
    let token = issue_token(
        user.id,
        &user.email,
        &state.config.jwt_secret,
        state.config.token_ttl_hours,
    )?;

    Ok(AuthResponse {
        token,
        user: UserSummary::from(user),
    })
}

/// Register a new account
///
/// Returns 409 Conflict if the email is already registered.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let email = payload.email.trim().to_lowercase();
    if !User::validate_email(&email) {
        return Err(AppError::InvalidInput("A valid email is required".to_string()));
    }
    if payload.password.is_empty() {
        return Err(AppError::InvalidInput("Password must not be empty".to_string()));
    }

    let password_hash = hash_password(&payload.password)?;
    let now = Utc::now();

    let user = sqlx::query_as::<_, User>(
        "INSERT INTO users (email, password_hash, username, theme, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)
         RETURNING *",
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(payload.username.trim())
    .bind(DEFAULT_THEME)
    .bind(now)
    .bind(now)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match AppError::from(e) {
        AppError::Conflict(_) => {
            tracing::info!("Registration rejected, email already in use");
            AppError::Conflict("Email is already registered".to_string())
        }
        other => other,
    })?;

    tracing::info!("New user registered: {}", user.id);

    Ok((StatusCode::CREATED, Json(auth_response(&state, &user)?)))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = payload.email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(&email)
        .fetch_optional(&state.db)
        .await?;

    let user = match user {
        Some(user) if verify_password(&payload.password, &user.password_hash) => user,
        _ => {
            tracing::warn!("Failed login attempt");
            return Err(AppError::Unauthorized(ERR_INVALID_CREDENTIALS.to_string()));
        }
    };

    Ok(Json(auth_response(&state, &user)?))
}

async fn fetch_user(state: &AppState, user_id: i64) -> Result<User> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::NotFound(ERR_USER_NOT_FOUND))
}

pub async fn get_profile(State(state): State<AppState>, auth: AuthUser) -> Result<Json<User>> {
    Ok(Json(fetch_user(&state, auth.user_id).await?))
}

/// Update username, avatar, theme or settings; other keys are rejected
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    ApiJson(patch): ApiJson<ProfilePatch>,
) -> Result<Json<User>> {
    let mut user = fetch_user(&state, auth.user_id).await?;
    patch.apply(&mut user);
    user.updated_at = Utc::now();

    sqlx::query(
        "UPDATE users SET username = ?, avatar = ?, theme = ?, settings = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&user.username)
    .bind(&user.avatar)
    .bind(&user.theme)
    .bind(&user.settings)
    .bind(user.updated_at)
    .bind(user.id)
    .execute(&state.db)
    .await?;

    Ok(Json(user))
}
