use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{
    db::{models::User, store::Guarded},
    error::{AppError, Result},
    middleware::auth::{bearer_token, BearerHeader},
    services::{
        credentials::{hash_password, verify_password},
        tokens::TokenKind,
    },
    AppState,
};

use super::{now, required, secret};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
}

fn auth_response(state: &AppState, user: User) -> Result<AuthResponse> {
    Ok(AuthResponse {
        access_token: state.tokens.issue_access(user.id)?,
        refresh_token: state.tokens.issue_refresh(user.id)?,
        user,
    })
}

async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    // Validate input
    let name = required(body.name, "Name is required")?;
    let email = required(body.email, "Email is required")?;
    if !email.contains('@') {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    let password = secret(body.password, "Password is required")?;

    // Hash before taking the users lock
    let password_hash = hash_password(&password)?;
    let created_at = now();
    let user = User {
        id: 0,
        name,
        email: email.clone(),
        password_hash,
        created_at,
    };

    let user = match state
        .repos
        .create_user(&email, |id| User { id, ..user })
        .await?
    {
        Guarded::Written(user) => user,
        Guarded::Conflict => return Err(AppError::DuplicateEmail),
    };

    tracing::info!(user_id = user.id, "Registered user");

    Ok((StatusCode::CREATED, Json(auth_response(&state, user)?)))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let email = required(body.email, "Email is required")?;
    let password = secret(body.password, "Password is required")?;

    let user = state
        .repos
        .user_by_email(&email)
        .await?
        .ok_or(AppError::CredentialInvalid)?;

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::CredentialInvalid);
    }

    Ok(Json(auth_response(&state, user)?))
}

async fn refresh(
    State(state): State<AppState>,
    header: BearerHeader,
) -> Result<Json<RefreshResponse>> {
    let token = bearer_token(&header)?;
    let user_id = state.tokens.verify(token, TokenKind::Refresh)?;

    let user = state
        .repos
        .users
        .get(user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;

    Ok(Json(RefreshResponse {
        access_token: state.tokens.issue_access(user.id)?,
    }))
}
