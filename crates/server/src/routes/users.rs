use axum::{extract::State, routing::get, Json, Router};
use serde::Deserialize;

use crate::{
    db::{
        models::{User, UserPatch},
        store::Guarded,
    },
    error::{AppError, Result},
    middleware::auth::AuthUser,
    services::{
        authz::authorize_user,
        credentials::{hash_password, verify_password},
    },
    AppState,
};

use super::{optional, secret};

pub fn router() -> Router<AppState> {
    Router::new().route("/user", get(get_me).put(update_me).delete(delete_me))
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteUserRequest {
    pub password: Option<String>,
}

async fn get_me(State(state): State<AppState>, user: AuthUser) -> Result<Json<User>> {
    Ok(Json(authorize_user(&state.repos, user.id).await?))
}

async fn update_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>> {
    let me = authorize_user(&state.repos, user.id).await?;

    let name = optional(body.name, "Name cannot be empty")?;
    let email = optional(body.email, "Email cannot be empty")?;
    if email.as_deref().is_some_and(|email| !email.contains('@')) {
        return Err(AppError::Validation("Invalid email address".to_string()));
    }
    let password = body
        .password
        .map(|password| secret(Some(password), "Password cannot be empty"))
        .transpose()?;

    let password_hash = password.as_deref().map(hash_password).transpose()?;
    let patch = UserPatch {
        name,
        email,
        password_hash,
    };

    let updated = match state.repos.update_user(me.id, &patch).await? {
        Guarded::Written(updated) => updated.ok_or(AppError::UserNotFound)?,
        Guarded::Conflict => return Err(AppError::DuplicateEmail),
    };

    Ok(Json(updated))
}

async fn delete_me(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<DeleteUserRequest>,
) -> Result<Json<()>> {
    let me = authorize_user(&state.repos, user.id).await?;

    let password = secret(body.password, "Password is required")?;
    if !verify_password(&password, &me.password_hash)? {
        return Err(AppError::CredentialInvalid);
    }

    state.repos.delete_user(me.id).await?;

    Ok(Json(()))
}
