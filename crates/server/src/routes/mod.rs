pub mod auth;
pub mod comments;
pub mod lists;
pub mod projects;
pub mod tasks;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use chrono::Utc;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};

// Path parameters, rejected as validation errors when they do not parse
pub struct Ids<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Ids<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let Path(ids) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(ids))
    }
}

/// Present and not blank; returned trimmed.
pub(crate) fn required(value: Option<String>, message: &str) -> Result<String> {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_string()),
        _ => Err(AppError::Validation(message.to_string())),
    }
}

/// Absent is fine, blank is not; returned trimmed.
pub(crate) fn optional(value: Option<String>, message: &str) -> Result<Option<String>> {
    match value {
        Some(value) => required(Some(value), message).map(Some),
        None => Ok(None),
    }
}

// Passwords keep their surrounding whitespace
pub(crate) fn secret(value: Option<String>, message: &str) -> Result<String> {
    match value {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Validation(message.to_string())),
    }
}

pub(crate) fn now() -> String {
    Utc::now().to_rfc3339()
}
