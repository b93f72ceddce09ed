use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::db::store::StoreError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("User not found")]
    UserNotFound,

    #[error("Project not found")]
    ProjectNotFound,

    #[error("List not found")]
    ListNotFound,

    #[error("Task not found")]
    TaskNotFound,

    #[error("Comment not found")]
    CommentNotFound,

    #[error("List does not belong to this project")]
    ListMismatch,

    #[error("Task does not belong to this list")]
    TaskMismatch,

    #[error("Comment does not belong to this task")]
    CommentMismatch,

    #[error("You do not have permission to access this project")]
    Forbidden,

    #[error("Invalid email or password")]
    CredentialInvalid,

    #[error("Email already registered")]
    DuplicateEmail,

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::ListMismatch
            | AppError::TaskMismatch
            | AppError::CommentMismatch => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::UserNotFound | AppError::CredentialInvalid => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::ProjectNotFound
            | AppError::ListNotFound
            | AppError::TaskNotFound
            | AppError::CommentNotFound => StatusCode::NOT_FOUND,
            AppError::DuplicateEmail => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::ProjectNotFound => "PROJECT_NOT_FOUND",
            AppError::ListNotFound => "LIST_NOT_FOUND",
            AppError::TaskNotFound => "TASK_NOT_FOUND",
            AppError::CommentNotFound => "COMMENT_NOT_FOUND",
            AppError::ListMismatch => "LIST_MISMATCH",
            AppError::TaskMismatch => "TASK_MISMATCH",
            AppError::CommentMismatch => "COMMENT_MISMATCH",
            AppError::Forbidden => "FORBIDDEN",
            AppError::CredentialInvalid => "CREDENTIAL_INVALID",
            AppError::DuplicateEmail => "DUPLICATE_EMAIL",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        tracing::error!("Storage error: {err}");
        AppError::Internal("Storage error".to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Internal details are logged where they occur
            AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (
            status,
            Json(json!({
                "error": message,
                "code": self.code(),
            })),
        )
            .into_response()
    }
}
