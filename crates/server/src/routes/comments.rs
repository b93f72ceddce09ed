use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{Comment, CommentPatch},
    error::{AppError, Result},
    middleware::auth::AuthUser,
    services::authz::{
        authorize_comment, authorize_task, CommentPath, CommentScope, TaskPath, TaskScope,
    },
    AppState,
};

use super::{now, required, Ids};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/:project_id/lists/:list_id/tasks/:task_id/comments",
            get(list_comments).post(create_comment),
        )
        .route(
            "/projects/:project_id/lists/:list_id/tasks/:task_id/comments/:comment_id",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
}

#[derive(Debug, Deserialize)]
pub struct CommentRequest {
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentsResponse {
    pub comments: Vec<Comment>,
}

async fn list_comments(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<TaskPath>,
) -> Result<Json<CommentsResponse>> {
    let TaskScope { task, .. } = authorize_task(&state.repos, user.id, path).await?;
    let comments = state.repos.comments_on(task.id).await?;
    Ok(Json(CommentsResponse { comments }))
}

async fn create_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<TaskPath>,
    Json(body): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let TaskScope { task, .. } = authorize_task(&state.repos, user.id, path).await?;
    let content = required(body.content, "Comment content is required")?;
    let created_at = now();

    let comment = state
        .repos
        .comments
        .create(|id| Comment {
            id,
            task_id: task.id,
            content,
            created_at,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

async fn get_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<CommentPath>,
) -> Result<Json<Comment>> {
    let CommentScope { comment, .. } = authorize_comment(&state.repos, user.id, path).await?;
    Ok(Json(comment))
}

async fn update_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<CommentPath>,
    Json(body): Json<CommentRequest>,
) -> Result<Json<Comment>> {
    let CommentScope { comment, .. } = authorize_comment(&state.repos, user.id, path).await?;
    let content = required(body.content, "Comment content is required")?;

    let patch = CommentPatch {
        content: Some(content),
    };
    let comment = state
        .repos
        .comments
        .update(comment.id, &patch.to_record())
        .await?
        .ok_or(AppError::CommentNotFound)?;

    Ok(Json(comment))
}

async fn delete_comment(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<CommentPath>,
) -> Result<Json<()>> {
    let CommentScope { comment, .. } = authorize_comment(&state.repos, user.id, path).await?;

    if !state.repos.delete_comment(comment.id).await? {
        return Err(AppError::CommentNotFound);
    }

    Ok(Json(()))
}
