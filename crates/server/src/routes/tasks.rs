use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{Task, TaskPatch},
    error::{AppError, Result},
    middleware::auth::AuthUser,
    services::authz::{authorize_list, authorize_task, ListPath, ListScope, TaskPath, TaskScope},
    AppState,
};

use super::{now, optional, required, Ids};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/:project_id/lists/:list_id/tasks",
            get(list_tasks).post(create_task),
        )
        .route(
            "/projects/:project_id/lists/:list_id/tasks/:task_id",
            get(get_task)
                .put(update_task)
                .patch(update_task)
                .delete(delete_task),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TasksQuery {
    pub completed: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TasksResponse {
    pub tasks: Vec<Task>,
}

fn parse_completed(value: Option<&str>) -> Result<Option<bool>> {
    match value {
        None => Ok(None),
        Some(v) if v.eq_ignore_ascii_case("true") => Ok(Some(true)),
        Some(v) if v.eq_ignore_ascii_case("false") => Ok(Some(false)),
        Some(_) => Err(AppError::Validation(
            "completed must be 'true' or 'false'".to_string(),
        )),
    }
}

async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<ListPath>,
    Query(query): Query<TasksQuery>,
) -> Result<Json<TasksResponse>> {
    let ListScope { list, .. } = authorize_list(&state.repos, user.id, path).await?;
    let completed = parse_completed(query.completed.as_deref())?;

    let tasks = state
        .repos
        .tasks_in(list.id)
        .await?
        .into_iter()
        .filter(|task| completed.map_or(true, |wanted| task.completed == wanted))
        .collect();

    Ok(Json(TasksResponse { tasks }))
}

async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<ListPath>,
    Json(body): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>)> {
    let ListScope { list, .. } = authorize_list(&state.repos, user.id, path).await?;
    let title = required(body.title, "Task title is required")?;
    let created_at = now();

    let task = state
        .repos
        .tasks
        .create(|id| Task {
            id,
            list_id: list.id,
            title,
            description: body.description.unwrap_or_default(),
            completed: false,
            created_at,
        })
        .await?;

    tracing::info!(task_id = task.id, list_id = list.id, "Created task");

    Ok((StatusCode::CREATED, Json(task)))
}

async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<TaskPath>,
) -> Result<Json<Task>> {
    let TaskScope { task, .. } = authorize_task(&state.repos, user.id, path).await?;
    Ok(Json(task))
}

async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<TaskPath>,
    Json(mut patch): Json<TaskPatch>,
) -> Result<Json<Task>> {
    let TaskScope { task, .. } = authorize_task(&state.repos, user.id, path).await?;
    patch.title = optional(patch.title.take(), "Task title cannot be empty")?;

    let task = state
        .repos
        .tasks
        .update(task.id, &patch.to_record())
        .await?
        .ok_or(AppError::TaskNotFound)?;

    Ok(Json(task))
}

async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<TaskPath>,
) -> Result<Json<()>> {
    let TaskScope { task, .. } = authorize_task(&state.repos, user.id, path).await?;

    if !state.repos.delete_task(task.id).await? {
        return Err(AppError::TaskNotFound);
    }

    Ok(Json(()))
}
