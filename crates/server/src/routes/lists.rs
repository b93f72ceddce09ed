use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{Id, TaskList, TaskListPatch},
    error::{AppError, Result},
    middleware::auth::AuthUser,
    services::authz::{authorize_list, authorize_project, ListPath, ListScope, ProjectScope},
    AppState,
};

use super::{now, optional, required, Ids};

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/:project_id/lists",
            get(list_lists).post(create_list),
        )
        .route(
            "/projects/:project_id/lists/:list_id",
            get(get_list).put(update_list).delete(delete_list),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListsResponse {
    pub lists: Vec<TaskList>,
}

async fn list_lists(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(project_id): Ids<Id>,
) -> Result<Json<ListsResponse>> {
    let ProjectScope { project, .. } = authorize_project(&state.repos, user.id, project_id).await?;
    let lists = state.repos.lists_in(project.id).await?;
    Ok(Json(ListsResponse { lists }))
}

async fn create_list(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(project_id): Ids<Id>,
    Json(body): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<TaskList>)> {
    let ProjectScope { project, .. } = authorize_project(&state.repos, user.id, project_id).await?;
    let name = required(body.name, "List name is required")?;
    let created_at = now();

    let list = state
        .repos
        .lists
        .create(|id| TaskList {
            id,
            project_id: project.id,
            name,
            created_at,
        })
        .await?;

    tracing::info!(list_id = list.id, project_id = project.id, "Created list");

    Ok((StatusCode::CREATED, Json(list)))
}

async fn get_list(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<ListPath>,
) -> Result<Json<TaskList>> {
    let ListScope { list, .. } = authorize_list(&state.repos, user.id, path).await?;
    Ok(Json(list))
}

async fn update_list(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<ListPath>,
    Json(mut patch): Json<TaskListPatch>,
) -> Result<Json<TaskList>> {
    let ListScope { list, .. } = authorize_list(&state.repos, user.id, path).await?;
    patch.name = optional(patch.name.take(), "List name cannot be empty")?;

    let list = state
        .repos
        .lists
        .update(list.id, &patch.to_record())
        .await?
        .ok_or(AppError::ListNotFound)?;

    Ok(Json(list))
}

async fn delete_list(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(path): Ids<ListPath>,
) -> Result<Json<()>> {
    let ListScope { list, .. } = authorize_list(&state.repos, user.id, path).await?;

    if !state.repos.delete_list(list.id).await? {
        return Err(AppError::ListNotFound);
    }

    Ok(Json(()))
}
