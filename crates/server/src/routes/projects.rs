use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::{
    db::models::{Id, Project, ProjectPatch, User},
    error::{AppError, Result},
    middleware::auth::AuthUser,
    services::authz::{authorize_project, authorize_user, ProjectScope},
    AppState,
};

use super::{now, optional, required, Ids};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(list_projects).post(create_project))
        .route(
            "/projects/:project_id",
            get(get_project).put(update_project).delete(delete_project),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    pub id: Id,
    pub user_id: Id,
    pub owner_name: String,
    pub title: String,
    pub description: String,
    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<ProjectResponse>,
}

impl ProjectResponse {
    fn new(project: Project, owner: &User) -> Self {
        Self {
            id: project.id,
            user_id: project.user_id,
            owner_name: owner.name.clone(),
            title: project.title,
            description: project.description,
            created_at: project.created_at,
        }
    }
}

async fn list_projects(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProjectListResponse>> {
    let owner = authorize_user(&state.repos, user.id).await?;

    let projects = state
        .repos
        .projects_owned_by(owner.id)
        .await?
        .into_iter()
        .map(|project| ProjectResponse::new(project, &owner))
        .collect();

    Ok(Json(ProjectListResponse { projects }))
}

async fn create_project(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>)> {
    let owner = authorize_user(&state.repos, user.id).await?;
    let title = required(body.title, "Project title is required")?;
    let created_at = now();

    let project = state
        .repos
        .projects
        .create(|id| Project {
            id,
            user_id: owner.id,
            title,
            description: body.description.unwrap_or_default(),
            created_at,
        })
        .await?;

    tracing::info!(project_id = project.id, user_id = owner.id, "Created project");

    Ok((StatusCode::CREATED, Json(ProjectResponse::new(project, &owner))))
}

async fn get_project(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(project_id): Ids<Id>,
) -> Result<Json<ProjectResponse>> {
    let ProjectScope { user, project } =
        authorize_project(&state.repos, user.id, project_id).await?;
    Ok(Json(ProjectResponse::new(project, &user)))
}

async fn update_project(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(project_id): Ids<Id>,
    Json(mut patch): Json<ProjectPatch>,
) -> Result<Json<ProjectResponse>> {
    let ProjectScope { user, project } =
        authorize_project(&state.repos, user.id, project_id).await?;
    patch.title = optional(patch.title.take(), "Project title cannot be empty")?;

    let project = state
        .repos
        .projects
        .update(project.id, &patch.to_record())
        .await?
        .ok_or(AppError::ProjectNotFound)?;

    Ok(Json(ProjectResponse::new(project, &user)))
}

async fn delete_project(
    State(state): State<AppState>,
    user: AuthUser,
    Ids(project_id): Ids<Id>,
) -> Result<Json<()>> {
    let ProjectScope { project, .. } = authorize_project(&state.repos, user.id, project_id).await?;

    if !state.repos.delete_project(project.id).await? {
        return Err(AppError::ProjectNotFound);
    }
    tracing::info!(project_id = project.id, "Deleted project with its lists and tasks");

    Ok(Json(()))
}
