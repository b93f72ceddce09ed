use serde::Deserialize;

use crate::{
    db::{
        models::{Comment, Id, Project, Task, TaskList, User},
        repository::Repositories,
    },
    error::{AppError, Result},
};

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListPath {
    pub project_id: Id,
    pub list_id: Id,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TaskPath {
    pub project_id: Id,
    pub list_id: Id,
    pub task_id: Id,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CommentPath {
    pub project_id: Id,
    pub list_id: Id,
    pub task_id: Id,
    pub comment_id: Id,
}

impl TaskPath {
    pub fn list(&self) -> ListPath {
        ListPath {
            project_id: self.project_id,
            list_id: self.list_id,
        }
    }
}

impl CommentPath {
    pub fn task(&self) -> TaskPath {
        TaskPath {
            project_id: self.project_id,
            list_id: self.list_id,
            task_id: self.task_id,
        }
    }
}

pub struct ProjectScope {
    pub user: User,
    pub project: Project,
}

pub struct ListScope {
    pub user: User,
    pub project: Project,
    pub list: TaskList,
}

pub struct TaskScope {
    pub user: User,
    pub project: Project,
    pub list: TaskList,
    pub task: Task,
}

pub struct CommentScope {
    pub user: User,
    pub project: Project,
    pub list: TaskList,
    pub task: Task,
    pub comment: Comment,
}

/// The caller's own record. A valid token for a deleted user lands here.
pub async fn authorize_user(repos: &Repositories, caller: Id) -> Result<User> {
    repos.users.get(caller).await?.ok_or(AppError::UserNotFound)
}

pub async fn authorize_project(
    repos: &Repositories,
    caller: Id,
    project_id: Id,
) -> Result<ProjectScope> {
    let user = authorize_user(repos, caller).await?;
    // Existence is checked before ownership
    let project = repos
        .projects
        .get(project_id)
        .await?
        .ok_or(AppError::ProjectNotFound)?;

    if project.user_id != user.id {
        tracing::warn!(caller, project_id, "Project access denied");
        return Err(AppError::Forbidden);
    }

    Ok(ProjectScope { user, project })
}

pub async fn authorize_list(repos: &Repositories, caller: Id, path: ListPath) -> Result<ListScope> {
    let ProjectScope { user, project } = authorize_project(repos, caller, path.project_id).await?;
    let list = repos
        .lists
        .get(path.list_id)
        .await?
        .ok_or(AppError::ListNotFound)?;

    if list.project_id != project.id {
        return Err(AppError::ListMismatch);
    }

    Ok(ListScope {
        user,
        project,
        list,
    })
}

pub async fn authorize_task(repos: &Repositories, caller: Id, path: TaskPath) -> Result<TaskScope> {
    let ListScope {
        user,
        project,
        list,
    } = authorize_list(repos, caller, path.list()).await?;
    let task = repos
        .tasks
        .get(path.task_id)
        .await?
        .ok_or(AppError::TaskNotFound)?;

    if task.list_id != list.id {
        return Err(AppError::TaskMismatch);
    }

    Ok(TaskScope {
        user,
        project,
        list,
        task,
    })
}

pub async fn authorize_comment(
    repos: &Repositories,
    caller: Id,
    path: CommentPath,
) -> Result<CommentScope> {
    let TaskScope {
        user,
        project,
        list,
        task,
    } = authorize_task(repos, caller, path.task()).await?;
    let comment = repos
        .comments
        .get(path.comment_id)
        .await?
        .ok_or(AppError::CommentNotFound)?;

    if comment.task_id != task.id {
        return Err(AppError::CommentMismatch);
    }

    Ok(CommentScope {
        user,
        project,
        list,
        task,
        comment,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two users, each with one project holding one list, task and comment.
    /// Ana (1) owns project 1 / list 1 / task 1 / comment 1, Beto (2) owns
    /// project 2 / list 2 / task 2 / comment 2.
    async fn two_tenants() -> Repositories {
        let repos = Repositories::in_memory();
        for name in ["Ana", "Beto"] {
            let user = repos
                .users
                .create(|id| User {
                    id,
                    name: name.to_string(),
                    email: format!("{}@x.com", name.to_lowercase()),
                    password_hash: String::new(),
                    created_at: String::new(),
                })
                .await
                .unwrap();
            let project = repos
                .projects
                .create(|id| Project {
                    id,
                    user_id: user.id,
                    title: format!("{name}'s project"),
                    description: String::new(),
                    created_at: String::new(),
                })
                .await
                .unwrap();
            let list = repos
                .lists
                .create(|id| TaskList {
                    id,
                    project_id: project.id,
                    name: "Todo".to_string(),
                    created_at: String::new(),
                })
                .await
                .unwrap();
            let task = repos
                .tasks
                .create(|id| Task {
                    id,
                    list_id: list.id,
                    title: "Design".to_string(),
                    description: String::new(),
                    completed: false,
                    created_at: String::new(),
                })
                .await
                .unwrap();
            repos
                .comments
                .create(|id| Comment {
                    id,
                    task_id: task.id,
                    content: "Looks good".to_string(),
                    created_at: String::new(),
                })
                .await
                .unwrap();
        }
        repos
    }

    fn comment_path(project_id: Id, list_id: Id, task_id: Id, comment_id: Id) -> CommentPath {
        CommentPath {
            project_id,
            list_id,
            task_id,
            comment_id,
        }
    }

    #[tokio::test]
    async fn full_chain_resolves_every_link() {
        let repos = two_tenants().await;
        let scope = authorize_comment(&repos, 1, comment_path(1, 1, 1, 1))
            .await
            .unwrap();
        assert_eq!(scope.user.name, "Ana");
        assert_eq!(scope.project.id, 1);
        assert_eq!(scope.list.id, 1);
        assert_eq!(scope.task.id, 1);
        assert_eq!(scope.comment.content, "Looks good");
    }

    #[tokio::test]
    async fn unknown_caller_fails_before_anything_else() {
        let repos = two_tenants().await;
        let err = authorize_comment(&repos, 99, comment_path(99, 99, 99, 99))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn missing_project_wins_over_forbidden() {
        let repos = two_tenants().await;
        let err = authorize_project(&repos, 2, 42).await.err().unwrap();
        assert!(matches!(err, AppError::ProjectNotFound));
    }

    #[tokio::test]
    async fn foreign_project_and_descendants_are_forbidden() {
        let repos = two_tenants().await;

        let err = authorize_project(&repos, 2, 1).await.err().unwrap();
        assert!(matches!(err, AppError::Forbidden));

        let err = authorize_comment(&repos, 2, comment_path(1, 1, 1, 1))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Forbidden));

        // Even when the child ids are nonsense, ownership fails first
        let err = authorize_comment(&repos, 2, comment_path(1, 77, 77, 77))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[tokio::test]
    async fn list_from_another_project_is_a_mismatch() {
        let repos = two_tenants().await;
        // Ana owns project 1; list 2 exists but lives in Beto's project 2
        let err = authorize_list(
            &repos,
            1,
            ListPath {
                project_id: 1,
                list_id: 2,
            },
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, AppError::ListMismatch));

        let err = authorize_list(
            &repos,
            1,
            ListPath {
                project_id: 1,
                list_id: 9,
            },
        )
        .await
        .err()
        .unwrap();
        assert!(matches!(err, AppError::ListNotFound));
    }

    #[tokio::test]
    async fn task_and_comment_mismatches() {
        let repos = two_tenants().await;

        let err = authorize_comment(&repos, 1, comment_path(1, 1, 2, 1))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::TaskMismatch));

        let err = authorize_comment(&repos, 1, comment_path(1, 1, 1, 2))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::CommentMismatch));

        let err = authorize_comment(&repos, 1, comment_path(1, 1, 5, 1))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::TaskNotFound));

        let err = authorize_comment(&repos, 1, comment_path(1, 1, 1, 5))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::CommentNotFound));
    }

    #[tokio::test]
    async fn deleted_user_keeps_nothing() {
        let repos = two_tenants().await;
        repos.delete_user(1).await.unwrap();
        let err = authorize_project(&repos, 1, 1).await.err().unwrap();
        assert!(matches!(err, AppError::UserNotFound));
    }
}
