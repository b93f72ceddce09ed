use std::marker::PhantomData;
use std::sync::Arc;

use super::memory::MemoryBackend;
use super::models::{Comment, Entity, Id, Project, Task, TaskList, User, UserPatch};
use super::store::{field_eq, Guarded, Record, StorageBackend, StoreResult, Table};

pub struct Repository<E> {
    table: Table,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Repository<E> {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            table: Table::new(E::SCHEMA, backend),
            _entity: PhantomData,
        }
    }

    pub async fn get(&self, id: Id) -> StoreResult<Option<E>> {
        let id = id.to_string();
        self.table
            .find_one(field_eq("id", &id))
            .await?
            .map(|record| E::from_record(&record))
            .transpose()
    }

    pub async fn all(&self) -> StoreResult<Vec<E>> {
        self.table
            .scan_all()
            .await?
            .iter()
            .map(E::from_record)
            .collect()
    }

    pub async fn find_by(&self, column: &str, value: &str) -> StoreResult<Vec<E>> {
        self.table
            .find_many(field_eq(column, value))
            .await?
            .iter()
            .map(E::from_record)
            .collect()
    }

    pub async fn create<F>(&self, build: F) -> StoreResult<E>
    where
        F: FnOnce(Id) -> E + Send,
    {
        let record = self
            .table
            .insert_next(|id| build(id).to_record())
            .await?;
        E::from_record(&record)
    }

    /// Refused when any stored record satisfies `conflict`.
    pub async fn create_unless<C, F>(&self, conflict: C, build: F) -> StoreResult<Guarded<E>>
    where
        C: Fn(&Record) -> bool + Send,
        F: FnOnce(Id) -> E + Send,
    {
        match self
            .table
            .insert_next_unless(conflict, |id| build(id).to_record())
            .await?
        {
            Guarded::Written(record) => E::from_record(&record).map(Guarded::Written),
            Guarded::Conflict => Ok(Guarded::Conflict),
        }
    }

    /// `None` when no entity has this id.
    pub async fn update(&self, id: Id, patch: &Record) -> StoreResult<Option<E>> {
        let id = id.to_string();
        self.table
            .update_where(field_eq("id", &id), patch)
            .await?
            .first()
            .map(E::from_record)
            .transpose()
    }

    pub async fn delete(&self, id: Id) -> StoreResult<bool> {
        let id = id.to_string();
        Ok(self.table.delete_where(field_eq("id", &id)).await? > 0)
    }

    pub async fn update_unless<C>(
        &self,
        id: Id,
        conflict: C,
        patch: &Record,
    ) -> StoreResult<Guarded<Option<E>>>
    where
        C: Fn(&Record) -> bool + Send,
    {
        let id = id.to_string();
        match self
            .table
            .update_where_unless(field_eq("id", &id), conflict, patch)
            .await?
        {
            Guarded::Written(updated) => updated
                .first()
                .map(E::from_record)
                .transpose()
                .map(Guarded::Written),
            Guarded::Conflict => Ok(Guarded::Conflict),
        }
    }

    pub async fn delete_by(&self, column: &str, value: &str) -> StoreResult<usize> {
        self.table.delete_where(field_eq(column, value)).await
    }
}

pub struct Repositories {
    pub users: Repository<User>,
    pub projects: Repository<Project>,
    pub lists: Repository<TaskList>,
    pub tasks: Repository<Task>,
    pub comments: Repository<Comment>,
}

impl Repositories {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            users: Repository::new(Arc::clone(&backend)),
            projects: Repository::new(Arc::clone(&backend)),
            lists: Repository::new(Arc::clone(&backend)),
            tasks: Repository::new(Arc::clone(&backend)),
            comments: Repository::new(backend),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub async fn user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self.users.find_by("email", email).await?.into_iter().next())
    }

    /// Insert a user unless the email is already registered. The check and
    /// the insert run under one lock on the users collection.
    pub async fn create_user<F>(&self, email: &str, build: F) -> StoreResult<Guarded<User>>
    where
        F: FnOnce(Id) -> User + Send,
    {
        self.users.create_unless(field_eq("email", email), build).await
    }

    /// Apply `patch` unless it moves the user onto an email another user holds.
    pub async fn update_user(
        &self,
        user_id: Id,
        patch: &UserPatch,
    ) -> StoreResult<Guarded<Option<User>>> {
        let email = patch.email.as_deref();
        let taken = move |record: &Record| {
            email.map_or(false, |email| {
                record.get("email") == email && record.numeric_id() != user_id
            })
        };
        self.users
            .update_unless(user_id, taken, &patch.to_record())
            .await
    }

    pub async fn projects_owned_by(&self, user_id: Id) -> StoreResult<Vec<Project>> {
        self.projects.find_by("user_id", &user_id.to_string()).await
    }

    pub async fn lists_in(&self, project_id: Id) -> StoreResult<Vec<TaskList>> {
        self.lists.find_by("project_id", &project_id.to_string()).await
    }

    pub async fn tasks_in(&self, list_id: Id) -> StoreResult<Vec<Task>> {
        self.tasks.find_by("list_id", &list_id.to_string()).await
    }

    pub async fn comments_on(&self, task_id: Id) -> StoreResult<Vec<Comment>> {
        self.comments.find_by("task_id", &task_id.to_string()).await
    }

    pub async fn delete_user(&self, user_id: Id) -> StoreResult<bool> {
        for project in self.projects_owned_by(user_id).await? {
            self.delete_project(project.id).await?;
        }
        let removed = self.users.delete(user_id).await?;
        tracing::info!(user_id, removed, "Deleted user");
        Ok(removed)
    }

    pub async fn delete_project(&self, project_id: Id) -> StoreResult<bool> {
        for list in self.lists_in(project_id).await? {
            self.delete_list(list.id).await?;
        }
        let removed = self.projects.delete(project_id).await?;
        tracing::debug!(project_id, removed, "Deleted project");
        Ok(removed)
    }

    pub async fn delete_list(&self, list_id: Id) -> StoreResult<bool> {
        for task in self.tasks_in(list_id).await? {
            self.delete_task(task.id).await?;
        }
        let removed = self.lists.delete(list_id).await?;
        tracing::debug!(list_id, removed, "Deleted list");
        Ok(removed)
    }

    pub async fn delete_task(&self, task_id: Id) -> StoreResult<bool> {
        let comments = self
            .comments
            .delete_by("task_id", &task_id.to_string())
            .await?;
        let removed = self.tasks.delete(task_id).await?;
        tracing::debug!(task_id, comments, removed, "Deleted task");
        Ok(removed)
    }

    pub async fn delete_comment(&self, comment_id: Id) -> StoreResult<bool> {
        self.comments.delete(comment_id).await
    }
}
