use serde::{Deserialize, Serialize};

use super::store::{Record, Schema, StoreError, StoreResult};

pub type Id = u64;

/// A typed view over one record collection.
pub trait Entity: Sized {
    const SCHEMA: Schema;

    fn from_record(record: &Record) -> StoreResult<Self>;
    fn to_record(&self) -> Record;
}

fn parse_id(record: &Record, column: &str, collection: &str) -> StoreResult<Id> {
    record
        .get(column)
        .trim()
        .parse()
        .map_err(|_| StoreError::Corrupt {
            collection: collection.to_string(),
            reason: format!("invalid {column} '{}'", record.get(column)),
        })
}

fn parse_bool(value: &str) -> bool {
    value == "true"
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Id,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: String,
}

impl Entity for User {
    const SCHEMA: Schema = Schema {
        collection: "users",
        columns: &["id", "name", "email", "password_hash", "created_at"],
    };

    fn from_record(record: &Record) -> StoreResult<Self> {
        Ok(Self {
            id: parse_id(record, "id", Self::SCHEMA.collection)?,
            name: record.get("name").to_string(),
            email: record.get("email").to_string(),
            password_hash: record.get("password_hash").to_string(),
            created_at: record.get("created_at").to_string(),
        })
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", self.id.to_string())
            .with("name", self.name.as_str())
            .with("email", self.email.as_str())
            .with("password_hash", self.password_hash.as_str())
            .with("created_at", self.created_at.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub user_id: Id,
    pub title: String,
    pub description: String,
    pub created_at: String,
}

impl Entity for Project {
    const SCHEMA: Schema = Schema {
        collection: "projects",
        columns: &["id", "user_id", "title", "description", "created_at"],
    };

    fn from_record(record: &Record) -> StoreResult<Self> {
        let collection = Self::SCHEMA.collection;
        Ok(Self {
            id: parse_id(record, "id", collection)?,
            user_id: parse_id(record, "user_id", collection)?,
            title: record.get("title").to_string(),
            description: record.get("description").to_string(),
            created_at: record.get("created_at").to_string(),
        })
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", self.id.to_string())
            .with("user_id", self.user_id.to_string())
            .with("title", self.title.as_str())
            .with("description", self.description.as_str())
            .with("created_at", self.created_at.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskList {
    pub id: Id,
    pub project_id: Id,
    pub name: String,
    pub created_at: String,
}

impl Entity for TaskList {
    const SCHEMA: Schema = Schema {
        collection: "lists",
        columns: &["id", "project_id", "name", "created_at"],
    };

    fn from_record(record: &Record) -> StoreResult<Self> {
        let collection = Self::SCHEMA.collection;
        Ok(Self {
            id: parse_id(record, "id", collection)?,
            project_id: parse_id(record, "project_id", collection)?,
            name: record.get("name").to_string(),
            created_at: record.get("created_at").to_string(),
        })
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", self.id.to_string())
            .with("project_id", self.project_id.to_string())
            .with("name", self.name.as_str())
            .with("created_at", self.created_at.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Id,
    pub list_id: Id,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub created_at: String,
}

impl Entity for Task {
    const SCHEMA: Schema = Schema {
        collection: "tasks",
        columns: &["id", "list_id", "title", "description", "completed", "created_at"],
    };

    fn from_record(record: &Record) -> StoreResult<Self> {
        let collection = Self::SCHEMA.collection;
        Ok(Self {
            id: parse_id(record, "id", collection)?,
            list_id: parse_id(record, "list_id", collection)?,
            title: record.get("title").to_string(),
            description: record.get("description").to_string(),
            completed: parse_bool(record.get("completed")),
            created_at: record.get("created_at").to_string(),
        })
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", self.id.to_string())
            .with("list_id", self.list_id.to_string())
            .with("title", self.title.as_str())
            .with("description", self.description.as_str())
            .with("completed", self.completed.to_string())
            .with("created_at", self.created_at.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Id,
    pub task_id: Id,
    pub content: String,
    pub created_at: String,
}

impl Entity for Comment {
    const SCHEMA: Schema = Schema {
        collection: "comments",
        columns: &["id", "task_id", "content", "created_at"],
    };

    fn from_record(record: &Record) -> StoreResult<Self> {
        let collection = Self::SCHEMA.collection;
        Ok(Self {
            id: parse_id(record, "id", collection)?,
            task_id: parse_id(record, "task_id", collection)?,
            content: record.get("content").to_string(),
            created_at: record.get("created_at").to_string(),
        })
    }

    fn to_record(&self) -> Record {
        Record::new()
            .with("id", self.id.to_string())
            .with("task_id", self.task_id.to_string())
            .with("content", self.content.as_str())
            .with("created_at", self.created_at.as_str())
    }
}

// Partial updates: only `Some` fields reach the stored record.

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

impl UserPatch {
    pub fn to_record(&self) -> Record {
        let mut patch = Record::new();
        if let Some(name) = &self.name {
            patch.set("name", name.as_str());
        }
        if let Some(email) = &self.email {
            patch.set("email", email.as_str());
        }
        if let Some(hash) = &self.password_hash {
            patch.set("password_hash", hash.as_str());
        }
        patch
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl ProjectPatch {
    pub fn to_record(&self) -> Record {
        let mut patch = Record::new();
        if let Some(title) = &self.title {
            patch.set("title", title.as_str());
        }
        if let Some(description) = &self.description {
            patch.set("description", description.as_str());
        }
        patch
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskListPatch {
    pub name: Option<String>,
}

impl TaskListPatch {
    pub fn to_record(&self) -> Record {
        let mut patch = Record::new();
        if let Some(name) = &self.name {
            patch.set("name", name.as_str());
        }
        patch
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn to_record(&self) -> Record {
        let mut patch = Record::new();
        if let Some(title) = &self.title {
            patch.set("title", title.as_str());
        }
        if let Some(description) = &self.description {
            patch.set("description", description.as_str());
        }
        if let Some(completed) = self.completed {
            patch.set("completed", completed.to_string());
        }
        patch
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommentPatch {
    pub content: Option<String>,
}

impl CommentPatch {
    pub fn to_record(&self) -> Record {
        let mut patch = Record::new();
        if let Some(content) = &self.content {
            patch.set("content", content.as_str());
        }
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_completed_reads_false_for_anything_but_true() {
        let mut record = Task {
            id: 1,
            list_id: 2,
            title: "t".into(),
            description: String::new(),
            completed: true,
            created_at: String::new(),
        }
        .to_record();
        assert!(Task::from_record(&record).unwrap().completed);

        record.set("completed", "");
        assert!(!Task::from_record(&record).unwrap().completed);
        record.set("completed", "yes");
        assert!(!Task::from_record(&record).unwrap().completed);
    }

    #[test]
    fn non_numeric_parent_id_is_corrupt() {
        let record = Record::new()
            .with("id", "1")
            .with("project_id", "abc")
            .with("name", "Todo");
        let err = TaskList::from_record(&record).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { .. }));
    }

    #[test]
    fn empty_patch_produces_empty_record() {
        assert!(TaskPatch::default().to_record().is_empty());
        let patch = TaskPatch {
            completed: Some(false),
            ..Default::default()
        };
        let record = patch.to_record();
        assert_eq!(record.get("completed"), "false");
        assert!(!record.contains("title"));
    }

    #[test]
    fn user_serialization_hides_password_hash() {
        let user = User {
            id: 1,
            name: "Ana".into(),
            email: "ana@x.com".into(),
            password_hash: "secret-hash".into(),
            created_at: String::new(),
        };
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ana@x.com");
    }
}
