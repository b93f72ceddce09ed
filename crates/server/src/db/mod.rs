pub mod memory;
pub mod models;
pub mod repository;
pub mod store;

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use store::{Record, StorageBackend, StoreError, StoreResult};

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn connect(url: &str) -> anyhow::Result<Self> {
        // Ensure the data directory exists
        if let Some(path) = url.strip_prefix("sqlite:") {
            let path = path.split('?').next().unwrap_or(path);
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for Database {
    async fn load(&self, collection: &str) -> StoreResult<Vec<Record>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT data FROM records WHERE collection = ? ORDER BY position ASC",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|data| serde_json::from_str::<Record>(data).map_err(StoreError::from))
            .collect()
    }

    async fn append(&self, collection: &str, record: &Record) -> StoreResult<()> {
        let data = serde_json::to_string(record)?;

        sqlx::query(
            r#"
            INSERT INTO records (collection, position, data)
            VALUES (?, (SELECT COALESCE(MAX(position), -1) + 1 FROM records WHERE collection = ?), ?)
            "#,
        )
        .bind(collection)
        .bind(collection)
        .bind(&data)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn overwrite(&self, collection: &str, records: &[Record]) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM records WHERE collection = ?")
            .bind(collection)
            .execute(&mut *tx)
            .await?;

        for (position, record) in records.iter().enumerate() {
            let data = serde_json::to_string(record)?;
            sqlx::query("INSERT INTO records (collection, position, data) VALUES (?, ?, ?)")
                .bind(collection)
                .bind(position as i64)
                .bind(&data)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::store::{field_eq, Schema, Table};
    use super::*;

    const ITEMS: Schema = Schema {
        collection: "items",
        columns: &["id", "label"],
    };

    async fn database(dir: &tempfile::TempDir) -> Database {
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("records.db").display());
        let db = Database::connect(&url).await.unwrap();
        db.run_migrations().await.unwrap();
        db
    }

    fn item(id: u64, label: &str) -> Record {
        Record::new().with("id", id.to_string()).with("label", label)
    }

    #[tokio::test]
    async fn missing_collection_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(&dir).await;
        assert!(db.load("nothing").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn table_operations_round_trip_through_sqlite() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(&dir).await;
        let table = Table::new(ITEMS, Arc::new(db.clone()));

        for label in ["a", "b", "c"] {
            table.insert_next(|id| item(id, label)).await.unwrap();
        }

        let patch = Record::new().with("label", "B");
        let updated = table.update_where(field_eq("id", "2"), &patch).await.unwrap();
        assert_eq!(updated, vec![item(2, "B")]);

        assert_eq!(table.delete_where(field_eq("id", "1")).await.unwrap(), 1);

        // Order survives the rewrite, and appends after a rewrite go last
        table.insert_next(|id| item(id, "d")).await.unwrap();
        let all = table.scan_all().await.unwrap();
        assert_eq!(all, vec![item(2, "B"), item(3, "c"), item(4, "d")]);
    }

    #[tokio::test]
    async fn collections_are_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let db = database(&dir).await;

        db.append("left", &item(1, "l")).await.unwrap();
        db.append("right", &item(1, "r")).await.unwrap();
        db.overwrite("left", &[]).await.unwrap();

        assert!(db.load("left").await.unwrap().is_empty());
        assert_eq!(db.load("right").await.unwrap(), vec![item(1, "r")]);
    }

    #[tokio::test]
    async fn data_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        {
            let db = database(&dir).await;
            db.append("items", &item(1, "kept")).await.unwrap();
            db.pool.close().await;
        }
        let db = database(&dir).await;
        assert_eq!(db.load("items").await.unwrap(), vec![item(1, "kept")]);
    }
}
