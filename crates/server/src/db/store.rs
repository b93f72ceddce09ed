use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("corrupt record in '{collection}': {reason}")]
    Corrupt { collection: String, reason: String },

    #[error("no ids left in '{collection}'")]
    IdsExhausted { collection: String },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A single row: column name to string cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(BTreeMap<String, String>);

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<String>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: &str, value: impl Into<String>) {
        self.0.insert(column.to_string(), value.into());
    }

    /// Missing columns read as "".
    pub fn get(&self, column: &str) -> &str {
        self.0.get(column).map(String::as_str).unwrap_or("")
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains_key(column)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    // Missing or non-numeric ids count as 0
    pub fn numeric_id(&self) -> u64 {
        self.get("id").trim().parse().unwrap_or(0)
    }

    pub fn merge(&mut self, patch: &Record) {
        for (column, value) in &patch.0 {
            self.0.insert(column.clone(), value.clone());
        }
    }

    fn materialize(mut self, columns: &[&str]) -> Record {
        let cells = columns
            .iter()
            .map(|column| {
                let value = self.0.remove(*column).unwrap_or_default();
                (column.to_string(), value)
            })
            .collect();
        Record(cells)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Schema {
    pub collection: &'static str,
    pub columns: &'static [&'static str],
}

/// Outcome of a write that is refused when a conflicting record exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Guarded<T> {
    Written(T),
    Conflict,
}

pub fn field_eq<'a>(
    column: &'a str,
    value: &'a str,
) -> impl Fn(&Record) -> bool + Send + Sync + 'a {
    move |record| record.get(column) == value
}

#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// A collection that was never written loads as empty.
    async fn load(&self, collection: &str) -> StoreResult<Vec<Record>>;

    async fn append(&self, collection: &str, record: &Record) -> StoreResult<()>;

    async fn overwrite(&self, collection: &str, records: &[Record]) -> StoreResult<()>;
}

pub struct Table {
    schema: Schema,
    backend: Arc<dyn StorageBackend>,
    lock: Mutex<()>,
}

impl Table {
    pub fn new(schema: Schema, backend: Arc<dyn StorageBackend>) -> Self {
        Self {
            schema,
            backend,
            lock: Mutex::new(()),
        }
    }

    pub async fn insert(&self, record: Record) -> StoreResult<Record> {
        let _guard = self.lock.lock().await;
        self.append_locked(record).await
    }

    /// Allocates the id and appends under one lock acquisition, so concurrent
    /// inserts never share an id.
    pub async fn insert_next<F>(&self, build: F) -> StoreResult<Record>
    where
        F: FnOnce(u64) -> Record + Send,
    {
        let _guard = self.lock.lock().await;
        let records = self.backend.load(self.schema.collection).await?;
        let record = build(self.next_id_of(&records)?);
        self.append_locked(record).await
    }

    /// Like [`Table::insert_next`], but refuses to insert when any stored
    /// record satisfies `conflict`. The check runs under the same lock.
    pub async fn insert_next_unless<C, F>(
        &self,
        conflict: C,
        build: F,
    ) -> StoreResult<Guarded<Record>>
    where
        C: Fn(&Record) -> bool + Send,
        F: FnOnce(u64) -> Record + Send,
    {
        let _guard = self.lock.lock().await;
        let records = self.backend.load(self.schema.collection).await?;
        if records.iter().any(|record| conflict(record)) {
            return Ok(Guarded::Conflict);
        }

        let record = build(self.next_id_of(&records)?);
        self.append_locked(record).await.map(Guarded::Written)
    }

    pub async fn scan_all(&self) -> StoreResult<Vec<Record>> {
        let _guard = self.lock.lock().await;
        self.backend.load(self.schema.collection).await
    }

    pub async fn find_one<P>(&self, predicate: P) -> StoreResult<Option<Record>>
    where
        P: Fn(&Record) -> bool + Send,
    {
        let records = self.scan_all().await?;
        Ok(records.into_iter().find(|record| predicate(record)))
    }

    pub async fn find_many<P>(&self, predicate: P) -> StoreResult<Vec<Record>>
    where
        P: Fn(&Record) -> bool + Send,
    {
        let records = self.scan_all().await?;
        Ok(records.into_iter().filter(|record| predicate(record)).collect())
    }

    /// Returns the updated records. Nothing is written when nothing matched.
    pub async fn update_where<P>(&self, predicate: P, patch: &Record) -> StoreResult<Vec<Record>>
    where
        P: Fn(&Record) -> bool + Send,
    {
        let _guard = self.lock.lock().await;
        let records = self.backend.load(self.schema.collection).await?;
        let (rewritten, updated) = self.merge_matching(records, predicate, patch);

        if !updated.is_empty() {
            self.backend
                .overwrite(self.schema.collection, &rewritten)
                .await?;
        }
        Ok(updated)
    }

    /// Like [`Table::update_where`], but refuses to write when any stored
    /// record satisfies `conflict`.
    pub async fn update_where_unless<P, C>(
        &self,
        predicate: P,
        conflict: C,
        patch: &Record,
    ) -> StoreResult<Guarded<Vec<Record>>>
    where
        P: Fn(&Record) -> bool + Send,
        C: Fn(&Record) -> bool + Send,
    {
        let _guard = self.lock.lock().await;
        let records = self.backend.load(self.schema.collection).await?;
        if records.iter().any(|record| conflict(record)) {
            return Ok(Guarded::Conflict);
        }

        let (rewritten, updated) = self.merge_matching(records, predicate, patch);
        if !updated.is_empty() {
            self.backend
                .overwrite(self.schema.collection, &rewritten)
                .await?;
        }
        Ok(Guarded::Written(updated))
    }

    pub async fn delete_where<P>(&self, predicate: P) -> StoreResult<usize>
    where
        P: Fn(&Record) -> bool + Send,
    {
        let _guard = self.lock.lock().await;
        let records = self.backend.load(self.schema.collection).await?;
        let before = records.len();

        let remaining: Vec<Record> = records
            .into_iter()
            .filter(|record| !predicate(record))
            .collect();
        let removed = before - remaining.len();

        if removed > 0 {
            self.backend
                .overwrite(self.schema.collection, &remaining)
                .await?;
        }
        Ok(removed)
    }

    pub async fn next_id(&self) -> StoreResult<u64> {
        let records = self.scan_all().await?;
        self.next_id_of(&records)
    }

    async fn append_locked(&self, record: Record) -> StoreResult<Record> {
        let record = record.materialize(self.schema.columns);
        self.backend
            .append(self.schema.collection, &record)
            .await?;
        Ok(record)
    }

    // Returns (whole collection, updated records)
    fn merge_matching<P>(
        &self,
        records: Vec<Record>,
        predicate: P,
        patch: &Record,
    ) -> (Vec<Record>, Vec<Record>)
    where
        P: Fn(&Record) -> bool,
    {
        let mut updated = Vec::new();
        let rewritten = records
            .into_iter()
            .map(|mut record| {
                if predicate(&record) {
                    record.merge(patch);
                    let record = record.materialize(self.schema.columns);
                    updated.push(record.clone());
                    record
                } else {
                    record
                }
            })
            .collect();
        (rewritten, updated)
    }

    fn next_id_of(&self, records: &[Record]) -> StoreResult<u64> {
        match records.iter().map(Record::numeric_id).max() {
            None => Ok(1),
            Some(max) => max.checked_add(1).ok_or_else(|| StoreError::IdsExhausted {
                collection: self.schema.collection.to_string(),
            }),
        }
    }
}
