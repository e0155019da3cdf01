//! Document store abstraction
//!
//! User data lives in a tree of JSON documents addressed by slash-separated
//! paths (`users/{uid}/water/current`). Two backends implement the same
//! contract: PostgreSQL JSONB for deployments and an in-memory map for tests
//! and local runs.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

mod memory;
pub mod paths;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Read-modify-write step run inside a transaction
///
/// Receives the current document (if any). Returning `Ok(None)` leaves the
/// document untouched; `Ok(Some(doc))` replaces it.
pub type TransactionFn = Box<dyn FnOnce(Option<Value>) -> Result<Option<Value>> + Send>;

/// Whether a transaction wrote anything
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionOutcome {
    Committed,
    Unchanged,
}

/// A single write in a [`WriteBatch`]
#[derive(Debug, Clone, PartialEq)]
pub enum BatchWrite {
    /// Shallow merge of top-level fields, creating the document if missing
    Merge { path: String, data: Value },
    /// Replace the whole document
    Set { path: String, data: Value },
}

/// Multi-document write applied atomically
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    writes: Vec<BatchWrite>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&mut self, path: impl Into<String>, data: Value) -> &mut Self {
        self.writes.push(BatchWrite::Merge {
            path: path.into(),
            data,
        });
        self
    }

    pub fn set(&mut self, path: impl Into<String>, data: Value) -> &mut Self {
        self.writes.push(BatchWrite::Set {
            path: path.into(),
            data,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.writes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writes.is_empty()
    }

    pub fn into_writes(self) -> Vec<BatchWrite> {
        self.writes
    }
}

/// Storage contract used by repositories
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch one document
    async fn get(&self, path: &str) -> Result<Option<Value>>;

    /// Direct children of a collection as `(id, document)`, ordered by id
    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>>;

    /// Shallow merge of top-level fields, creating the document if missing
    async fn merge(&self, path: &str, data: Value) -> Result<()>;

    /// Atomic read-modify-write of one document
    async fn transaction(&self, path: &str, update: TransactionFn) -> Result<TransactionOutcome>;

    /// Apply every write in the batch or none of them
    async fn commit(&self, batch: WriteBatch) -> Result<()>;

    /// Cheap round trip used by readiness checks
    async fn ping(&self) -> Result<()>;

    /// Append values to an array field, skipping ones already present
    async fn array_union(&self, path: &str, field: &str, values: Vec<Value>) -> Result<()> {
        let field = field.to_string();
        self.transaction(
            path,
            Box::new(move |current: Option<Value>| -> Result<Option<Value>> {
                let mut doc = current.unwrap_or_else(|| Value::Object(Map::new()));
                let Some(object) = doc.as_object_mut() else {
                    anyhow::bail!("document is not an object");
                };
                let entry = object
                    .entry(field)
                    .or_insert_with(|| Value::Array(Vec::new()));
                let Some(array) = entry.as_array_mut() else {
                    anyhow::bail!("field is not an array");
                };
                let before = array.len();
                for value in values {
                    if !array.contains(&value) {
                        array.push(value);
                    }
                }
                Ok((array.len() != before).then_some(doc))
            }),
        )
        .await
        .map(|_| ())
    }
}

/// Merge the top-level fields of `patch` into `target`
///
/// Non-object targets are replaced by the patch.
pub fn merge_fields(target: &mut Value, patch: Value) {
    match (target.as_object_mut(), patch) {
        (Some(existing), Value::Object(fields)) => {
            for (key, value) in fields {
                existing.insert(key, value);
            }
        }
        (_, patch) => *target = patch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_fields_is_shallow() {
        let mut doc = json!({"a": 1, "nested": {"x": 1, "y": 2}});
        merge_fields(&mut doc, json!({"b": 2, "nested": {"x": 5}}));
        assert_eq!(doc, json!({"a": 1, "b": 2, "nested": {"x": 5}}));
    }

    #[test]
    fn test_merge_into_non_object_replaces() {
        let mut doc = Value::Null;
        merge_fields(&mut doc, json!({"a": 1}));
        assert_eq!(doc, json!({"a": 1}));
    }

    #[test]
    fn test_batch_builder() {
        let mut batch = WriteBatch::new();
        batch.merge("users/u1", json!({"a": 1})).set("users/u2", json!({}));
        assert_eq!(batch.len(), 2);
        assert!(matches!(batch.into_writes()[1], BatchWrite::Set { .. }));
    }
}
