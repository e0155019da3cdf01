//! In-memory document store

use super::{
    merge_fields, paths, BatchWrite, DocumentStore, TransactionFn, TransactionOutcome, WriteBatch,
};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Document tree held in a `BTreeMap`; cloning shares the same tree
#[derive(Clone, Default)]
pub struct MemoryStore {
    documents: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a document outright (test fixtures)
    pub async fn insert(&self, path: impl Into<String>, data: Value) {
        self.documents.write().await.insert(path.into(), data);
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }
}

fn apply(documents: &mut BTreeMap<String, Value>, write: BatchWrite) {
    match write {
        BatchWrite::Merge { path, data } => {
            let entry = documents.entry(path).or_insert(Value::Null);
            merge_fields(entry, data);
        }
        BatchWrite::Set { path, data } => {
            documents.insert(path, data);
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>> {
        Ok(self.documents.read().await.get(path).cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<(String, Value)>> {
        let prefix = format!("{}/", collection);
        let documents = self.documents.read().await;
        Ok(documents
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter(|(path, _)| paths::parent_of(path) == collection)
            .map(|(path, doc)| (paths::id_of(path).to_string(), doc.clone()))
            .collect())
    }

    async fn merge(&self, path: &str, data: Value) -> Result<()> {
        let mut documents = self.documents.write().await;
        apply(
            &mut documents,
            BatchWrite::Merge {
                path: path.to_string(),
                data,
            },
        );
        Ok(())
    }

    async fn transaction(&self, path: &str, update: TransactionFn) -> Result<TransactionOutcome> {
        // The write lock is held across read and write
        let mut documents = self.documents.write().await;
        let current = documents.get(path).cloned();
        match update(current)? {
            Some(next) => {
                documents.insert(path.to_string(), next);
                Ok(TransactionOutcome::Committed)
            }
            None => Ok(TransactionOutcome::Unchanged),
        }
    }

    async fn commit(&self, batch: WriteBatch) -> Result<()> {
        let mut documents = self.documents.write().await;
        for write in batch.into_writes() {
            apply(&mut documents, write);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
