//! User documents

use super::{decode_collection, Captured};
use crate::store::{paths, DocumentStore};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::HashSet;
use wellness_tracker_shared::User;

/// User repository for document operations
pub struct UserRepository;

impl UserRepository {
    /// Every user document; malformed ones are logged and skipped
    pub async fn list_all(store: &dyn DocumentStore) -> Result<Vec<User>> {
        let docs = store.list(paths::USERS).await?;
        Ok(decode_collection(paths::USERS, docs, |user: &mut User, id| {
            user.id = id
        }))
    }

    pub async fn get(store: &dyn DocumentStore, uid: &str) -> Result<Option<User>> {
        let Some(doc) = store.get(&paths::user(uid)).await? else {
            return Ok(None);
        };
        let mut user: User =
            serde_json::from_value(doc).with_context(|| format!("malformed user document {}", uid))?;
        user.id = uid.to_string();
        Ok(Some(user))
    }

    /// Register a device token; already known tokens are left as they are
    pub async fn add_token(store: &dyn DocumentStore, uid: &str, token: &str) -> Result<()> {
        store
            .array_union(&paths::user(uid), "fcmTokens", vec![json!(token)])
            .await
    }

    pub async fn merge(store: &dyn DocumentStore, uid: &str, patch: Value) -> Result<()> {
        store.merge(&paths::user(uid), patch).await
    }

    /// Remove exactly `flagged` from the user's device tokens
    ///
    /// Runs as one read-modify-write and writes only when the token set
    /// actually shrank. Returns how many tokens were removed.
    pub async fn remove_tokens(
        store: &dyn DocumentStore,
        uid: &str,
        flagged: &[String],
    ) -> Result<usize> {
        if flagged.is_empty() {
            return Ok(0);
        }
        let flagged: HashSet<String> = flagged.iter().cloned().collect();
        let removed = Captured::new();
        let slot = removed.clone();

        store
            .transaction(
                &paths::user(uid),
                Box::new(move |current: Option<Value>| -> Result<Option<Value>> {
                    let Some(mut doc) = current else {
                        return Ok(None);
                    };
                    let tokens: Vec<String> = doc
                        .get("fcmTokens")
                        .cloned()
                        .map(serde_json::from_value)
                        .transpose()?
                        .unwrap_or_default();
                    let kept: Vec<String> =
                        tokens.iter().filter(|t| !flagged.contains(*t)).cloned().collect();
                    if kept.len() == tokens.len() {
                        return Ok(None);
                    }
                    slot.set(tokens.len() - kept.len());
                    doc["fcmTokens"] = json!(kept);
                    Ok(Some(doc))
                }),
            )
            .await?;

        Ok(removed.take().unwrap_or(0))
    }

    pub async fn mark_water_summary(store: &dyn DocumentStore, uid: &str, date: NaiveDate) -> Result<()> {
        Self::merge(store, uid, json!({ "lastWaterSummaryDate": date })).await
    }

    pub async fn mark_supplement_summary(
        store: &dyn DocumentStore,
        uid: &str,
        date: NaiveDate,
    ) -> Result<()> {
        Self::merge(store, uid, json!({ "lastSupplementSummaryDate": date })).await
    }
}
