//! Water tracking documents

use super::Captured;
use crate::store::{merge_fields, paths, DocumentStore};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::Value;
use wellness_tracker_shared::{plan_reset, ResetPlan, WaterState};

pub struct WaterRepository;

impl WaterRepository {
    /// The user's water document; a malformed document is an error
    pub async fn get(store: &dyn DocumentStore, uid: &str) -> Result<Option<WaterState>> {
        store
            .get(&paths::water(uid))
            .await?
            .map(|doc| {
                serde_json::from_value(doc)
                    .with_context(|| format!("malformed water document for {}", uid))
            })
            .transpose()
    }

    pub async fn merge(store: &dyn DocumentStore, uid: &str, patch: Value) -> Result<()> {
        store.merge(&paths::water(uid), patch).await
    }

    /// Roll yesterday's intake into history unless today was already rolled
    ///
    /// Returns the applied plan, or `None` when the document is missing or
    /// already reset today.
    pub async fn reset(
        store: &dyn DocumentStore,
        uid: &str,
        today: NaiveDate,
    ) -> Result<Option<ResetPlan>> {
        let applied = Captured::new();
        let slot = applied.clone();
        let uid_owned = uid.to_string();

        store
            .transaction(
                &paths::water(uid),
                Box::new(move |current: Option<Value>| -> Result<Option<Value>> {
                    let Some(mut doc) = current else {
                        return Ok(None);
                    };
                    let water: WaterState = serde_json::from_value(doc.clone())
                        .with_context(|| format!("malformed water document for {}", uid_owned))?;
                    let Some(plan) = plan_reset(&water, today) else {
                        return Ok(None);
                    };
                    merge_fields(&mut doc, plan.to_patch());
                    slot.set(plan);
                    Ok(Some(doc))
                }),
            )
            .await?;

        Ok(applied.take())
    }

    /// Read-modify-write of the typed document, creating it with defaults
    pub async fn update<F>(store: &dyn DocumentStore, uid: &str, change: F) -> Result<WaterState>
    where
        F: FnOnce(&mut WaterState) + Send + 'static,
    {
        let updated = Captured::new();
        let slot = updated.clone();
        let uid_owned = uid.to_string();

        store
            .transaction(
                &paths::water(uid),
                Box::new(move |current: Option<Value>| -> Result<Option<Value>> {
                    let mut doc = current.unwrap_or_else(|| Value::Object(Default::default()));
                    let mut water: WaterState = serde_json::from_value(doc.clone())
                        .with_context(|| format!("malformed water document for {}", uid_owned))?;
                    change(&mut water);
                    merge_fields(&mut doc, serde_json::to_value(&water)?);
                    slot.set(water);
                    Ok(Some(doc))
                }),
            )
            .await?;

        updated
            .take()
            .context("water update did not produce a document")
    }
}
