//! Supplement documents and daily consumption counts

use super::{decode_collection, Captured};
use crate::store::{paths, DocumentStore, WriteBatch};
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde_json::{json, Value};
use wellness_tracker_shared::{ConsumptionStats, SupplementItem};

pub struct SupplementRepository;

impl SupplementRepository {
    /// All supplements of a user; malformed items are logged and skipped
    pub async fn list(store: &dyn DocumentStore, uid: &str) -> Result<Vec<SupplementItem>> {
        let collection = paths::supplements(uid);
        let docs = store.list(&collection).await?;
        Ok(decode_collection(&collection, docs, |item: &mut SupplementItem, id| {
            item.id = id
        }))
    }

    pub async fn get(store: &dyn DocumentStore, uid: &str, id: &str) -> Result<Option<SupplementItem>> {
        let Some(doc) = store.get(&paths::supplement(uid, id)).await? else {
            return Ok(None);
        };
        let mut item: SupplementItem = serde_json::from_value(doc)
            .with_context(|| format!("malformed supplement {} for {}", id, uid))?;
        item.id = id.to_string();
        Ok(Some(item))
    }

    /// Consumption counts for one local date (empty when none recorded)
    pub async fn stats(store: &dyn DocumentStore, uid: &str, date: NaiveDate) -> Result<ConsumptionStats> {
        store
            .get(&paths::supplement_stats(uid, date))
            .await?
            .map(|doc| serde_json::from_value(doc).context("malformed supplement stats"))
            .transpose()
            .map(Option::unwrap_or_default)
    }

    /// Write several supplements' schedule fields in one batch
    pub async fn save_schedules(
        store: &dyn DocumentStore,
        uid: &str,
        patches: Vec<(String, Value)>,
    ) -> Result<()> {
        if patches.is_empty() {
            return Ok(());
        }
        let mut batch = WriteBatch::new();
        for (id, patch) in patches {
            batch.merge(paths::supplement(uid, &id), patch);
        }
        store.commit(batch).await
    }

    pub async fn merge(store: &dyn DocumentStore, uid: &str, id: &str, patch: Value) -> Result<()> {
        store.merge(&paths::supplement(uid, id), patch).await
    }

    /// Take one dose: decrement stock (floored at zero) and count it for `date`
    ///
    /// Returns the updated item, or `None` if it does not exist.
    pub async fn consume(
        store: &dyn DocumentStore,
        uid: &str,
        id: &str,
        date: NaiveDate,
    ) -> Result<Option<SupplementItem>> {
        let updated = Captured::new();
        let slot = updated.clone();
        let item_id = id.to_string();

        store
            .transaction(
                &paths::supplement(uid, id),
                Box::new(move |current: Option<Value>| -> Result<Option<Value>> {
                    let Some(mut doc) = current else {
                        return Ok(None);
                    };
                    let mut item: SupplementItem = serde_json::from_value(doc.clone())
                        .with_context(|| format!("malformed supplement {}", item_id))?;
                    item.quantity = (item.quantity - 1).max(0);
                    item.id = item_id;
                    doc["quantity"] = json!(item.quantity);
                    slot.set(item);
                    Ok(Some(doc))
                }),
            )
            .await?;

        let Some(item) = updated.take() else {
            return Ok(None);
        };

        let name = item.name.clone();
        store
            .transaction(
                &paths::supplement_stats(uid, date),
                Box::new(move |current: Option<Value>| -> Result<Option<Value>> {
                    let mut stats: ConsumptionStats = current
                        .map(serde_json::from_value)
                        .transpose()?
                        .unwrap_or_default();
                    stats.increment(&name, 1);
                    Ok(Some(serde_json::to_value(&stats)?))
                }),
            )
            .await?;

        Ok(Some(item))
    }
}
