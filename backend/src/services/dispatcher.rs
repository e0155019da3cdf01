//! Notification fan-out to device tokens
//!
//! Each token gets its own send. Tokens whose failure is permanent are
//! pruned from the user document in one transaction afterwards.

use crate::repositories::UserRepository;
use crate::services::context::RunContext;
use crate::services::push::PushMessage;
use crate::telemetry;
use anyhow::Result;
use futures::future::join_all;
use tracing::{info, warn};
use wellness_tracker_shared::{DueNotification, NotificationOutcome, TokenDeliveryResult, User};

pub struct Dispatcher;

impl Dispatcher {
    pub fn message_for(notification: &DueNotification) -> PushMessage {
        let message = PushMessage::new(&notification.content.title, &notification.content.body)
            .with_data("category", notification.category.as_str());
        match &notification.source_id {
            Some(id) => message.with_data("sourceId", id),
            None => message,
        }
    }

    /// Send `notification` to every token of `user`
    ///
    /// Pruned tokens are also removed from `user.fcm_tokens` so later
    /// notifications in the same run skip them.
    pub async fn deliver(
        ctx: &RunContext,
        user: &mut User,
        notification: &DueNotification,
    ) -> Result<NotificationOutcome> {
        let message = Self::message_for(notification);
        let push = ctx.push.as_ref();

        let deliveries: Vec<TokenDeliveryResult> = join_all(user.fcm_tokens.iter().map(|token| {
            let message = &message;
            async move {
                match push.send(token, message).await {
                    Ok(()) => TokenDeliveryResult::delivered(token.as_str()),
                    Err(e) => TokenDeliveryResult::failed(token.as_str(), e.code(), e.is_permanent()),
                }
            }
        }))
        .await;

        let delivered = deliveries.iter().filter(|d| d.valid).count();
        for d in &deliveries {
            telemetry::record_delivery(d.valid);
        }

        let flagged: Vec<String> = deliveries
            .iter()
            .filter(|d| d.must_remove())
            .map(|d| d.token.clone())
            .collect();

        if !flagged.is_empty() {
            let removed = UserRepository::remove_tokens(ctx.store(), &user.id, &flagged).await?;
            user.fcm_tokens.retain(|t| !flagged.contains(t));
            if removed > 0 {
                ctx.cache.users.invalidate(&()).await;
                telemetry::record_tokens_pruned(removed);
                warn!(user_id = %user.id, removed, "Pruned invalid device tokens");
            }
        }

        info!(
            user_id = %user.id,
            category = notification.category.as_str(),
            token_count = deliveries.len(),
            delivered,
            failed = deliveries.len() - delivered,
            "Notification dispatched"
        );

        Ok(NotificationOutcome {
            category: notification.category.as_str().to_string(),
            title: notification.content.title.clone(),
            deliveries,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::context::testing;
    use crate::services::push::{PushDelivery, PushError};
    use crate::store::{paths, DocumentStore, MemoryStore};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;
    use wellness_tracker_shared::{NotificationContent, TriggerCategory};

    /// Rejects tokens starting with `dead`
    struct SelectivePush;

    #[async_trait]
    impl PushDelivery for SelectivePush {
        async fn send(&self, token: &str, _message: &PushMessage) -> Result<(), PushError> {
            if token.starts_with("dead") {
                Err(PushError::Unregistered)
            } else {
                Ok(())
            }
        }
    }

    fn notification() -> DueNotification {
        DueNotification {
            category: TriggerCategory::Timer,
            source_id: Some("t1".to_string()),
            content: NotificationContent {
                title: "Tea is ready".to_string(),
                body: "Your timer finished.".to_string(),
            },
        }
    }

    #[test]
    fn test_message_carries_category_and_source() {
        let message = Dispatcher::message_for(&notification());
        assert_eq!(message.title, "Tea is ready");
        assert_eq!(message.data.get("category").map(String::as_str), Some("timer"));
        assert_eq!(message.data.get("sourceId").map(String::as_str), Some("t1"));
    }

    #[tokio::test]
    async fn test_dead_tokens_are_pruned() {
        let store = Arc::new(MemoryStore::new());
        store
            .merge(&paths::user("u1"), json!({ "fcmTokens": ["live-1", "dead-1"] }))
            .await
            .unwrap();
        let now = Utc.with_ymd_and_hms(2024, 7, 1, 6, 0, 0).unwrap();
        let mut ctx = testing::context(store.clone(), None, now);
        ctx.push = Arc::new(SelectivePush);

        let mut user = User {
            id: "u1".to_string(),
            fcm_tokens: vec!["live-1".to_string(), "dead-1".to_string()],
            ..Default::default()
        };
        let outcome = Dispatcher::deliver(&ctx, &mut user, &notification()).await.unwrap();

        assert_eq!(outcome.deliveries.len(), 2);
        assert_eq!(user.fcm_tokens, vec!["live-1".to_string()]);
        let doc = store.get(&paths::user("u1")).await.unwrap().unwrap();
        assert_eq!(doc["fcmTokens"], json!(["live-1"]));
    }
}
