//! Routines, timers and calendar events

use super::decode_collection;
use crate::store::{paths, DocumentStore};
use anyhow::Result;
use wellness_tracker_shared::{CalendarEvent, Routine, Timer};

pub struct ActivityRepository;

impl ActivityRepository {
    pub async fn routines(store: &dyn DocumentStore, uid: &str) -> Result<Vec<Routine>> {
        let collection = paths::routines(uid);
        let docs = store.list(&collection).await?;
        Ok(decode_collection(&collection, docs, |r: &mut Routine, id| r.id = id))
    }

    pub async fn timers(store: &dyn DocumentStore, uid: &str) -> Result<Vec<Timer>> {
        let collection = paths::timers(uid);
        let docs = store.list(&collection).await?;
        Ok(decode_collection(&collection, docs, |t: &mut Timer, id| t.id = id))
    }

    pub async fn calendar_events(store: &dyn DocumentStore, uid: &str) -> Result<Vec<CalendarEvent>> {
        let collection = paths::calendar_events(uid);
        let docs = store.list(&collection).await?;
        Ok(decode_collection(&collection, docs, |e: &mut CalendarEvent, id| e.id = id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_reads_each_collection() {
        let store = MemoryStore::new();
        store
            .insert(
                "users/u1/routines/r1",
                json!({"title": "Yoga", "date": "2024-05-01", "startTime": "07:00"}),
            )
            .await;
        store
            .insert("users/u1/timers/t1", json!({"label": "Tea", "endsAt": "2024-05-01T09:00:00Z"}))
            .await;
        store
            .insert(
                "users/u1/calendarEvents/e1",
                json!({"title": "Dentist", "start": "2024-05-02T12:00:00Z", "notification": "1-hour"}),
            )
            .await;

        let routines = ActivityRepository::routines(&store, "u1").await.unwrap();
        assert_eq!(routines[0].id, "r1");
        assert!(routines[0].notification_enabled);

        let timers = ActivityRepository::timers(&store, "u1").await.unwrap();
        assert!(timers[0].active);

        let events = ActivityRepository::calendar_events(&store, "u1").await.unwrap();
        assert_eq!(events[0].title, "Dentist");
    }
}
