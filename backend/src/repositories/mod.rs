//! Document repositories
//!
//! Typed access to the document store. Repositories are stateless and take
//! the store as their first argument.

pub mod activities;
pub mod supplements;
pub mod user;
pub mod water;

pub use activities::ActivityRepository;
pub use supplements::SupplementRepository;
pub use user::UserRepository;
pub use water::WaterRepository;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// Decode every document of a collection, skipping malformed ones
///
/// `with_id` receives each decoded value together with its document id.
pub(crate) fn decode_collection<T, F>(collection: &str, docs: Vec<(String, Value)>, with_id: F) -> Vec<T>
where
    T: DeserializeOwned,
    F: Fn(&mut T, String),
{
    docs.into_iter()
        .filter_map(|(id, doc)| match serde_json::from_value::<T>(doc) {
            Ok(mut value) => {
                with_id(&mut value, id);
                Some(value)
            }
            Err(e) => {
                warn!(collection = %collection, document_id = %id, error = %e, "Skipping malformed document");
                None
            }
        })
        .collect()
}

/// Carries a value out of a transaction closure
pub(crate) struct Captured<T>(Arc<Mutex<Option<T>>>);

impl<T> Clone for Captured<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Captured<T> {
    pub(crate) fn new() -> Self {
        Self(Arc::new(Mutex::new(None)))
    }

    pub(crate) fn set(&self, value: T) {
        if let Ok(mut slot) = self.0.lock() {
            *slot = Some(value);
        }
    }

    pub(crate) fn take(&self) -> Option<T> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}
