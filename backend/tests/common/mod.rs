//! Common test utilities for integration tests
//!
//! The app runs over the in-memory store with a manual clock and a push
//! double that records every send.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{DateTime, TimeZone, Utc};
use fake::{faker::lorem::en::Word, Fake};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use wellness_tracker_backend::{
    config::AppConfig,
    routes,
    services::{FallbackEnvironment, PushDelivery, PushError, PushMessage},
    state::AppState,
    store::{paths, DocumentStore, MemoryStore},
};
use wellness_tracker_shared::ManualClock;

pub const JOB_SECRET: &str = "test-job-secret";

/// One recorded push
#[derive(Debug, Clone)]
pub struct SentPush {
    pub token: String,
    pub title: String,
    pub category: Option<String>,
}

/// Push double: records sends, fails for tokens marked unregistered
#[derive(Default)]
pub struct RecordingPush {
    sent: Mutex<Vec<SentPush>>,
    unregistered: Mutex<HashSet<String>>,
}

impl RecordingPush {
    pub fn unregister(&self, token: &str) {
        self.unregistered.lock().unwrap().insert(token.to_string());
    }

    pub fn sent(&self) -> Vec<SentPush> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_titles(&self) -> Vec<String> {
        self.sent().into_iter().map(|s| s.title).collect()
    }
}

#[async_trait]
impl PushDelivery for RecordingPush {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), PushError> {
        if self.unregistered.lock().unwrap().contains(token) {
            return Err(PushError::Unregistered);
        }
        self.sent.lock().unwrap().push(SentPush {
            token: token.to_string(),
            title: message.title.clone(),
            category: message.data.get("category").cloned(),
        });
        Ok(())
    }
}

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub push: Arc<RecordingPush>,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    /// App with the clock at `now`
    pub fn at(now: DateTime<Utc>) -> Self {
        Self::build(now, test_config())
    }

    /// App whose job endpoints require [`JOB_SECRET`]
    pub fn with_job_secret(now: DateTime<Utc>) -> Self {
        let mut config = test_config();
        config.jobs.secret = Some(JOB_SECRET.to_string());
        Self::build(now, config)
    }

    fn build(now: DateTime<Utc>, config: AppConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let push = Arc::new(RecordingPush::default());
        let clock = Arc::new(ManualClock::new(now));

        let state = AppState::new(
            config,
            store.clone(),
            push.clone(),
            Arc::new(FallbackEnvironment),
            clock.clone(),
        )
        .expect("Failed to build test state");
        let app = routes::create_router(state.clone());

        Self {
            app,
            state,
            store,
            push,
            clock,
        }
    }

    pub async fn seed(&self, path: &str, doc: Value) {
        self.store.insert(path, doc).await;
    }

    pub async fn seed_user(&self, uid: &str, doc: Value) {
        self.seed(&paths::user(uid), doc).await;
    }

    pub async fn doc(&self, path: &str) -> Option<Value> {
        self.store.get(path).await.unwrap()
    }

    pub fn token_for(&self, uid: &str) -> String {
        self.state.jwt().generate_access_token(uid).unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_str = String::from_utf8(body.to_vec()).unwrap();

        (status, body_str)
    }

    /// Make a request with an optional bearer token and JSON body
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> (StatusCode, String) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        self.request("GET", path, None, None).await
    }

    pub async fn post(&self, path: &str) -> (StatusCode, String) {
        self.request("POST", path, None, None).await
    }

    /// POST a job endpoint and parse the JSON body
    pub async fn run_job(&self, path: &str) -> (StatusCode, Value) {
        let (status, body) = self.post(path).await;
        (status, serde_json::from_str(&body).unwrap())
    }
}

/// Local time at +03:00 as a UTC instant
pub fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap() - chrono::Duration::hours(3)
}

/// A random device token
pub fn device_token() -> String {
    let word: String = Word().fake();
    format!("{}-{}", word, uuid::Uuid::new_v4())
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.port = 0;
    config.jwt.secret = "test-secret-key-for-testing-only-32chars".to_string();
    config.scheduler.max_concurrent_users = 4;
    config
}
