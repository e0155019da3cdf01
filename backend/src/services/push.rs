//! Push notification delivery
//!
//! [`PushDelivery`] sends one message to one device token. The production
//! implementation talks to the FCM HTTP v1 API; failures are mapped onto
//! [`PushError`], which tells the dispatcher whether a token is dead.

use crate::config::PushConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
/// Refresh cached OAuth tokens this long before they expire
const TOKEN_REFRESH_SKEW_SECS: i64 = 60;

/// Why a single delivery failed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PushError {
    #[error("registration token is invalid")]
    InvalidToken,

    #[error("registration token is no longer registered")]
    Unregistered,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("delivery failed ({code}): {message}")]
    Transient { code: String, message: String },

    #[error("push delivery is not configured")]
    NotConfigured,
}

impl PushError {
    /// Stable error code reported in job results
    pub fn code(&self) -> String {
        match self {
            PushError::InvalidToken => "messaging/invalid-registration-token".to_string(),
            PushError::Unregistered => "messaging/registration-token-not-registered".to_string(),
            PushError::InvalidArgument(_) => "messaging/invalid-argument".to_string(),
            PushError::Transient { code, .. } => code.clone(),
            PushError::NotConfigured => "messaging/not-configured".to_string(),
        }
    }

    /// Permanent failures mean the token should be removed
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            PushError::InvalidToken | PushError::Unregistered | PushError::InvalidArgument(_)
        )
    }

    fn transient(code: impl Into<String>, message: impl ToString) -> Self {
        PushError::Transient {
            code: code.into(),
            message: message.to_string(),
        }
    }
}

/// Notification payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    /// String key/value data delivered alongside the notification
    pub data: BTreeMap<String, String>,
}

impl PushMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Sends one message to one device
#[async_trait]
pub trait PushDelivery: Send + Sync {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), PushError>;
}

/// Used when push is switched off; every send fails transiently
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledPush;

#[async_trait]
impl PushDelivery for DisabledPush {
    async fn send(&self, _token: &str, _message: &PushMessage) -> Result<(), PushError> {
        Err(PushError::NotConfigured)
    }
}

/// Google service-account key file
#[derive(Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: SecretString,
}

enum FcmAuth {
    Static(SecretString),
    ServiceAccount {
        key: ServiceAccountKey,
        token_uri: String,
    },
}

struct CachedToken {
    value: SecretString,
    expires_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

/// FCM HTTP v1 client
pub struct FcmClient {
    client: reqwest::Client,
    send_url: String,
    auth: FcmAuth,
    cached: Mutex<Option<CachedToken>>,
}

impl FcmClient {
    /// Build from configuration
    ///
    /// A static access token takes precedence; otherwise a service-account
    /// key file is required.
    pub fn new(config: &PushConfig) -> Result<Self> {
        if config.project_id.trim().is_empty() {
            anyhow::bail!("push.project_id is required when push is enabled");
        }

        let auth = match (&config.access_token, &config.service_account_path) {
            (Some(token), _) => FcmAuth::Static(SecretString::new(token.clone())),
            (None, Some(path)) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read service account file {}", path))?;
                let key: ServiceAccountKey =
                    serde_json::from_str(&raw).context("Invalid service account file")?;
                FcmAuth::ServiceAccount {
                    key,
                    token_uri: config.token_uri.clone(),
                }
            }
            (None, None) => {
                anyhow::bail!("push requires access_token or service_account_path")
            }
        };

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            send_url: format!(
                "{}/v1/projects/{}/messages:send",
                config.endpoint.trim_end_matches('/'),
                config.project_id
            ),
            auth,
            cached: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<SecretString, PushError> {
        let (key, token_uri) = match &self.auth {
            FcmAuth::Static(token) => return Ok(token.clone()),
            FcmAuth::ServiceAccount { key, token_uri } => (key, token_uri),
        };

        let mut cached = self.cached.lock().await;
        let now = Utc::now();
        if let Some(token) = cached.as_ref() {
            if token.expires_at - Duration::seconds(TOKEN_REFRESH_SKEW_SECS) > now {
                return Ok(token.value.clone());
            }
        }

        let claims = AssertionClaims {
            iss: &key.client_email,
            scope: FCM_SCOPE,
            aud: token_uri,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.expose_secret().as_bytes())
            .map_err(|e| PushError::transient("auth/invalid-key", e))?;
        let assertion = encode(&Header::new(Algorithm::RS256), &claims, &signing_key)
            .map_err(|e| PushError::transient("auth/invalid-key", e))?;

        let response = self
            .client
            .post(token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| PushError::transient("auth/network", e))?;
        if !response.status().is_success() {
            return Err(PushError::transient(
                "auth/token-exchange",
                format!("token endpoint returned {}", response.status()),
            ));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| PushError::transient("auth/token-exchange", e))?;

        debug!(expires_in = token.expires_in, "Fetched FCM access token");
        let value = SecretString::new(token.access_token);
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at: now + Duration::seconds(token.expires_in),
        });
        Ok(value)
    }
}

#[async_trait]
impl PushDelivery for FcmClient {
    async fn send(&self, token: &str, message: &PushMessage) -> Result<(), PushError> {
        let access_token = self.access_token().await?;
        let body = json!({
            "message": {
                "token": token,
                "notification": {
                    "title": message.title,
                    "body": message.body,
                },
                "data": message.data,
                "android": { "priority": "high" },
                "apns": { "payload": { "aps": { "sound": "default" } } },
            }
        });

        let response = self
            .client
            .post(&self.send_url)
            .bearer_auth(access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| PushError::transient("messaging/network", e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let error_body: Value = response.json().await.unwrap_or(Value::Null);
        Err(map_fcm_error(status.as_u16(), &error_body))
    }
}

/// Map an FCM v1 error response onto [`PushError`]
pub fn map_fcm_error(http_status: u16, body: &Value) -> PushError {
    let error = body.get("error");
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string();
    let detail_code = error
        .and_then(|e| e.get("details"))
        .and_then(Value::as_array)
        .and_then(|details| {
            details
                .iter()
                .find_map(|d| d.get("errorCode").and_then(Value::as_str))
        });
    let status = error.and_then(|e| e.get("status")).and_then(Value::as_str);

    match detail_code.or(status) {
        Some("UNREGISTERED") | Some("NOT_FOUND") => PushError::Unregistered,
        Some("SENDER_ID_MISMATCH") => PushError::InvalidToken,
        Some("INVALID_ARGUMENT") => {
            if message.to_lowercase().contains("registration token") {
                PushError::InvalidToken
            } else {
                PushError::InvalidArgument(message)
            }
        }
        Some(other) => PushError::transient(
            format!("messaging/{}", other.to_lowercase().replace('_', "-")),
            message,
        ),
        None => PushError::transient(format!("messaging/http-{}", http_status), message),
    }
}
