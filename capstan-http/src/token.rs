//! Cached authentication tokens
//!
//! Tokens are cached until shortly before their actual expiry and refresh
//! is serialized behind one lock, so concurrent callers never trigger
//! redundant refreshes or send requests with an empty token.

use std::sync::Arc;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;
use tracing::debug;

use crate::errors::HttpError;

/// Refresh this long before the reported expiry.
const EXPIRY_SAFETY_BUFFER_SECONDS: i64 = 60;

/// A bearer token with its expiry timestamp
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(EXPIRY_SAFETY_BUFFER_SECONDS) < self.expires_at
    }
}

/// Acquires fresh tokens from an upstream identity endpoint
#[async_trait::async_trait]
pub trait TokenSource: Send + Sync {
    async fn acquire(&self) -> Result<IssuedToken, HttpError>;
}

/// Expiry-aware token cache
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    state: Mutex<Option<IssuedToken>>,
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>) -> Self {
        Self {
            source,
            state: Mutex::new(None),
        }
    }

    /// The current bearer token, refreshed when missing or near expiry.
    pub async fn bearer_token(&self) -> Result<String, HttpError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();

        if let Some(token) = state.as_ref() {
            if token.is_usable_at(now) {
                return Ok(token.token.clone());
            }
            debug!("cached token near expiry, refreshing");
        }

        let fresh = self.source.acquire().await?;
        if fresh.token.trim().is_empty() {
            return Err(HttpError::Auth(
                "token source returned an empty token".to_string(),
            ));
        }
        let token = fresh.token.clone();
        *state = Some(fresh);
        Ok(token)
    }
}
