//! Access token cache for Firestore authentication.
//!
//! Tokens are refreshed a minute before they expire. Only one task refreshes
//! at a time; the others wait on the write lock and then reuse the fresh
//! token. A failed refresh falls back to the previous token while it is still
//! technically valid.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{FirestoreError, FirestoreResult};

/// Refresh this long before the reported expiry.
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// Assumed lifetime when the provider reports an expiry we cannot convert.
const FALLBACK_TTL: Duration = Duration::from_secs(50 * 60);

/// OAuth scope for Firestore REST access.
pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

struct CachedToken {
    value: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self, now: Instant) -> bool {
        now + REFRESH_MARGIN < self.expires_at
    }

    fn is_unexpired(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Shared, lazily refreshed access token.
pub struct TokenCache {
    provider: Arc<dyn TokenProvider>,
    slot: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            provider,
            slot: RwLock::new(None),
        }
    }

    /// Drop the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        self.slot.write().await.take();
    }

    /// Return a token that is valid for at least the refresh margin.
    pub async fn get_token(&self) -> FirestoreResult<String> {
        if let Some(token) = self.fresh_token().await {
            return Ok(token);
        }

        let mut slot = self.slot.write().await;
        if let Some(cached) = slot.as_ref().filter(|c| c.is_fresh(Instant::now())) {
            return Ok(cached.value.clone());
        }

        match self.provider.token(&[FIRESTORE_SCOPE]).await {
            Ok(token) => {
                let value = token.as_str().to_string();
                let until_expiry = token.expires_at() - Utc::now();
                let ttl = if until_expiry <= chrono::Duration::zero() {
                    Duration::ZERO
                } else {
                    until_expiry.to_std().unwrap_or(FALLBACK_TTL)
                };

                *slot = Some(CachedToken {
                    value: value.clone(),
                    expires_at: Instant::now() + ttl,
                });
                debug!(ttl_secs = ttl.as_secs(), "Refreshed Firestore access token");
                Ok(value)
            }
            Err(e) => match slot.as_ref().filter(|c| c.is_unexpired(Instant::now())) {
                Some(cached) => {
                    warn!("Token refresh failed, reusing current token: {}", e);
                    Ok(cached.value.clone())
                }
                None => Err(FirestoreError::auth_error(format!(
                    "Failed to obtain auth token: {}",
                    e
                ))),
            },
        }
    }

    async fn fresh_token(&self) -> Option<String> {
        self.slot
            .read()
            .await
            .as_ref()
            .filter(|c| c.is_fresh(Instant::now()))
            .map(|c| c.value.clone())
    }
}
