//! Single-slot bearer token cache.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::{IdentityProvider, Token};
use crate::error::Result;
use crate::log_component;

/// Default refresh margin before hard expiry.
pub const DEFAULT_SAFETY_MARGIN: Duration = Duration::from_secs(300);

/// Snapshot of the cache for health reporting. Never includes the token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    /// A token is held, fresh or not
    pub cached: bool,
    /// The held token would be handed out without a refresh
    pub fresh: bool,
    /// Seconds until the held token hard-expires
    pub expires_in_secs: Option<u64>,
}

/// Caches one bearer token and refreshes it before it expires.
///
/// Refreshes are not serialized: two callers that both see a stale token
/// may both call the identity provider. The slot is replaced as a whole
/// under the write lock, so a reader sees either the old or the new token.
pub struct TokenCache {
    provider: Arc<dyn IdentityProvider>,
    safety_margin: Duration,
    slot: RwLock<Option<Token>>,
}

impl TokenCache {
    /// Create a cache with the default 300 second safety margin.
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        Self::with_margin(provider, DEFAULT_SAFETY_MARGIN)
    }

    /// Create a cache with a custom safety margin.
    pub fn with_margin(provider: Arc<dyn IdentityProvider>, safety_margin: Duration) -> Self {
        Self {
            provider,
            safety_margin,
            slot: RwLock::new(None),
        }
    }

    /// The configured safety margin.
    pub fn safety_margin(&self) -> Duration {
        self.safety_margin
    }

    /// Return a token that is valid for at least the safety margin.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::error::BridgeError::Auth`] from the identity provider.
    pub async fn get_token(&self) -> Result<Token> {
        {
            let slot = self.slot.read().await;
            if let Some(token) = slot.as_ref() {
                if token.is_fresh(Instant::now(), self.safety_margin) {
                    return Ok(token.clone());
                }
            }
        }

        self.refresh().await
    }

    /// Unconditionally fetch a new token and store it.
    pub async fn refresh(&self) -> Result<Token> {
        let issued = match self.provider.exchange().await {
            Ok(issued) => issued,
            Err(e) => {
                log_component!(
                    warn,
                    "auth",
                    "token exchange failed",
                    error = tracing::field::display(&e)
                );
                return Err(e);
            }
        };
        let token = Token::from_issued(issued, Instant::now());

        log_component!(
            info,
            "auth",
            "bearer token refreshed",
            expires_in_secs = token.remaining(Instant::now()).as_secs()
        );

        *self.slot.write().await = Some(token.clone());
        Ok(token)
    }

    /// Drop the cached token; the next `get_token` fetches a new one.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    /// Describe the cached token without exposing it.
    pub async fn status(&self) -> TokenStatus {
        let slot = self.slot.read().await;
        let now = Instant::now();
        match slot.as_ref() {
            Some(token) => TokenStatus {
                cached: true,
                fresh: token.is_fresh(now, self.safety_margin),
                expires_in_secs: Some(token.remaining(now).as_secs()),
            },
            None => TokenStatus {
                cached: false,
                fresh: false,
                expires_in_secs: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IssuedToken, MockIdentityProvider};
    use crate::error::BridgeError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn issued(value: &str, expires_in: u64) -> IssuedToken {
        IssuedToken {
            access_token: value.to_string(),
            expires_in,
        }
    }

    /// Hands out `token-1`, `token-2`, ... each valid for `lifetime` seconds.
    fn counting_provider(lifetime: u64) -> (MockIdentityProvider, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mut mock = MockIdentityProvider::new();
        mock.expect_exchange().returning(move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(issued(&format!("token-{}", n), lifetime))
        });
        (mock, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_call_uses_cache() {
        let (mock, calls) = counting_provider(3600);
        let cache = TokenCache::new(Arc::new(mock));

        let first = cache.get_token().await.unwrap();
        let second = cache.get_token().await.unwrap();

        assert_eq!(first.secret(), "token-1");
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refetch_inside_safety_margin() {
        let (mock, calls) = counting_provider(3600);
        let cache = TokenCache::new(Arc::new(mock));

        cache.get_token().await.unwrap();

        tokio::time::advance(Duration::from_secs(3299)).await;
        assert_eq!(cache.get_token().await.unwrap().secret(), "token-1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(cache.get_token().await.unwrap().secret(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_margin() {
        let (mock, calls) = counting_provider(100);
        let cache = TokenCache::with_margin(Arc::new(mock), Duration::from_secs(10));

        cache.get_token().await.unwrap();
        tokio::time::advance(Duration::from_secs(89)).await;
        cache.get_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        tokio::time::advance(Duration::from_secs(1)).await;
        cache.get_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_lived_token_is_refetched_every_time() {
        let (mock, calls) = counting_provider(60);
        let cache = TokenCache::new(Arc::new(mock));

        cache.get_token().await.unwrap();
        cache.get_token().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exchange_failure_propagates_and_keeps_slot_empty() {
        let mut mock = MockIdentityProvider::new();
        mock.expect_exchange()
            .times(1)
            .returning(|| Err(BridgeError::Auth("rejected".into())));
        let cache = TokenCache::new(Arc::new(mock));

        let err = cache.get_token().await.unwrap_err();
        assert!(matches!(err, BridgeError::Auth(_)));
        assert!(!cache.status().await.cached);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_previous_token() {
        let mut seq = mockall::Sequence::new();
        let mut mock = MockIdentityProvider::new();
        mock.expect_exchange()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(issued("token-1", 3600)));
        mock.expect_exchange()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Err(BridgeError::Auth("iam down".into())));
        let cache = TokenCache::new(Arc::new(mock));

        cache.get_token().await.unwrap();
        tokio::time::advance(Duration::from_secs(3400)).await;
        assert!(cache.get_token().await.is_err());

        let status = cache.status().await;
        assert!(status.cached);
        assert!(!status.fresh);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_forces_refetch() {
        let (mock, calls) = counting_provider(3600);
        let cache = TokenCache::new(Arc::new(mock));

        cache.get_token().await.unwrap();
        cache.invalidate().await;
        assert_eq!(cache.get_token().await.unwrap().secret(), "token-2");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_reports_lifetime() {
        let (mock, _calls) = counting_provider(3600);
        let cache = TokenCache::new(Arc::new(mock));

        assert_eq!(
            cache.status().await,
            TokenStatus {
                cached: false,
                fresh: false,
                expires_in_secs: None
            }
        );

        cache.get_token().await.unwrap();
        tokio::time::advance(Duration::from_secs(600)).await;
        let status = cache.status().await;
        assert!(status.cached);
        assert!(status.fresh);
        assert_eq!(status.expires_in_secs, Some(3000));
    }
}
