//! Single-flight access token refresh.
//!
//! Refreshes are serialized behind one async mutex. A caller that gets the
//! lock after someone else already replaced the token it was rejected with
//! reuses the new token instead of spending the refresh token again.
//! Credential writes and clears happen while the lock is held, so a waiter
//! never observes a half-finished refresh.

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{ApiError, ApiResult};
use crate::auth::{Credentials, TokenStore};

/// Body sent to the refresh endpoint
#[derive(Debug, Serialize)]
pub(crate) struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Refresh endpoint response. Backends that rotate refresh tokens also
/// return a new `refresh`.
#[derive(Debug, Deserialize)]
pub struct TokenRefresh {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Recovery {
    /// This caller exchanged the refresh token for a new access token
    Refreshed(String),
    /// Another caller refreshed while this one waited
    Reused(String),
    /// No refresh token stored; credentials have been cleared
    MissingRefreshToken,
    /// The session was cleared while this caller waited for the lock
    SessionEnded,
}

#[derive(Default)]
pub(crate) struct RefreshCoordinator {
    lock: Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recover from a 401 received while sending `rejected` as the bearer token.
    ///
    /// `exchange` performs the refresh call; it runs at most once per
    /// invocation and only while the lock is held. On exchange failure both
    /// tokens are cleared and `ApiError::RefreshFailed` is returned. A caller
    /// that finds the store emptied by someone else gets `SessionEnded`.
    pub async fn recover<F, Fut>(
        &self,
        store: &dyn TokenStore,
        rejected: Option<&str>,
        exchange: F,
    ) -> ApiResult<Recovery>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = ApiResult<TokenRefresh>>,
    {
        let _guard = self.lock.lock().await;

        match store.access_token().map_err(ApiError::TokenStore)? {
            Some(current) if Some(current.as_str()) != rejected => {
                debug!("Access token already refreshed by another request");
                return Ok(Recovery::Reused(current));
            }
            None if rejected.is_some() => {
                debug!("Session ended while waiting for refresh");
                return Ok(Recovery::SessionEnded);
            }
            _ => {}
        }

        let Some(refresh_token) = store.refresh_token().map_err(ApiError::TokenStore)? else {
            warn!("Received 401 with no refresh token stored");
            store.clear().map_err(ApiError::TokenStore)?;
            return Ok(Recovery::MissingRefreshToken);
        };

        match exchange(refresh_token).await {
            Ok(TokenRefresh { access, refresh }) => {
                let stored = match refresh {
                    Some(refresh) => store.store(&Credentials {
                        access: access.clone(),
                        refresh: Some(refresh),
                    }),
                    None => store.set_access_token(&access),
                };
                // The refresh token may already be spent; replay with the new
                // access token even if it could not be persisted.
                if let Err(e) = stored {
                    warn!(error = %e, "Failed to store refreshed access token");
                }
                info!("Access token refreshed");
                Ok(Recovery::Refreshed(access))
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing credentials");
                if let Err(clear_err) = store.clear() {
                    warn!(error = %clear_err, "Failed to clear credentials");
                }
                Err(ApiError::RefreshFailed(Box::new(e)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::auth::MemoryTokenStore;

    fn refreshed(access: &str) -> ApiResult<TokenRefresh> {
        Ok(TokenRefresh {
            access: access.to_string(),
            refresh: None,
        })
    }

    #[tokio::test]
    async fn test_refresh_replaces_access_token() {
        let store = MemoryTokenStore::with_credentials(Credentials::new("T1", "R1"));
        let coordinator = RefreshCoordinator::new();

        let outcome = coordinator
            .recover(&store, Some("T1"), |refresh| async move {
                assert_eq!(refresh, "R1");
                refreshed("T2")
            })
            .await
            .unwrap();

        assert_eq!(outcome, Recovery::Refreshed("T2".to_string()));
        assert_eq!(store.credentials().unwrap(), Some(Credentials::new("T2", "R1")));
    }

    #[tokio::test]
    async fn test_rotated_refresh_token_is_stored() {
        let store = MemoryTokenStore::with_credentials(Credentials::new("T1", "R1"));
        RefreshCoordinator::new()
            .recover(&store, Some("T1"), |_| async {
                Ok(TokenRefresh {
                    access: "T2".to_string(),
                    refresh: Some("R2".to_string()),
                })
            })
            .await
            .unwrap();
        assert_eq!(store.credentials().unwrap(), Some(Credentials::new("T2", "R2")));
    }

    #[tokio::test]
    async fn test_missing_refresh_token_skips_exchange() {
        let store = MemoryTokenStore::with_credentials(Credentials::access_only("T1"));
        let calls = AtomicUsize::new(0);

        let outcome = RefreshCoordinator::new()
            .recover(&store, Some("T1"), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { refreshed("never") }
            })
            .await
            .unwrap();

        assert_eq!(outcome, Recovery::MissingRefreshToken);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(store.credentials().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_exchange_clears_both_tokens() {
        let store = MemoryTokenStore::with_credentials(Credentials::new("T1", "R1"));
        let err = RefreshCoordinator::new()
            .recover(&store, Some("T1"), |_| async {
                Err(ApiError::Unauthorized {
                    body: "token_not_valid".to_string(),
                })
            })
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::RefreshFailed(ref inner) if inner.is_unauthorized()));
        assert!(store.credentials().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_concurrent_recoveries_share_one_exchange() {
        let store = Arc::new(MemoryTokenStore::with_credentials(Credentials::new("T1", "R1")));
        let coordinator = Arc::new(RefreshCoordinator::new());
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks = (0..5).map(|_| {
            let store = Arc::clone(&store);
            let coordinator = Arc::clone(&coordinator);
            let calls = Arc::clone(&calls);
            async move {
                coordinator
                    .recover(store.as_ref(), Some("T1"), |_| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        refreshed("T2")
                    })
                    .await
                    .unwrap()
            }
        });
        let outcomes = futures::future::join_all(tasks).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            outcomes.iter().filter(|o| matches!(o, Recovery::Refreshed(_))).count(),
            1
        );
        assert!(outcomes
            .iter()
            .all(|o| matches!(o, Recovery::Refreshed(t) | Recovery::Reused(t) if t == "T2")));
    }

    #[tokio::test]
    async fn test_waiter_after_failed_refresh_does_not_retry() {
        let store = MemoryTokenStore::with_credentials(Credentials::new("T1", "R1"));
        let coordinator = RefreshCoordinator::new();

        let first = coordinator
            .recover(&store, Some("T1"), |_| async {
                Err(ApiError::InvalidResponse("boom".to_string()))
            })
            .await;
        assert!(first.is_err());

        let calls = AtomicUsize::new(0);
        let second = coordinator
            .recover(&store, Some("T1"), |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { refreshed("T2") }
            })
            .await
            .unwrap();
        assert_eq!(second, Recovery::SessionEnded);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unauthenticated_request_without_session_is_missing_token() {
        let store = MemoryTokenStore::new();
        let outcome = RefreshCoordinator::new()
            .recover(&store, None, |_| async { refreshed("never") })
            .await
            .unwrap();
        assert_eq!(outcome, Recovery::MissingRefreshToken);
    }

    /// Reads succeed, writes fail
    struct ReadOnlyStore(MemoryTokenStore);

    impl TokenStore for ReadOnlyStore {
        fn credentials(&self) -> anyhow::Result<Option<Credentials>> {
            self.0.credentials()
        }

        fn store(&self, _: &Credentials) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }

        fn set_access_token(&self, _: &str) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("disk full"))
        }

        fn clear(&self) -> anyhow::Result<()> {
            self.0.clear()
        }
    }

    #[tokio::test]
    async fn test_store_failure_still_returns_new_token() {
        let store = ReadOnlyStore(MemoryTokenStore::with_credentials(Credentials::new(
            "T1", "R1",
        )));
        let coordinator = RefreshCoordinator::new();

        let outcome = coordinator
            .recover(&store, Some("T1"), |_| async { refreshed("T2") })
            .await
            .unwrap();
        assert_eq!(outcome, Recovery::Refreshed("T2".to_string()));

        let rotated = coordinator
            .recover(&store, Some("T1"), |_| async {
                Ok(TokenRefresh {
                    access: "T3".to_string(),
                    refresh: Some("R2".to_string()),
                })
            })
            .await
            .unwrap();
        assert_eq!(rotated, Recovery::Refreshed("T3".to_string()));
    }
}
