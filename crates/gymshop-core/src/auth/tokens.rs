use std::fmt;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Access/refresh token pair issued at login.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh: Option<String>,
}

impl Credentials {
    pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: Some(refresh.into()),
        }
    }

    /// A pair without a refresh token; the session ends on the first 401.
    pub fn access_only(access: impl Into<String>) -> Self {
        Self {
            access: access.into(),
            refresh: None,
        }
    }
}

// Tokens must never end up in logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access", &"<redacted>")
            .field("refresh", &self.refresh.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Persistent storage for the current credential pair.
///
/// The API client holds one of these behind an `Arc` and treats it as the
/// single source of truth for the current access token.
pub trait TokenStore: Send + Sync {
    /// Current credential pair, if a session exists
    fn credentials(&self) -> Result<Option<Credentials>>;

    /// Replace the whole pair (login)
    fn store(&self, credentials: &Credentials) -> Result<()>;

    /// Replace only the access token, keeping the refresh token (refresh)
    fn set_access_token(&self, access: &str) -> Result<()>;

    /// Remove both tokens (logout, irrecoverable auth failure)
    fn clear(&self) -> Result<()>;

    fn access_token(&self) -> Result<Option<String>> {
        Ok(self.credentials()?.map(|c| c.access))
    }

    fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self.credentials()?.and_then(|c| c.refresh))
    }

    fn has_session(&self) -> Result<bool> {
        Ok(self.credentials()?.is_some())
    }
}

/// In-process token store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    inner: RwLock<Option<Credentials>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(credentials: Credentials) -> Self {
        Self {
            inner: RwLock::new(Some(credentials)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn credentials(&self) -> Result<Option<Credentials>> {
        let guard = self
            .inner
            .read()
            .map_err(|_| anyhow!("token store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn store(&self, credentials: &Credentials) -> Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| anyhow!("token store lock poisoned"))?;
        *guard = Some(credentials.clone());
        Ok(())
    }

    fn set_access_token(&self, access: &str) -> Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| anyhow!("token store lock poisoned"))?;
        let refresh = guard.as_ref().and_then(|c| c.refresh.clone());
        *guard = Some(Credentials {
            access: access.to_string(),
            refresh,
        });
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| anyhow!("token store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_lifecycle() {
        let store = MemoryTokenStore::new();
        assert!(!store.has_session().unwrap());
        assert_eq!(store.access_token().unwrap(), None);

        store.store(&Credentials::new("T1", "R1")).unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("T1"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("R1"));

        store.set_access_token("T2").unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("T2"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("R1"));

        store.clear().unwrap();
        assert!(store.credentials().unwrap().is_none());
    }

    #[test]
    fn test_access_only_has_no_refresh() {
        let store = MemoryTokenStore::with_credentials(Credentials::access_only("T1"));
        assert_eq!(store.refresh_token().unwrap(), None);
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let rendered = format!("{:?}", Credentials::new("secret-access", "secret-refresh"));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("redacted"));
    }

    #[test]
    fn test_credentials_json_shape() {
        let json = serde_json::to_value(Credentials::access_only("T1")).unwrap();
        assert_eq!(json, serde_json::json!({"access": "T1"}));

        let parsed: Credentials =
            serde_json::from_str(r#"{"access":"A","refresh":"R"}"#).unwrap();
        assert_eq!(parsed, Credentials::new("A", "R"));
    }
}
