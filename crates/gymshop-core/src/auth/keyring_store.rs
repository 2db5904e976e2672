use anyhow::{Context, Result};
use keyring::Entry;

use super::{Credentials, TokenStore};

const DEFAULT_SERVICE_NAME: &str = "gymshop";

const ACCESS_TOKEN_KEY: &str = "access_token";
const REFRESH_TOKEN_KEY: &str = "refresh_token";

/// Token store backed by the OS keychain.
pub struct KeyringTokenStore {
    service: String,
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE_NAME)
    }
}

impl KeyringTokenStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service, key).context("Failed to create keyring entry")
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store token in keychain")
    }

    fn delete(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}

impl TokenStore for KeyringTokenStore {
    fn credentials(&self) -> Result<Option<Credentials>> {
        let Some(access) = self.get(ACCESS_TOKEN_KEY)? else {
            return Ok(None);
        };
        Ok(Some(Credentials {
            access,
            refresh: self.get(REFRESH_TOKEN_KEY)?,
        }))
    }

    fn store(&self, credentials: &Credentials) -> Result<()> {
        self.set(ACCESS_TOKEN_KEY, &credentials.access)?;
        match credentials.refresh {
            Some(ref refresh) => self.set(REFRESH_TOKEN_KEY, refresh),
            None => self.delete(REFRESH_TOKEN_KEY),
        }
    }

    fn set_access_token(&self, access: &str) -> Result<()> {
        self.set(ACCESS_TOKEN_KEY, access)
    }

    fn clear(&self) -> Result<()> {
        self.delete(ACCESS_TOKEN_KEY)?;
        self.delete(REFRESH_TOKEN_KEY)
    }
}
