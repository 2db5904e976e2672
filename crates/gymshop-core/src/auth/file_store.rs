use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use super::{Credentials, TokenStore};

/// Token file name in the data directory
const TOKEN_FILE: &str = "tokens.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(flatten)]
    credentials: Credentials,
    saved_at: DateTime<Utc>,
}

/// Token store persisted as JSON on disk. Survives restarts; removed on logout.
pub struct FileTokenStore {
    dir: PathBuf,
    // Serializes read-modify-write of the file within this process
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(TOKEN_FILE)
    }

    /// When the tokens on disk were last written
    pub fn saved_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(Self::read(&self.path())?.map(|t| t.saved_at))
    }

    fn read(path: &Path) -> Result<Option<StoredTokens>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path).context("Failed to read token file")?;
        let stored: StoredTokens =
            serde_json::from_str(&contents).context("Failed to parse token file")?;
        Ok(Some(stored))
    }

    fn write(&self, credentials: &Credentials) -> Result<()> {
        let path = self.path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create token directory")?;
        }
        let stored = StoredTokens {
            credentials: credentials.clone(),
            saved_at: Utc::now(),
        };
        let contents = serde_json::to_string_pretty(&stored)?;

        // Temp files are created owner-only; rename keeps the swap atomic
        let dir = path.parent().unwrap_or(&self.dir);
        let mut file = NamedTempFile::new_in(dir).context("Failed to create temp token file")?;
        file.write_all(contents.as_bytes())
            .context("Failed to write token file")?;
        file.as_file()
            .sync_all()
            .context("Failed to flush token file")?;
        file.persist(&path).context("Failed to replace token file")?;
        debug!(path = %path.display(), "Saved tokens");
        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.write_lock
            .lock()
            .map_err(|_| anyhow!("token file lock poisoned"))
    }
}

impl TokenStore for FileTokenStore {
    fn credentials(&self) -> Result<Option<Credentials>> {
        Ok(Self::read(&self.path())?.map(|t| t.credentials))
    }

    fn store(&self, credentials: &Credentials) -> Result<()> {
        let _guard = self.lock()?;
        self.write(credentials)
    }

    fn set_access_token(&self, access: &str) -> Result<()> {
        let _guard = self.lock()?;
        let refresh = Self::read(&self.path())?.and_then(|t| t.credentials.refresh);
        self.write(&Credentials {
            access: access.to_string(),
            refresh,
        })
    }

    fn clear(&self) -> Result<()> {
        let _guard = self.lock()?;
        let path = self.path();
        if path.exists() {
            std::fs::remove_file(&path).context("Failed to remove token file")?;
        }
        Ok(())
    }
}
