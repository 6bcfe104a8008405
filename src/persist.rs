use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::model::UserProfile;
use crate::reconcile::FavoritesIndex;

pub const STORE_DIR: &str = "wc26_admin";
const SESSION_FILE: &str = "session.json";
const SESSION_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub version: u32,
    pub token: String,
    pub user: UserProfile,
    #[serde(default)]
    pub favorites: FavoritesIndex,
}

impl PersistedSession {
    pub fn new(token: String, user: UserProfile, favorites: FavoritesIndex) -> Self {
        Self {
            version: SESSION_VERSION,
            token,
            user,
            favorites,
        }
    }
}

/// Signed-in user, token and favorites kept on disk between runs.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::at(dir.join(SESSION_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing, unreadable or outdated files all read as "no session".
    pub fn load(&self) -> Option<PersistedSession> {
        let raw = fs::read_to_string(&self.path).ok()?;
        let session = serde_json::from_str::<PersistedSession>(&raw).ok()?;
        if session.version != SESSION_VERSION {
            debug!(
                path = %self.path.display(),
                version = session.version,
                "ignoring stale session file"
            );
            return None;
        }
        Some(session)
    }

    pub fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_string(session)?;
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// `$XDG_CACHE_HOME/wc26_admin`, falling back to `~/.cache/wc26_admin`.
pub fn default_store_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(STORE_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(STORE_DIR))
}
