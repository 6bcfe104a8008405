use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::persist::{SessionStore, default_store_dir};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub timeout: Duration,
    pub notice_ttl: Duration,
    pub session_dir: PathBuf,
}

fn env_u64(name: &str) -> Option<u64> {
    env::var(name).ok().and_then(|val| val.trim().parse::<u64>().ok())
}

impl AppConfig {
    /// Reads `WC26_*` variables; call after `dotenvy` has loaded env files.
    pub fn from_env() -> Result<Self> {
        let api_base_url = env::var("WC26_API_BASE_URL")
            .ok()
            .map(|val| val.trim().trim_end_matches('/').to_string())
            .filter(|val| !val.is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let timeout = Duration::from_secs(env_u64("WC26_TIMEOUT_SECS").unwrap_or(10).clamp(1, 120));
        let notice_ttl = Duration::from_secs(env_u64("WC26_NOTICE_SECS").unwrap_or(3).clamp(1, 30));
        let session_dir = match env::var("WC26_SESSION_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_store_dir().context("no session directory: set WC26_SESSION_DIR or HOME")?,
        };
        Ok(Self {
            api_base_url,
            timeout,
            notice_ttl,
            session_dir,
        })
    }

    pub fn session_store(&self) -> SessionStore {
        SessionStore::in_dir(&self.session_dir)
    }
}
