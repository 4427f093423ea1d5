use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;

use super::Identity;

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// The signed-in identity, optionally persisted to disk.
pub struct Session {
    cache_dir: Option<PathBuf>,
    pub data: Option<Identity>,
}

impl Session {
    /// A session persisted in `cache_dir`.
    pub fn new(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir: Some(cache_dir),
            data: None,
        }
    }

    /// A session that is never written to disk.
    pub fn ephemeral() -> Self {
        Self {
            cache_dir: None,
            data: None,
        }
    }

    /// Load session from disk. Expired sessions are ignored.
    pub fn load(&mut self) -> Result<bool> {
        let Some(path) = self.session_path() else {
            return Ok(false);
        };
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .context("Failed to read session file")?;
            let data: Identity = serde_json::from_str(&contents)
                .context("Failed to parse session file")?;

            if !data.is_expired(Utc::now()) {
                self.data = Some(data);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Save session to disk
    pub fn save(&self) -> Result<()> {
        if let (Some(data), Some(path)) = (&self.data, self.session_path()) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(data)?;
            std::fs::write(path, contents)?;
        }
        Ok(())
    }

    /// Clear session data
    pub fn clear(&mut self) -> Result<()> {
        self.data = None;
        if let Some(path) = self.session_path() {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    pub fn update(&mut self, data: Identity) {
        self.data = Some(data);
    }

    /// Get the bearer token if session is valid
    pub fn token(&self) -> Option<&str> {
        self.data
            .as_ref()
            .filter(|d| !d.is_expired(Utc::now()))
            .map(|d| d.id_token.as_str())
    }

    /// Check if session is valid (exists and not expired)
    pub fn is_valid(&self) -> bool {
        self.token().is_some()
    }

    fn session_path(&self) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join(SESSION_FILE))
    }
}
