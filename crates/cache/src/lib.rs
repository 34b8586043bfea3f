//! Freshness-window cache for query results.
//!
//! An explicit component injected into the data-access path, not ambient
//! global state: each entry is a JSON envelope `{timestamp, payload}` in a
//! file under the cache root, keyed and aged by a `CacheConfig`. Entries
//! are invalidated by age, never by content; a corrupt entry is a miss,
//! never an error on the read path.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache IO failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// One named cache slot: key plus freshness window.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub key: String,
    pub ttl: Duration,
}

impl CacheConfig {
    pub fn new(key: impl Into<String>, ttl: Duration) -> Self {
        Self { key: key.into(), ttl }
    }

    /// Recent-recalls query results, 30 minutes.
    pub fn recent() -> Self {
        Self::new("rappelconso_recent", Duration::from_secs(30 * 60))
    }

    /// Compressed historical dataset, 7 days.
    pub fn historical() -> Self {
        Self::new("rappelconso_historical_data", Duration::from_secs(7 * 24 * 60 * 60))
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// Unix millis at write time
    timestamp: i64,
    payload: T,
}

/// Age and size of a stored entry, for maintenance display.
#[derive(Debug, Clone, Serialize)]
pub struct CacheInfo {
    pub key: String,
    pub age_secs: u64,
    pub size_bytes: u64,
}

/// File-backed cache rooted at a directory.
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn entry_path(&self, config: &CacheConfig) -> PathBuf {
        self.root.join(format!("{}.json", config.key))
    }

    /// Read a fresh entry; stale or unparsable entries are evicted and
    /// reported as a miss.
    pub fn get<T: DeserializeOwned>(&self, config: &CacheConfig) -> Option<T> {
        let path = self.entry_path(config);
        let raw = fs::read_to_string(&path).ok()?;

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(key = %config.key, error = %e, "Evicting corrupt cache entry");
                let _ = fs::remove_file(&path);
                return None;
            }
        };

        let age_millis = Utc::now().timestamp_millis().saturating_sub(entry.timestamp);
        if age_millis < 0 || age_millis as u128 > config.ttl.as_millis() {
            tracing::debug!(key = %config.key, "Evicting stale cache entry");
            let _ = fs::remove_file(&path);
            return None;
        }

        Some(entry.payload)
    }

    /// Write an entry with the current timestamp.
    pub fn put<T: Serialize>(&self, config: &CacheConfig, payload: &T) -> Result<(), CacheError> {
        fs::create_dir_all(&self.root)?;
        let entry = CacheEntry {
            timestamp: Utc::now().timestamp_millis(),
            payload,
        };
        fs::write(self.entry_path(config), serde_json::to_vec(&entry)?)?;
        Ok(())
    }

    /// Remove one entry if present.
    pub fn clear(&self, config: &CacheConfig) {
        let _ = fs::remove_file(self.entry_path(config));
    }

    /// Remove every entry under the cache root.
    pub fn clear_all(&self) {
        if let Ok(entries) = fs::read_dir(&self.root) {
            for entry in entries.flatten() {
                if entry.path().extension().is_some_and(|ext| ext == "json") {
                    let _ = fs::remove_file(entry.path());
                }
            }
        }
    }

    /// Age and size of a stored entry, None when absent.
    pub fn info(&self, config: &CacheConfig) -> Option<CacheInfo> {
        let path = self.entry_path(config);
        let raw = fs::read_to_string(&path).ok()?;
        let size_bytes = raw.len() as u64;

        let age_secs = serde_json::from_str::<CacheEntry<serde_json::Value>>(&raw)
            .ok()
            .map(|entry| {
                Utc::now()
                    .timestamp_millis()
                    .saturating_sub(entry.timestamp)
                    .max(0) as u64
                    / 1000
            })
            .unwrap_or(0);

        Some(CacheInfo {
            key: config.key.clone(),
            age_secs,
            size_bytes,
        })
    }
}
