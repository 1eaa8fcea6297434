//! Two-tier cache (memory + disk) guarding outbound API work.
//!
//! The memory tier lives for the process; the disk tier is one JSON file per
//! key under a cache directory and survives restarts. Both tiers enforce a
//! freshness window: an entry physically present but past its TTL is a miss.
//! Writes are best-effort by contract: callers log and continue on error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::CacheTtls;

/// Deterministic key over (endpoint, username, params).
///
/// Usernames are case-insensitive on GitHub, so the key normalizes to
/// lowercase before hashing.
#[derive(Debug, Clone)]
pub struct CacheKey {
    pub endpoint: String,
    pub username: String,
    pub key_hash: String,
}

impl CacheKey {
    pub fn new(endpoint: &str, username: &str, params: &[&str]) -> Self {
        let username = username.trim().to_lowercase();
        let mut fields: Vec<&str> = vec![endpoint, &username];
        fields.extend_from_slice(params);
        let key_hash = hash_fields(&fields);

        Self {
            endpoint: endpoint.to_string(),
            username,
            key_hash,
        }
    }
}

/// On-disk entry format: the payload plus its creation timestamp, so
/// freshness can be checked without filesystem metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub cached_at: i64,
    pub payload: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("cache lock poisoned")]
    Poisoned,
    #[error("task join error: {0}")]
    Join(String),
}

#[async_trait]
pub trait AnalysisCache: Send + Sync {
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, CacheError>;
    async fn put(&self, key: &CacheKey, value: &Value) -> Result<(), CacheError>;
}

#[derive(Debug)]
struct MemoryEntry {
    cached_at: i64,
    payload: Value,
}

/// Memory-then-disk cache. A disk hit repopulates the memory tier.
///
/// No cross-process locking: writes are idempotent (same key, same value), so
/// a lost write only costs a redundant future fetch.
#[derive(Clone)]
pub struct TieredCache {
    dir: PathBuf,
    ttls: CacheTtls,
    memory: Arc<Mutex<HashMap<String, MemoryEntry>>>,
}

impl TieredCache {
    pub fn new(dir: impl AsRef<Path>, ttls: CacheTtls) -> Self {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).ok();

        Self {
            dir,
            ttls,
            memory: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn default_dir() -> PathBuf {
        if let Ok(path) = std::env::var("GIT_LEGACY_CACHE_DIR") {
            return PathBuf::from(path);
        }
        dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("git-legacy")
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(format!("{}.json", key.key_hash))
    }

    fn memory_get(&self, key_hash: &str, now: i64) -> Result<Option<Value>, CacheError> {
        let mut guard = self.memory.lock().map_err(|_| CacheError::Poisoned)?;
        let fresh = match guard.get(key_hash) {
            Some(entry) => now - entry.cached_at < self.ttls.memory.as_secs() as i64,
            None => return Ok(None),
        };
        if !fresh {
            guard.remove(key_hash);
            return Ok(None);
        }
        Ok(guard.get(key_hash).map(|e| e.payload.clone()))
    }

    fn memory_put(&self, key_hash: &str, cached_at: i64, payload: Value) -> Result<(), CacheError> {
        let mut guard = self.memory.lock().map_err(|_| CacheError::Poisoned)?;
        guard.insert(key_hash.to_string(), MemoryEntry { cached_at, payload });
        Ok(())
    }

    /// Drop both tiers for a key. Returns whether a disk entry was removed.
    pub async fn clear(&self, key: &CacheKey) -> Result<bool, CacheError> {
        {
            let mut guard = self.memory.lock().map_err(|_| CacheError::Poisoned)?;
            guard.remove(&key.key_hash);
        }
        let path = self.entry_path(key);
        tokio::task::spawn_blocking(move || -> Result<bool, CacheError> {
            if path.exists() {
                std::fs::remove_file(&path)?;
                return Ok(true);
            }
            Ok(false)
        })
        .await
        .map_err(|e| CacheError::Join(e.to_string()))?
    }

    /// Delete disk entries older than `max_age`. Unparseable files are
    /// deleted too. Returns the number of files removed.
    pub async fn prune(&self, max_age: Duration) -> Result<usize, CacheError> {
        let dir = self.dir.clone();
        let cutoff = now_epoch() - max_age.as_secs() as i64;
        tokio::task::spawn_blocking(move || -> Result<usize, CacheError> {
            let mut deleted = 0usize;
            for dir_entry in std::fs::read_dir(&dir)? {
                let path = dir_entry?.path();
                if path.extension().and_then(|e| e.to_str()) != Some("json") {
                    continue;
                }
                let stale = std::fs::read_to_string(&path)
                    .ok()
                    .and_then(|raw| serde_json::from_str::<CacheEntry>(&raw).ok())
                    .map(|entry| entry.cached_at < cutoff)
                    .unwrap_or(true);
                if stale && std::fs::remove_file(&path).is_ok() {
                    deleted += 1;
                }
            }
            Ok(deleted)
        })
        .await
        .map_err(|e| CacheError::Join(e.to_string()))?
    }
}

#[async_trait]
impl AnalysisCache for TieredCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<Value>, CacheError> {
        let now = now_epoch();

        if let Some(payload) = self.memory_get(&key.key_hash, now)? {
            debug!(key = %key.key_hash, "memory cache hit");
            return Ok(Some(payload));
        }

        let path = self.entry_path(key);
        let disk_ttl = self.ttls.disk.as_secs() as i64;
        let loaded = tokio::task::spawn_blocking(move || -> Result<Option<CacheEntry>, CacheError> {
            if !path.exists() {
                return Ok(None);
            }
            let raw = std::fs::read_to_string(&path)?;
            let entry: CacheEntry = serde_json::from_str(&raw)?;
            if now - entry.cached_at >= disk_ttl {
                // Expired entries are misses; drop the file so the directory
                // does not accumulate stale payloads.
                std::fs::remove_file(&path).ok();
                return Ok(None);
            }
            Ok(Some(entry))
        })
        .await
        .map_err(|e| CacheError::Join(e.to_string()))??;

        match loaded {
            Some(entry) => {
                debug!(key = %key.key_hash, "disk cache hit");
                self.memory_put(&key.key_hash, entry.cached_at, entry.payload.clone())?;
                Ok(Some(entry.payload))
            }
            None => Ok(None),
        }
    }

    async fn put(&self, key: &CacheKey, value: &Value) -> Result<(), CacheError> {
        let now = now_epoch();
        self.memory_put(&key.key_hash, now, value.clone())?;

        let entry = CacheEntry {
            cached_at: now,
            payload: value.clone(),
        };
        let path = self.entry_path(key);
        tokio::task::spawn_blocking(move || -> Result<(), CacheError> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            std::fs::write(&path, serde_json::to_string(&entry)?)?;
            Ok(())
        })
        .await
        .map_err(|e| CacheError::Join(e.to_string()))?
    }
}

/// Blake3 over `|`-joined fields, hex encoded.
pub fn hash_fields(fields: &[&str]) -> String {
    let mut hasher = blake3::Hasher::new();
    for (idx, field) in fields.iter().enumerate() {
        if idx > 0 {
            hasher.update(b"|");
        }
        hasher.update(field.as_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

pub fn now_epoch() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_normalizes_username_case() {
        let a = CacheKey::new("analyze/v1", "Octocat", &[]);
        let b = CacheKey::new("analyze/v1", "octocat", &[]);
        assert_eq!(a.key_hash, b.key_hash);
    }

    #[test]
    fn key_distinguishes_endpoint_and_params() {
        let a = CacheKey::new("analyze/v1", "octocat", &[]);
        let b = CacheKey::new("events", "octocat", &[]);
        let c = CacheKey::new("events", "octocat", &["page=2"]);
        assert_ne!(a.key_hash, b.key_hash);
        assert_ne!(b.key_hash, c.key_hash);
    }
}
