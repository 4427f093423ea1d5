use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::models::{Collection, Records};

use super::{Clock, SystemClock};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T, cached_at: DateTime<Utc>) -> Self {
        Self { data, cached_at }
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.cached_at
    }

    /// Served from cache only while strictly younger than `ttl`.
    pub fn is_fresh(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        self.age(now) < ttl
    }

    pub fn age_display(&self, now: DateTime<Utc>) -> String {
        let minutes = self.age(now).num_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// Per-collection cache of the last successful fetch.
///
/// Every entry carries its own timestamp, so invalidating or refreshing one
/// collection never changes how old the others look. Locks are only held
/// for map access, never across an await.
pub struct CacheManager {
    entries: Mutex<HashMap<Collection, CachedData<Arc<Records>>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
    cache_dir: Option<PathBuf>,
}

impl CacheManager {
    /// A cache that lives only as long as this value.
    pub fn in_memory(ttl: std::time::Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl: Duration::from_std(ttl).unwrap_or(Duration::MAX),
            clock: Arc::new(SystemClock),
            cache_dir: None,
        }
    }

    /// A cache that writes entries through to `cache_dir` and starts from
    /// whatever a previous process left there.
    pub fn persistent(cache_dir: PathBuf, ttl: std::time::Duration) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory: {}", cache_dir.display()))?;

        let mut entries = HashMap::new();
        for collection in Collection::ALL {
            match Self::load(&cache_dir, collection) {
                Ok(Some(entry)) => {
                    entries.insert(collection, entry);
                }
                Ok(None) => {}
                Err(e) => {
                    debug!(%collection, error = %e, "Ignoring unreadable cache file");
                }
            }
        }
        debug!(count = entries.len(), dir = %cache_dir.display(), "Cache warmed from disk");

        Ok(Self {
            entries: Mutex::new(entries),
            cache_dir: Some(cache_dir),
            ..Self::in_memory(ttl)
        })
    }

    /// Replace the time source used for stamping and ageing entries.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Collection, CachedData<Arc<Records>>>> {
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The entry for `collection`, whatever its age.
    pub fn get(&self, collection: Collection) -> Option<CachedData<Arc<Records>>> {
        self.entries().get(&collection).cloned()
    }

    /// The cached payload if it is still within the TTL.
    pub fn get_fresh(&self, collection: Collection) -> Option<Arc<Records>> {
        let now = self.now();
        self.entries()
            .get(&collection)
            .filter(|entry| entry.is_fresh(now, self.ttl))
            .map(|entry| Arc::clone(&entry.data))
    }

    /// Store a fresh payload, stamped with the current time. Returns the
    /// shared handle that later cache hits will hand out.
    pub fn store(&self, records: Records) -> Arc<Records> {
        let collection = records.collection();
        let entry = CachedData::new(Arc::new(records), self.now());
        let data = Arc::clone(&entry.data);

        if let Err(e) = self.save(collection, &entry) {
            warn!(%collection, error = %e, "Failed to write cache file");
        }
        self.entries().insert(collection, entry);
        data
    }

    /// Drop the entry for `collection`. Other entries keep their timestamps.
    pub fn invalidate(&self, collection: Collection) -> bool {
        if let Some(path) = self.cache_path(collection) {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!(%collection, error = %e, "Failed to remove cache file");
                }
            }
        }
        self.entries().remove(&collection).is_some()
    }

    pub fn clear(&self) {
        for collection in Collection::ALL {
            self.invalidate(collection);
        }
    }

    pub fn is_stale(&self, collection: Collection) -> bool {
        self.get_fresh(collection).is_none()
    }

    pub fn any_stale(&self) -> bool {
        Collection::ALL.iter().any(|&c| self.is_stale(c))
    }

    /// Newest fetch time across all collections.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.entries().values().map(|entry| entry.cached_at).max()
    }

    pub fn ages(&self) -> CacheAges {
        let now = self.now();
        let entries = self.entries();
        CacheAges {
            ages: Collection::ALL
                .iter()
                .map(|c| (*c, entries.get(c).map(|entry| entry.age_display(now))))
                .collect(),
            last_updated: entries
                .values()
                .max_by_key(|entry| entry.cached_at)
                .map(|entry| entry.age_display(now)),
        }
    }

    // ===== Disk persistence =====

    fn cache_path(&self, collection: Collection) -> Option<PathBuf> {
        self.cache_dir
            .as_ref()
            .map(|dir| Self::path_in(dir, collection))
    }

    fn path_in(dir: &Path, collection: Collection) -> PathBuf {
        dir.join(format!("{}.json", collection.path()))
    }

    fn load(dir: &Path, collection: Collection) -> Result<Option<CachedData<Arc<Records>>>> {
        let path = Self::path_in(dir, collection);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", collection))?;
        let raw: CachedData<serde_json::Value> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", collection))?;
        let records = Records::from_value(collection, raw.data)
            .with_context(|| format!("Unexpected records in cache file: {}", collection))?;

        Ok(Some(CachedData::new(Arc::new(records), raw.cached_at)))
    }

    fn save(&self, collection: Collection, entry: &CachedData<Arc<Records>>) -> Result<()> {
        let Some(path) = self.cache_path(collection) else {
            return Ok(());
        };
        let on_disk = CachedData::new(entry.data.as_ref(), entry.cached_at);
        let contents = serde_json::to_string_pretty(&on_disk)?;
        std::fs::write(&path, contents)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct CacheAges {
    pub ages: Vec<(Collection, Option<String>)>,
    pub last_updated: Option<String>,
}

impl CacheAges {
    pub fn age_of(&self, collection: Collection) -> String {
        self.ages
            .iter()
            .find(|(c, _)| *c == collection)
            .and_then(|(_, age)| age.clone())
            .unwrap_or_else(|| "never".to_string())
    }

    /// Age of the most recently fetched collection.
    pub fn last_updated(&self) -> String {
        self.last_updated
            .clone()
            .unwrap_or_else(|| "never".to_string())
    }
}

// ============================================================================
// Tests
// ============================================================================
