// src/services/memory_cache.rs
use crate::models::DataPoint;
use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

pub const MEMORY_TTL: Duration = Duration::from_secs(5 * 60);

/// Short-lived mirror of decoded series, keyed by series id.
/// Never the source of truth; entries expire lazily on access.
pub struct MemoryCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, (Vec<DataPoint>, Instant)>>,
}

impl Default for MemoryCache {
    fn default() -> Self {
        MemoryCache::with_ttl(MEMORY_TTL)
    }
}

impl MemoryCache {
    pub fn with_ttl(ttl: Duration) -> Self {
        MemoryCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn get(&self, series_id: &str) -> Option<Vec<DataPoint>> {
        let mut entries = self.entries.lock();
        let expired = match entries.get(series_id) {
            None => return None,
            Some((_, inserted)) => inserted.elapsed() > self.ttl,
        };
        if expired {
            debug!("Memory cache entry for {} expired", series_id);
            entries.remove(series_id);
            return None;
        }
        entries.get(series_id).map(|(data, _)| data.clone())
    }

    pub fn put(&self, series_id: &str, data: Vec<DataPoint>) {
        self.entries
            .lock()
            .insert(series_id.to_string(), (data, Instant::now()));
    }

    pub fn remove(&self, series_id: &str) {
        self.entries.lock().remove(series_id);
    }
}
