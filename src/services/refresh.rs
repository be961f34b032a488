// src/services/refresh.rs
//! Stale-while-revalidate read path.
//!
//! Reads are answered from memory or the cache file straight away. If the
//! series is stale, not backed off and not already being refreshed by this
//! process, a background task fetches from the provider and writes the
//! result through the cache store.

use crate::error::Result;
use crate::models::{DataPoint, SeriesConfig, SeriesData, SeriesDataMeta};
use crate::services::cache_store::CacheStore;
use crate::services::memory_cache::MemoryCache;
use crate::services::providers::ProviderRegistry;
use chrono::NaiveDate;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    Updated { fetched: usize, total: usize },
    NoNewData,
    AlreadyRefreshing,
}

type InFlight = Arc<Mutex<HashSet<String>>>;

/// Membership in the in-flight set. Dropping it ends the refresh,
/// whether it finished, failed or panicked.
struct InFlightGuard {
    in_flight: InFlight,
    series_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.series_id);
    }
}

#[derive(Clone)]
pub struct RefreshCoordinator {
    store: Arc<CacheStore>,
    memory: Arc<MemoryCache>,
    providers: Arc<ProviderRegistry>,
    in_flight: InFlight,
}

impl RefreshCoordinator {
    pub fn new(
        store: Arc<CacheStore>,
        memory: Arc<MemoryCache>,
        providers: Arc<ProviderRegistry>,
    ) -> Self {
        RefreshCoordinator {
            store,
            memory,
            providers,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn memory(&self) -> &MemoryCache {
        &self.memory
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    pub fn is_refreshing(&self, series_id: &str) -> bool {
        self.in_flight.lock().contains(series_id)
    }

    /// Best data available right now, filtered to `min_date` and later.
    /// Never waits on the network. Must run inside a Tokio runtime since it
    /// may spawn the background refresh.
    pub fn get_series_data(&self, config: &SeriesConfig, min_date: NaiveDate) -> SeriesData {
        let data = match self.memory.get(&config.id) {
            Some(data) => {
                debug!("Memory cache hit for {}", config.id);
                data
            }
            None => {
                let data = self.store.read(config);
                if !data.is_empty() {
                    self.memory.put(&config.id, data.clone());
                }
                data
            }
        };

        self.refresh_if_stale(config);

        let meta = self.store.series_meta(&config.id).unwrap_or_default();
        SeriesData {
            series: config.id.clone(),
            meta: SeriesDataMeta {
                id: config.id.clone(),
                title: config.title.clone(),
                description: config.description.clone(),
                unit: config.unit.clone(),
                provider: config.provider.clone(),
                frequency: config.frequency,
                last_fetched: meta.last_fetched,
                last_data_date: meta.last_data_date,
                is_refreshing: self.is_refreshing(&config.id),
                last_error: meta.last_error,
            },
            data: data
                .into_iter()
                .filter(|p| p.date >= min_date)
                .collect::<Vec<DataPoint>>(),
        }
    }

    /// Spawns a background refresh when the series is stale, not backed off
    /// and not already in flight. Returns whether one was started.
    pub fn refresh_if_stale(&self, config: &SeriesConfig) -> bool {
        if !self.store.needs_refresh(config) || self.store.should_backoff(&config.id) {
            return false;
        }
        let guard = match self.begin_refresh(&config.id) {
            Some(guard) => guard,
            None => return false,
        };

        let coordinator = self.clone();
        let config = config.clone();
        tokio::spawn(async move {
            let _guard = guard;
            // failures are already logged and recorded as backoff
            let _ = coordinator.run_refresh(&config).await;
        });
        true
    }

    /// Refreshes now, ignoring staleness and backoff, unless this process is
    /// already refreshing the series.
    pub async fn refresh_now(&self, config: &SeriesConfig) -> Result<RefreshOutcome> {
        let _guard = match self.begin_refresh(&config.id) {
            Some(guard) => guard,
            None => return Ok(RefreshOutcome::AlreadyRefreshing),
        };
        self.run_refresh(config).await
    }

    /// Drops the persisted file, metadata and memory entry for the series.
    pub async fn invalidate(&self, config: &SeriesConfig) -> Result<()> {
        self.store.clear(config).await?;
        self.memory.remove(&config.id);
        info!("Invalidated cached data for {}", config.id);
        Ok(())
    }

    // Check and insert happen under one lock so two readers cannot both start.
    fn begin_refresh(&self, series_id: &str) -> Option<InFlightGuard> {
        let mut in_flight = self.in_flight.lock();
        if !in_flight.insert(series_id.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            in_flight: self.in_flight.clone(),
            series_id: series_id.to_string(),
        })
    }

    async fn run_refresh(&self, config: &SeriesConfig) -> Result<RefreshOutcome> {
        match self.fetch_and_store(config).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!("Refresh failed for {}: {}", config.id, e);
                if let Err(record_err) = self.store.record_error(&config.id, &e.to_string()) {
                    error!("Failed to record refresh error for {}: {}", config.id, record_err);
                }
                Err(e)
            }
        }
    }

    async fn fetch_and_store(&self, config: &SeriesConfig) -> Result<RefreshOutcome> {
        let provider = self.providers.get(&config.provider)?;
        let incremental = provider.supports_incremental();
        let since = if incremental {
            self.store.last_data_date(&config.id)
        } else {
            None
        };

        info!("Refreshing {} from {}...", config.id, config.provider);
        let new_points = provider.fetch_series(&config.source_id, since).await?;

        if new_points.is_empty() {
            info!("No new data for {}", config.id);
            self.store.record_empty_fetch(config)?;
            return Ok(RefreshOutcome::NoNewData);
        }

        info!("Got {} new points for {}", new_points.len(), config.id);
        let total = if incremental {
            self.store.merge_append(config, &new_points).await?
        } else {
            self.store.rewrite(config, &new_points).await?
        };

        // full merged history, not just the delta
        self.memory.put(&config.id, self.store.read(config));

        Ok(RefreshOutcome::Updated {
            fetched: new_points.len(),
            total,
        })
    }
}
