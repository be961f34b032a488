// src/context.rs
use std::sync::Arc;

use anyhow::Result;

use crate::config::Settings;
use crate::services::cache_store::CacheStore;
use crate::services::memory_cache::MemoryCache;
use crate::services::providers::{FredProvider, ProviderRegistry};
use crate::services::refresh::RefreshCoordinator;
use crate::services::registry::{CustomSourceStore, JsonCustomSourceStore, SeriesRegistry};

pub const CUSTOM_SOURCES_FILE: &str = "custom-sources.json";

/// Process-wide state, built once at startup and handed to every handler.
pub struct AppContext {
    pub settings: Settings,
    pub registry: SeriesRegistry,
    pub coordinator: RefreshCoordinator,
    pub custom_sources: Arc<dyn CustomSourceStore>,
}

impl AppContext {
    pub fn new(settings: Settings) -> Result<Self> {
        let store = CacheStore::open(&settings.data_dir);
        let custom_sources: Arc<dyn CustomSourceStore> = Arc::new(JsonCustomSourceStore::open(
            settings.data_dir.join(CUSTOM_SOURCES_FILE),
        )?);
        let providers = ProviderRegistry::new().with_provider(Arc::new(FredProvider::new(
            settings.fred_api_key.clone(),
            settings.fred_api_url.clone(),
        )));
        Ok(Self::with_parts(settings, store, providers, custom_sources))
    }

    pub fn with_parts(
        settings: Settings,
        store: CacheStore,
        providers: ProviderRegistry,
        custom_sources: Arc<dyn CustomSourceStore>,
    ) -> Self {
        let coordinator = RefreshCoordinator::new(
            Arc::new(store),
            Arc::new(MemoryCache::default()),
            Arc::new(providers),
        );
        AppContext {
            settings,
            registry: SeriesRegistry::new(custom_sources.clone()),
            coordinator,
            custom_sources,
        }
    }
}
