// src/services/providers/mod.rs
use crate::error::{DataError, Result};
use crate::models::{DataPoint, ProviderSeriesInfo};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;

pub mod fred;

pub use fred::FredProvider;

/// An upstream source of observations.
#[async_trait]
pub trait DataProvider: Send + Sync {
    fn name(&self) -> &str;

    /// When false, callers always fetch full history and rewrite the cache.
    fn supports_incremental(&self) -> bool;

    /// Fetches observations for `source_id`, only those after `since` when given.
    /// No new data is an empty list, not an error.
    async fn fetch_series(
        &self,
        source_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<DataPoint>>;

    /// Looks the series up upstream. `Ok(None)` means the provider does not know it.
    async fn describe_series(&self, source_id: &str) -> Result<Option<ProviderSeriesInfo>>;
}

#[derive(Default, Clone)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn DataProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_provider(mut self, provider: Arc<dyn DataProvider>) -> Self {
        self.register(provider);
        self
    }

    pub fn register(&mut self, provider: Arc<dyn DataProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    pub fn get(&self, name: &str) -> Result<Arc<dyn DataProvider>> {
        self.providers
            .get(name)
            .cloned()
            .ok_or_else(|| DataError::ProviderNotFound(name.to_string()))
    }
}
