// src/services/registry.rs
use crate::error::{DataError, Result};
use crate::models::{CustomSource, Frequency, SeriesConfig, SeriesSummary, ValidationStatus};
use async_trait::async_trait;
use log::{error, info};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

pub const CUSTOM_PREFIX: &str = "custom:";

pub fn extract_custom_uuid(series_id: &str) -> Option<&str> {
    series_id.strip_prefix(CUSTOM_PREFIX)
}

pub fn make_custom_chart_id(uuid: &str) -> String {
    format!("{}{}", CUSTOM_PREFIX, uuid)
}

struct BuiltinSeries {
    id: &'static str,
    source_id: &'static str,
    frequency: Frequency,
    title: &'static str,
    description: &'static str,
    unit: &'static str,
    value_column: &'static str,
}

const BUILTIN_SERIES: &[BuiltinSeries] = &[
    // Affordability
    BuiltinSeries {
        id: "mortgage_rates",
        source_id: "MORTGAGE30US",
        frequency: Frequency::Weekly,
        title: "30-Year Mortgage Rate",
        description: "Weekly average 30-year fixed mortgage rate",
        unit: "%",
        value_column: "rate",
    },
    BuiltinSeries {
        id: "interest_rates",
        source_id: "FEDFUNDS",
        frequency: Frequency::Monthly,
        title: "Federal Funds Rate",
        description: "Federal Reserve interest rate target",
        unit: "%",
        value_column: "rate",
    },
    BuiltinSeries {
        id: "housing_prices_case_shiller",
        source_id: "CSUSHPINSA",
        frequency: Frequency::Monthly,
        title: "Case-Shiller Home Prices",
        description: "S&P/Case-Shiller U.S. National Home Price Index",
        unit: "Index",
        value_column: "index",
    },
    BuiltinSeries {
        id: "housing_affordability",
        source_id: "FIXHAI",
        frequency: Frequency::Monthly,
        title: "Housing Affordability Index",
        description: "NAR Housing Affordability Index",
        unit: "Index",
        value_column: "index",
    },
    BuiltinSeries {
        id: "customs_duties",
        source_id: "B235RC1Q027SBEA",
        frequency: Frequency::Quarterly,
        title: "Customs Duties (Tariffs)",
        description: "Federal tariff revenue collections",
        unit: "B$",
        value_column: "receipts",
    },
    // Liquidity
    BuiltinSeries {
        id: "housing_starts",
        source_id: "HOUST",
        frequency: Frequency::Monthly,
        title: "Housing Starts",
        description: "Total new residential construction starts",
        unit: "K",
        value_column: "starts",
    },
    BuiltinSeries {
        id: "housing_starts_single_family",
        source_id: "HOUST1F",
        frequency: Frequency::Monthly,
        title: "Single-Family Starts",
        description: "Single-family residential construction starts",
        unit: "K",
        value_column: "starts",
    },
    BuiltinSeries {
        id: "building_permits",
        source_id: "PERMIT",
        frequency: Frequency::Monthly,
        title: "Building Permits",
        description: "New residential building permits issued",
        unit: "K",
        value_column: "permits",
    },
    BuiltinSeries {
        id: "existing_home_sales",
        source_id: "EXHOSLUSM495S",
        frequency: Frequency::Monthly,
        title: "Existing Home Sales",
        description: "Existing home sales volume",
        unit: "M",
        value_column: "sales",
    },
    // Consumer willingness
    BuiltinSeries {
        id: "unemployment_rate",
        source_id: "UNRATE",
        frequency: Frequency::Monthly,
        title: "Unemployment Rate",
        description: "U.S. national unemployment rate",
        unit: "%",
        value_column: "rate",
    },
    BuiltinSeries {
        id: "nonfarm_payrolls",
        source_id: "PAYEMS",
        frequency: Frequency::Monthly,
        title: "Nonfarm Payrolls",
        description: "Total nonfarm employment levels",
        unit: "K",
        value_column: "employment",
    },
    BuiltinSeries {
        id: "economic_policy_uncertainty",
        source_id: "USEPUINDXD",
        frequency: Frequency::Daily,
        title: "Economic Policy Uncertainty",
        description: "Economic Policy Uncertainty Index",
        unit: "Index",
        value_column: "index",
    },
    BuiltinSeries {
        id: "trade_policy_uncertainty",
        source_id: "EPUTRADE",
        frequency: Frequency::Monthly,
        title: "Trade Policy Uncertainty",
        description: "Trade Policy Uncertainty Index",
        unit: "Index",
        value_column: "index",
    },
    BuiltinSeries {
        id: "vix",
        source_id: "VIXCLS",
        frequency: Frequency::Daily,
        title: "VIX",
        description: "CBOE Volatility Index (market fear gauge)",
        unit: "Index",
        value_column: "vix",
    },
];

impl BuiltinSeries {
    fn to_config(&self) -> SeriesConfig {
        SeriesConfig {
            id: self.id.to_string(),
            provider: "fred".to_string(),
            source_id: self.source_id.to_string(),
            frequency: self.frequency,
            stale_after_hours: self.frequency.default_stale_after_hours(),
            cache_file: format!("fred/{}.csv", self.id),
            title: self.title.to_string(),
            description: self.description.to_string(),
            unit: self.unit.to_string(),
            value_column: self.value_column.to_string(),
        }
    }
}

pub fn builtin_series_config(series_id: &str) -> Option<SeriesConfig> {
    BUILTIN_SERIES
        .iter()
        .find(|s| s.id == series_id)
        .map(BuiltinSeries::to_config)
}

pub fn builtin_series() -> Vec<SeriesConfig> {
    BUILTIN_SERIES.iter().map(BuiltinSeries::to_config).collect()
}

pub fn custom_series_config(source: &CustomSource) -> SeriesConfig {
    SeriesConfig {
        id: make_custom_chart_id(&source.source_id),
        provider: source.provider.clone(),
        source_id: source.provider_source_id.clone(),
        frequency: source.frequency,
        stale_after_hours: source.stale_after_hours,
        cache_file: format!("custom/{}.csv", source.source_id),
        title: source.title.clone(),
        description: source.description.clone().unwrap_or_default(),
        unit: source.unit.clone(),
        value_column: "value".to_string(),
    }
}

/// Externally owned metadata for user-created sources, keyed by UUID.
#[async_trait]
pub trait CustomSourceStore: Send + Sync {
    async fn get_custom_source(&self, uuid: &str) -> Result<Option<CustomSource>>;
    async fn put_custom_source(&self, source: CustomSource) -> Result<()>;
}

/// `CustomSourceStore` kept in a single JSON file.
pub struct JsonCustomSourceStore {
    path: PathBuf,
    sources: RwLock<HashMap<String, CustomSource>>,
}

impl JsonCustomSourceStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let sources: Vec<CustomSource> = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        info!("Loaded {} custom sources from {:?}", sources.len(), path);
        Ok(JsonCustomSourceStore {
            path,
            sources: RwLock::new(
                sources
                    .into_iter()
                    .map(|s| (s.source_id.clone(), s))
                    .collect(),
            ),
        })
    }

    fn persist(&self, sources: &HashMap<String, CustomSource>) -> Result<()> {
        let mut all: Vec<&CustomSource> = sources.values().collect();
        all.sort_by(|a, b| a.source_id.cmp(&b.source_id));
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&all)?)?;
        Ok(())
    }
}

#[async_trait]
impl CustomSourceStore for JsonCustomSourceStore {
    async fn get_custom_source(&self, uuid: &str) -> Result<Option<CustomSource>> {
        Ok(self.sources.read().get(uuid).cloned())
    }

    async fn put_custom_source(&self, source: CustomSource) -> Result<()> {
        let mut sources = self.sources.write();
        sources.insert(source.source_id.clone(), source);
        self.persist(&sources)
    }
}

/// Resolves series ids to configurations: built-in table first, then
/// validated custom sources.
#[derive(Clone)]
pub struct SeriesRegistry {
    custom: Arc<dyn CustomSourceStore>,
}

impl SeriesRegistry {
    pub fn new(custom: Arc<dyn CustomSourceStore>) -> Self {
        SeriesRegistry { custom }
    }

    pub async fn get_series_config(&self, series_id: &str) -> Result<SeriesConfig> {
        let uuid = match extract_custom_uuid(series_id) {
            Some(uuid) => uuid,
            None => {
                return builtin_series_config(series_id)
                    .ok_or_else(|| DataError::SeriesNotFound(series_id.to_string()))
            }
        };

        match self.custom.get_custom_source(uuid).await {
            Ok(Some(source)) if source.validation_status == ValidationStatus::Valid => {
                Ok(custom_series_config(&source))
            }
            Ok(_) => Err(DataError::SeriesNotFound(series_id.to_string())),
            Err(e) => {
                error!("Error fetching custom source {}: {}", uuid, e);
                Err(DataError::SeriesNotFound(series_id.to_string()))
            }
        }
    }

    pub fn list_builtin(&self) -> Vec<SeriesSummary> {
        BUILTIN_SERIES
            .iter()
            .map(|s| SeriesSummary::from(&s.to_config()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const UUID: &str = "3f2b6a9e-1c44-4d1e-9a55-0b8f3c2d7e10";

    fn custom_source(uuid: &str, status: ValidationStatus) -> CustomSource {
        CustomSource {
            source_id: uuid.to_string(),
            provider: "fred".to_string(),
            provider_source_id: "DGS10".to_string(),
            title: "10-Year Treasury".to_string(),
            description: None,
            unit: "%".to_string(),
            provider_title: None,
            provider_units: None,
            provider_frequency: None,
            validation_status: status,
            last_validation_error: None,
            last_validated_at: None,
            frequency: Frequency::Daily,
            stale_after_hours: 6,
        }
    }

    fn registry(dir: &TempDir) -> (SeriesRegistry, Arc<JsonCustomSourceStore>) {
        let store = Arc::new(JsonCustomSourceStore::open(dir.path().join("custom-sources.json")).unwrap());
        (SeriesRegistry::new(store.clone()), store)
    }

    #[test]
    fn custom_ids_round_trip() {
        let id = make_custom_chart_id(UUID);
        assert_eq!(extract_custom_uuid(&id), Some(UUID));
        assert_eq!(extract_custom_uuid("vix"), None);
    }

    #[tokio::test]
    async fn resolves_builtin_series() {
        let dir = TempDir::new().unwrap();
        let (registry, _) = registry(&dir);

        let config = registry.get_series_config("mortgage_rates").await.unwrap();
        assert_eq!(config.source_id, "MORTGAGE30US");
        assert_eq!(config.provider, "fred");
        assert_eq!(config.cache_file, "fred/mortgage_rates.csv");
        assert_eq!(config.value_column, "rate");
        assert_eq!(config.stale_after_hours, 24);

        assert_eq!(registry.list_builtin().len(), 14);
        assert!(matches!(
            registry.get_series_config("bitcoin").await,
            Err(DataError::SeriesNotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_valid_custom_sources_resolve() {
        let dir = TempDir::new().unwrap();
        let (registry, store) = registry(&dir);
        let id = make_custom_chart_id(UUID);

        assert!(registry.get_series_config(&id).await.is_err());

        store
            .put_custom_source(custom_source(UUID, ValidationStatus::Pending))
            .await
            .unwrap();
        assert!(registry.get_series_config(&id).await.is_err());

        store
            .put_custom_source(custom_source(UUID, ValidationStatus::Valid))
            .await
            .unwrap();
        let config = registry.get_series_config(&id).await.unwrap();
        assert_eq!(config.id, id);
        assert_eq!(config.source_id, "DGS10");
        assert_eq!(config.cache_file, format!("custom/{}.csv", UUID));
        assert_eq!(config.value_column, "value");
        assert_eq!(config.stale_after_hours, 6);
    }

    #[tokio::test]
    async fn json_store_persists_sources() {
        let dir = TempDir::new().unwrap();
        {
            let (_, store) = registry(&dir);
            store
                .put_custom_source(custom_source(UUID, ValidationStatus::Valid))
                .await
                .unwrap();
        }
        let (_, store) = registry(&dir);
        assert_eq!(
            store.get_custom_source(UUID).await.unwrap(),
            Some(custom_source(UUID, ValidationStatus::Valid))
        );
    }
}
