// src/models.rs
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One observation. Dates are calendar days, already normalized to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl DataPoint {
    pub fn new(date: NaiveDate, value: f64) -> Self {
        DataPoint { date, value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl Frequency {
    /// Staleness threshold used when a series does not carry its own.
    pub fn default_stale_after_hours(self) -> u32 {
        match self {
            Frequency::Daily => 12,
            Frequency::Weekly => 24,
            Frequency::Monthly => 24,
            Frequency::Quarterly => 72,
        }
    }
}

/// Everything needed to fetch, persist and describe one logical series.
/// Built per request, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesConfig {
    pub id: String,
    pub provider: String,
    pub source_id: String,
    pub frequency: Frequency,
    pub stale_after_hours: u32,
    /// Relative to the data directory.
    pub cache_file: String,
    pub title: String,
    pub description: String,
    pub unit: String,
    pub value_column: String,
}

/// Per-series fetch state persisted in the shared metadata file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesCacheMeta {
    #[serde(default)]
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_fetched: Option<DateTime<Utc>>,
    #[serde(
        default,
        with = "optional_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_data_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_until: Option<DateTime<Utc>>,
    /// Length of the current backoff window, doubled on each consecutive failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backoff_seconds: Option<i64>,
}

impl SeriesCacheMeta {
    pub fn clear_error(&mut self) {
        self.last_error = None;
        self.backoff_until = None;
        self.backoff_seconds = None;
    }
}

pub type CacheMeta = BTreeMap<String, SeriesCacheMeta>;

/// Read-path response for one series.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesData {
    pub series: String,
    pub meta: SeriesDataMeta,
    pub data: Vec<DataPoint>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesDataMeta {
    pub id: String,
    pub title: String,
    pub description: String,
    pub unit: String,
    pub provider: String,
    pub frequency: Frequency,
    pub last_fetched: Option<DateTime<Utc>>,
    pub last_data_date: Option<NaiveDate>,
    pub is_refreshing: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub provider: String,
    pub frequency: Frequency,
}

impl From<&SeriesConfig> for SeriesSummary {
    fn from(config: &SeriesConfig) -> Self {
        SeriesSummary {
            id: config.id.clone(),
            title: config.title.clone(),
            description: config.description.clone(),
            provider: config.provider.clone(),
            frequency: config.frequency,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Pending,
    Valid,
    Invalid,
}

/// A user-created series backed by a provider series id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSource {
    pub source_id: String,
    pub provider: String,
    pub provider_source_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub unit: String,
    #[serde(default)]
    pub provider_title: Option<String>,
    #[serde(default)]
    pub provider_units: Option<String>,
    #[serde(default)]
    pub provider_frequency: Option<String>,
    pub validation_status: ValidationStatus,
    #[serde(default)]
    pub last_validation_error: Option<String>,
    #[serde(default)]
    pub last_validated_at: Option<DateTime<Utc>>,
    pub frequency: Frequency,
    pub stale_after_hours: u32,
}

/// Series description as reported by a provider during validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSeriesInfo {
    pub title: String,
    pub frequency: String,
    pub units: String,
}

/// Parses a date or timestamp into the UTC calendar day it falls on.
pub fn normalize_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc).date_naive());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

// Older metadata files store a missing last data date as "".
mod optional_date {
    use super::normalize_date;
    use chrono::NaiveDate;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => s.serialize_str(&d.format("%Y-%m-%d").to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => normalize_date(s)
                .map(Some)
                .ok_or_else(|| de::Error::custom(format!("invalid date: {}", s))),
        }
    }
}
