// src/services/providers/fred.rs
use super::DataProvider;
use crate::error::{DataError, Result};
use crate::models::{normalize_date, DataPoint, ProviderSeriesInfo};
use async_trait::async_trait;
use chrono::NaiveDate;
use log::{debug, info};
use reqwest::{Client, StatusCode};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.stlouisfed.org/fred";

/// First observation requested when no history is cached.
const FULL_HISTORY_START: &str = "2015-01-01";

#[derive(Debug, Deserialize)]
struct ObservationsResponse {
    #[serde(default)]
    observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct Observation {
    date: String,
    value: String,
}

#[derive(Debug, Deserialize)]
struct SeriesResponse {
    #[serde(default)]
    seriess: Vec<FredSeries>,
}

#[derive(Debug, Deserialize)]
struct FredSeries {
    title: String,
    frequency: String,
    units: String,
}

pub struct FredProvider {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl FredProvider {
    pub fn new(api_key: Option<String>, base_url: impl Into<String>) -> Self {
        FredProvider {
            client: Client::new(),
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| DataError::ProviderUnavailable("FRED_API_KEY is not set".to_string()))
    }
}

fn unavailable(e: reqwest::Error) -> DataError {
    DataError::ProviderUnavailable(format!("FRED API request failed: {}", e))
}

fn status_error(status: StatusCode) -> DataError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        DataError::ProviderUnavailable("FRED API rate limit exceeded".to_string())
    } else {
        DataError::ProviderUnavailable(format!("FRED API error: {}", status))
    }
}

#[async_trait]
impl DataProvider for FredProvider {
    fn name(&self) -> &str {
        "fred"
    }

    fn supports_incremental(&self) -> bool {
        true
    }

    async fn fetch_series(
        &self,
        source_id: &str,
        since: Option<NaiveDate>,
    ) -> Result<Vec<DataPoint>> {
        let api_key = self.api_key()?;

        // The day after the last known observation, so it is not fetched again.
        let start = match since.and_then(|d| d.succ_opt()) {
            Some(day) => day.format("%Y-%m-%d").to_string(),
            None => FULL_HISTORY_START.to_string(),
        };
        let url = format!("{}/series/observations", self.base_url);
        info!("Fetching FRED series {} from {}", source_id, start);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&[
                ("series_id", source_id),
                ("api_key", api_key),
                ("file_type", "json"),
                ("observation_start", start.as_str()),
            ])
            .send()
            .await
            .map_err(unavailable)?;

        if !response.status().is_success() {
            return Err(status_error(response.status()));
        }

        let body: ObservationsResponse = response.json().await.map_err(unavailable)?;

        // FRED marks missing observations with "."
        let points: Vec<DataPoint> = body
            .observations
            .into_iter()
            .filter(|obs| obs.value != "." && !obs.value.is_empty())
            .filter_map(|obs| {
                let date = normalize_date(&obs.date)?;
                let value = obs.value.trim().parse::<f64>().ok()?;
                value.is_finite().then(|| DataPoint::new(date, value))
            })
            .collect();

        debug!("FRED returned {} usable observations for {}", points.len(), source_id);
        Ok(points)
    }

    async fn describe_series(&self, source_id: &str) -> Result<Option<ProviderSeriesInfo>> {
        let api_key = self.api_key()?;
        let url = format!("{}/series", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .query(&[
                ("series_id", source_id),
                ("api_key", api_key),
                ("file_type", "json"),
            ])
            .send()
            .await
            .map_err(unavailable)?;

        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => return Err(status_error(status)),
            _ => {}
        }

        let body: SeriesResponse = response.json().await.map_err(unavailable)?;
        Ok(body.seriess.into_iter().next().map(|s| ProviderSeriesInfo {
            title: s.title,
            frequency: s.frequency,
            units: s.units,
        }))
    }
}
