// src/handlers/data.rs
use super::error::{reject, ApiError};
use crate::context::AppContext;
use crate::models::SeriesData;
use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

#[derive(Debug, Default, Deserialize)]
pub struct DataQuery {
    /// One id or a comma-separated list.
    pub series: Option<String>,
    /// Overrides the configured floor date.
    pub from: Option<String>,
}

#[derive(Debug, Serialize)]
struct MultiSeriesResponse {
    results: BTreeMap<String, SeriesData>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<String>,
}

pub async fn get_data(query: DataQuery, ctx: Arc<AppContext>) -> Result<Json, Rejection> {
    let min_date = match query.from.as_deref() {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|_| reject(ApiError::bad_request(format!("invalid from date: {}", raw))))?,
        None => ctx.settings.min_date,
    };

    let series_ids: Vec<&str> = query
        .series
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect();

    if series_ids.is_empty() {
        debug!("No series requested, listing built-in series");
        return Ok(warp::reply::json(&json!({
            "series": ctx.registry.list_builtin(),
        })));
    }

    if let [series_id] = series_ids.as_slice() {
        info!("Handling request for series {}", series_id);
        let config = ctx.registry.get_series_config(series_id).await.map_err(|e| {
            warn!("Rejecting request for {}: {}", series_id, e);
            reject(e)
        })?;
        let data = ctx.coordinator.get_series_data(&config, min_date);
        return Ok(warp::reply::json(&data));
    }

    info!("Handling request for {} series", series_ids.len());
    let mut response = MultiSeriesResponse {
        results: BTreeMap::new(),
        errors: Vec::new(),
    };
    for series_id in series_ids {
        match ctx.registry.get_series_config(series_id).await {
            Ok(config) => {
                let data = ctx.coordinator.get_series_data(&config, min_date);
                response.results.insert(series_id.to_string(), data);
            }
            Err(e) => response.errors.push(e.to_string()),
        }
    }
    Ok(warp::reply::json(&response))
}
