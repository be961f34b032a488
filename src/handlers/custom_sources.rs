// src/handlers/custom_sources.rs
use super::error::{reject, ApiError};
use crate::context::AppContext;
use crate::models::ValidationStatus;
use crate::services::registry::custom_series_config;
use chrono::Utc;
use log::{error, info};
use serde_json::json;
use std::sync::Arc;
use warp::reply::Json;
use warp::Rejection;

/// Re-validates a custom source against its provider and clears its cache,
/// so the next read refetches full history.
pub async fn refresh_custom_source(uuid: String, ctx: Arc<AppContext>) -> Result<Json, Rejection> {
    info!("Handling refresh of custom source {}", uuid);

    let mut source = ctx
        .custom_sources
        .get_custom_source(&uuid)
        .await
        .map_err(|e| {
            error!("Failed to load custom source {}: {}", uuid, e);
            reject(e)
        })?
        .ok_or_else(|| reject(ApiError::not_found("Custom source not found")))?;

    let provider = ctx
        .coordinator
        .providers()
        .get(&source.provider)
        .map_err(reject)?;

    match provider.describe_series(&source.provider_source_id).await {
        Ok(Some(info)) => {
            source.provider_title = Some(info.title);
            source.provider_units = Some(info.units);
            source.provider_frequency = Some(info.frequency);
            source.validation_status = ValidationStatus::Valid;
            source.last_validation_error = None;
        }
        Ok(None) => {
            source.validation_status = ValidationStatus::Invalid;
            source.last_validation_error =
                Some(format!("Series not found: {}", source.provider_source_id));
        }
        Err(e) => {
            error!("Validation of {} failed: {}", source.provider_source_id, e);
            return Err(reject(e));
        }
    }
    source.last_validated_at = Some(Utc::now());

    ctx.custom_sources
        .put_custom_source(source.clone())
        .await
        .map_err(reject)?;

    ctx.coordinator
        .invalidate(&custom_series_config(&source))
        .await
        .map_err(|e| {
            error!("Failed to clear cache for custom source {}: {}", uuid, e);
            reject(e)
        })?;

    Ok(warp::reply::json(&json!({
        "success": true,
        "source": source,
    })))
}
