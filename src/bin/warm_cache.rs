// src/bin/warm_cache.rs
//! Refreshes every built-in series once, ignoring staleness and backoff.
use anyhow::Result;
use log::{error, info};

use macro_dashboard_series::config::Settings;
use macro_dashboard_series::context::AppContext;
use macro_dashboard_series::services::refresh::RefreshOutcome;
use macro_dashboard_series::services::registry::builtin_series;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let settings = Settings::from_env()?;
    let ctx = AppContext::new(settings)?;

    let mut failures = 0;
    for config in builtin_series() {
        match ctx.coordinator.refresh_now(&config).await {
            Ok(RefreshOutcome::Updated { fetched, total }) => {
                info!("{}: {} new points, {} total", config.id, fetched, total)
            }
            Ok(RefreshOutcome::NoNewData) => info!("{}: up to date", config.id),
            Ok(RefreshOutcome::AlreadyRefreshing) => info!("{}: already refreshing", config.id),
            Err(e) => {
                error!("{}: {}", config.id, e);
                failures += 1;
            }
        }
    }

    println!("Cache warm complete, {} failures", failures);
    if failures > 0 {
        anyhow::bail!("{} series failed to refresh", failures);
    }
    Ok(())
}
