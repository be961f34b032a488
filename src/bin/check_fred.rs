// src/bin/check_fred.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;

use macro_dashboard_series::config::Settings;
use macro_dashboard_series::services::providers::{DataProvider, FredProvider};

/// Usage: check_fred <SERIES_ID> [SINCE]
#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let mut args = std::env::args().skip(1);
    let series_id = args.next().context("usage: check_fred <SERIES_ID> [YYYY-MM-DD]")?;
    let since = args
        .next()
        .map(|raw| NaiveDate::parse_from_str(&raw, "%Y-%m-%d"))
        .transpose()
        .context("SINCE must be YYYY-MM-DD")?;

    let settings = Settings::from_env()?;
    let provider = FredProvider::new(settings.fred_api_key, settings.fred_api_url);

    match provider.describe_series(&series_id).await? {
        Some(info) => println!(
            "{}: {} ({}, {})",
            series_id, info.title, info.frequency, info.units
        ),
        None => println!("{}: not found on FRED", series_id),
    }

    let points = provider.fetch_series(&series_id, since).await?;
    println!("Observations:        {}", points.len());
    if let Some(last) = points.last() {
        println!("Latest observation:  {} = {}", last.date, last.value);
    }
    Ok(())
}
