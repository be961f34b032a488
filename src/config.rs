// src/config.rs
use anyhow::{Context, Result};
use chrono::NaiveDate;
use log::{info, warn};
use std::env;
use std::path::PathBuf;

use crate::services::providers::fred::DEFAULT_BASE_URL;

#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub data_dir: PathBuf,
    pub fred_api_key: Option<String>,
    pub fred_api_url: String,
    /// Floor applied to every read-path response.
    pub min_date: NaiveDate,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            port: 3030,
            data_dir: PathBuf::from("data"),
            fred_api_key: None,
            fred_api_url: DEFAULT_BASE_URL.to_string(),
            min_date: NaiveDate::from_ymd_opt(2015, 1, 1).unwrap_or_default(),
        }
    }
}

impl Settings {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();

        let port = match lookup("PORT") {
            Some(port) => port.parse().context("PORT must be a number")?,
            None => {
                warn!("$PORT not set, defaulting to {}", defaults.port);
                defaults.port
            }
        };

        let min_date = match lookup("MIN_DATE") {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .with_context(|| format!("MIN_DATE must be YYYY-MM-DD, got {:?}", raw))?,
            None => defaults.min_date,
        };

        let fred_api_key = lookup("FRED_API_KEY").filter(|k| !k.trim().is_empty());
        if fred_api_key.is_none() {
            warn!("FRED_API_KEY not set, FRED refreshes will fail and back off");
        }

        let settings = Settings {
            port,
            data_dir: lookup("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            fred_api_key,
            fred_api_url: lookup("FRED_API_URL").unwrap_or(defaults.fred_api_url),
            min_date,
        };
        info!(
            "Using data dir {:?}, FRED at {}, min date {}",
            settings.data_dir, settings.fred_api_url, settings.min_date
        );
        Ok(settings)
    }
}
