// src/error.rs
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    /// Upstream unreachable, rate limited or misconfigured. Engages backoff.
    #[error("provider unavailable: {0}")]
    ProviderUnavailable(String),
    #[error("unknown provider: {0}")]
    ProviderNotFound(String),
    #[error("unknown series: {0}")]
    SeriesNotFound(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("cache metadata error: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("cache file error: {0}")]
    Csv(#[from] csv::Error),
    #[error("timed out waiting for lock {0:?}")]
    LockTimeout(PathBuf),
}

impl DataError {
    /// True for errors that mean "the caller asked for something that does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DataError::SeriesNotFound(_) | DataError::ProviderNotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
