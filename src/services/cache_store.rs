// src/services/cache_store.rs
//! Flat-file persistence for series history plus the shared fetch metadata.
//!
//! Each series lives in its own CSV file (`,<value column>` header, then
//! `YYYY-MM-DD,<value>` rows). Writes replace the whole file atomically under
//! the per-file lock, so readers never need the lock. Fetch state for every
//! series lives in `cache-meta.json` next to the data.

use crate::error::{DataError, Result};
use crate::models::{normalize_date, CacheMeta, DataPoint, SeriesCacheMeta, SeriesConfig};
use crate::services::file_lock::{self, LockOptions};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use log::{debug, info, warn};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

pub const METADATA_FILE: &str = "cache-meta.json";

const BASE_BACKOFF_SECS: i64 = 60;
const MAX_BACKOFF_SECS: i64 = 60 * 60;

pub struct CacheStore {
    data_dir: PathBuf,
    lock_options: LockOptions,
    meta: Mutex<CacheMeta>,
}

impl CacheStore {
    /// Opens the store rooted at `data_dir`, loading existing metadata if any.
    pub fn open(data_dir: impl Into<PathBuf>) -> Self {
        let data_dir = data_dir.into();
        let meta = load_meta(&data_dir.join(METADATA_FILE));
        info!(
            "Opened series cache at {:?} ({} series with metadata)",
            data_dir,
            meta.len()
        );
        CacheStore {
            data_dir,
            lock_options: LockOptions::default(),
            meta: Mutex::new(meta),
        }
    }

    pub fn cache_path(&self, config: &SeriesConfig) -> PathBuf {
        self.data_dir.join(&config.cache_file)
    }

    /// Loads the series file. Missing or unreadable files yield an empty
    /// list; bad rows are skipped individually.
    pub fn read(&self, config: &SeriesConfig) -> Vec<DataPoint> {
        self.load(config).unwrap_or_else(|e| {
            warn!("Failed to read cache file for {}: {}", config.id, e);
            Vec::new()
        })
    }

    // Only a missing file counts as empty. The write path must not merge
    // against a file it failed to read.
    fn load(&self, config: &SeriesConfig) -> Result<Vec<DataPoint>> {
        let path = self.cache_path(config);
        match std::fs::read(&path) {
            Ok(bytes) => Ok(decode_series(&bytes, &config.value_column)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No cache file for {} at {:?}", config.id, path);
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Merges `new_points` into the persisted series, incoming values winning
    /// on date collisions. Returns the number of points now stored.
    pub async fn merge_append(
        &self,
        config: &SeriesConfig,
        new_points: &[DataPoint],
    ) -> Result<usize> {
        let path = self.cache_path(config);
        let _guard = file_lock::acquire(&path, self.lock_options).await?;

        let existing = self.load(config)?;
        let merged = merge_points(&existing, new_points);
        write_series(&path, &merged, &config.value_column)?;
        self.record_success(config, merged.last().map(|p| p.date))?;

        debug!(
            "Merged {} points into {} ({} -> {})",
            new_points.len(),
            config.id,
            existing.len(),
            merged.len()
        );
        Ok(merged.len())
    }

    /// Replaces the persisted series with `all_points`.
    pub async fn rewrite(
        &self,
        config: &SeriesConfig,
        all_points: &[DataPoint],
    ) -> Result<usize> {
        let path = self.cache_path(config);
        let _guard = file_lock::acquire(&path, self.lock_options).await?;

        let points = merge_points(&[], all_points);
        write_series(&path, &points, &config.value_column)?;
        self.record_success(config, points.last().map(|p| p.date))?;
        Ok(points.len())
    }

    /// Deletes the series file and its metadata entry.
    pub async fn clear(&self, config: &SeriesConfig) -> Result<()> {
        let path = self.cache_path(config);
        let _guard = file_lock::acquire(&path, self.lock_options).await?;

        match std::fs::remove_file(&path) {
            Ok(()) => info!("Removed cache file for {}", config.id),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut meta = self.meta.lock();
        if meta.remove(&config.id).is_some() {
            save_meta(&self.meta_path(), &meta)?;
        }
        Ok(())
    }

    pub fn series_meta(&self, series_id: &str) -> Option<SeriesCacheMeta> {
        self.meta.lock().get(series_id).cloned()
    }

    /// Applies `f` to the series' metadata entry (created if absent) and persists it.
    pub fn update_meta<F>(&self, series_id: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut SeriesCacheMeta),
    {
        let mut meta = self.meta.lock();
        f(meta.entry(series_id.to_string()).or_default());
        save_meta(&self.meta_path(), &meta)
    }

    pub fn needs_refresh(&self, config: &SeriesConfig) -> bool {
        self.needs_refresh_at(config, Utc::now())
    }

    pub fn needs_refresh_at(&self, config: &SeriesConfig, now: DateTime<Utc>) -> bool {
        match self.series_meta(&config.id).and_then(|m| m.last_fetched) {
            None => true,
            Some(last_fetched) => {
                now - last_fetched > Duration::hours(i64::from(config.stale_after_hours))
            }
        }
    }

    pub fn should_backoff(&self, series_id: &str) -> bool {
        self.should_backoff_at(series_id, Utc::now())
    }

    pub fn should_backoff_at(&self, series_id: &str, now: DateTime<Utc>) -> bool {
        self.series_meta(series_id)
            .and_then(|m| m.backoff_until)
            .map_or(false, |until| until > now)
    }

    pub fn record_error(&self, series_id: &str, message: &str) -> Result<()> {
        self.record_error_at(series_id, message, Utc::now())
    }

    /// Stores the failure and pushes `backoffUntil` out: one minute after the
    /// first failure, doubling on each consecutive one, capped at an hour.
    pub fn record_error_at(
        &self,
        series_id: &str,
        message: &str,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.update_meta(series_id, |meta| {
            let delay = match meta.backoff_seconds {
                Some(previous) => previous
                    .saturating_mul(2)
                    .clamp(BASE_BACKOFF_SECS, MAX_BACKOFF_SECS),
                None => BASE_BACKOFF_SECS,
            };
            meta.last_error = Some(message.to_string());
            meta.backoff_seconds = Some(delay);
            meta.backoff_until = Some(now + Duration::seconds(delay));
        })
    }

    /// Marks a fetch that returned nothing new: `lastFetched` moves, `lastDataDate` stays.
    pub fn record_empty_fetch(&self, config: &SeriesConfig) -> Result<()> {
        self.record_success(config, None)
    }

    pub fn last_data_date(&self, series_id: &str) -> Option<NaiveDate> {
        self.series_meta(series_id).and_then(|m| m.last_data_date)
    }

    fn record_success(
        &self,
        config: &SeriesConfig,
        last_data_date: Option<NaiveDate>,
    ) -> Result<()> {
        self.update_meta(&config.id, |meta| {
            meta.provider = config.provider.clone();
            meta.last_fetched = Some(Utc::now());
            if let Some(date) = last_data_date {
                meta.last_data_date = Some(date);
            }
            meta.clear_error();
        })
    }

    fn meta_path(&self) -> PathBuf {
        self.data_dir.join(METADATA_FILE)
    }
}

/// Union of both sets keyed by date, sorted ascending; `incoming` wins ties.
pub fn merge_points(existing: &[DataPoint], incoming: &[DataPoint]) -> Vec<DataPoint> {
    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for point in existing.iter().chain(incoming) {
        by_date.insert(point.date, point.value);
    }
    by_date
        .into_iter()
        .map(|(date, value)| DataPoint::new(date, value))
        .collect()
}

/// Decodes a series file row by row. Rows are split on newlines only and
/// fields decoded lossily, so one bad row never hides the rows after it.
pub fn decode_series(
    content: &[u8],
    value_column: &str,
) -> std::result::Result<Vec<DataPoint>, csv::Error> {
    if content.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .quoting(false)
        .from_reader(content);

    let headers = rdr.byte_headers()?.clone();
    let value_idx = match headers
        .iter()
        .position(|h| String::from_utf8_lossy(h).trim() == value_column)
    {
        Some(idx) => idx,
        None => {
            warn!(
                "Column \"{}\" not found in headers: {:?}",
                value_column, headers
            );
            return Ok(Vec::new());
        }
    };

    let mut rows = Vec::new();
    for record in rdr.byte_records() {
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                debug!("Skipping malformed row: {}", e);
                continue;
            }
        };
        let date = row
            .get(0)
            .and_then(|d| normalize_date(&String::from_utf8_lossy(d)));
        let value = row
            .get(value_idx)
            .and_then(|v| String::from_utf8_lossy(v).trim().parse::<f64>().ok())
            .filter(|v| v.is_finite());
        if let (Some(date), Some(value)) = (date, value) {
            rows.push(DataPoint::new(date, value));
        }
    }

    // Hand-edited files may be unsorted or repeat a date; the later row wins.
    Ok(merge_points(&[], &rows))
}

pub fn encode_series(points: &[DataPoint], value_column: &str) -> Result<Vec<u8>> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(["", value_column])?;
    for point in points {
        wtr.write_record([
            point.date.format("%Y-%m-%d").to_string(),
            point.value.to_string(),
        ])?;
    }
    wtr.into_inner()
        .map_err(|e| DataError::Storage(e.into_error()))
}

fn write_series(path: &Path, points: &[DataPoint], value_column: &str) -> Result<()> {
    let bytes = encode_series(points, value_column)?;
    write_atomic(path, &bytes)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn load_meta(path: &Path) -> CacheMeta {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return CacheMeta::new(),
        Err(e) => {
            warn!("Failed to load cache meta: {}", e);
            return CacheMeta::new();
        }
    };
    serde_json::from_str(&content).unwrap_or_else(|e| {
        warn!("Failed to parse cache meta {:?}: {}", path, e);
        CacheMeta::new()
    })
}

fn save_meta(path: &Path, meta: &CacheMeta) -> Result<()> {
    let json = serde_json::to_string_pretty(meta)?;
    write_atomic(path, json.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn config(id: &str) -> SeriesConfig {
        SeriesConfig {
            id: id.to_string(),
            provider: "fred".to_string(),
            source_id: id.to_uppercase(),
            frequency: Frequency::Weekly,
            stale_after_hours: 24,
            cache_file: format!("fred/{}.csv", id),
            title: id.to_string(),
            description: String::new(),
            unit: "%".to_string(),
            value_column: "rate".to_string(),
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn p(d: &str, value: f64) -> DataPoint {
        DataPoint::new(date(d), value)
    }

    #[test]
    fn read_of_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        assert!(store.read(&config("mortgage_rates")).is_empty());
    }

    #[test]
    fn read_skips_bad_rows_and_sorts() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("mortgage_rates");
        std::fs::create_dir_all(dir.path().join("fred")).unwrap();
        std::fs::write(
            store.cache_path(&cfg),
            ",rate\n2024-03-01,3.5\nnot-a-date,1\n2024-01-01,abc\n2024-02-01,2.5\n2024-01-01,1.0\n2024-04-01\n",
        )
        .unwrap();

        assert_eq!(
            store.read(&cfg),
            vec![p("2024-01-01", 1.0), p("2024-02-01", 2.5), p("2024-03-01", 3.5)]
        );
    }

    #[test]
    fn read_with_unknown_value_column_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("mortgage_rates");
        std::fs::create_dir_all(dir.path().join("fred")).unwrap();
        std::fs::write(store.cache_path(&cfg), ",index\n2024-01-01,1.0\n").unwrap();
        assert!(store.read(&cfg).is_empty());
    }

    #[tokio::test]
    async fn writes_the_flat_file_format() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("mortgage_rates");

        store
            .merge_append(&cfg, &[p("2024-01-08", 6.25), p("2024-01-01", 5.0)])
            .await
            .unwrap();

        let content = std::fs::read_to_string(store.cache_path(&cfg)).unwrap();
        assert_eq!(content, ",rate\n2024-01-01,5\n2024-01-08,6.25\n");
        assert!(!file_lock::lock_path_for(&store.cache_path(&cfg)).exists());
    }

    #[tokio::test]
    async fn merge_append_last_write_wins() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("interest_rates");

        store.merge_append(&cfg, &[p("2024-01-01", 5.0)]).await.unwrap();
        store.merge_append(&cfg, &[p("2024-01-01", 7.0)]).await.unwrap();

        assert_eq!(store.read(&cfg), vec![p("2024-01-01", 7.0)]);
    }

    #[tokio::test]
    async fn merge_append_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("unemployment_rate");
        let points = vec![p("2024-01-01", 3.7), p("2024-02-01", 3.9), p("2024-03-01", 3.8)];

        store.merge_append(&cfg, &points).await.unwrap();
        let once = std::fs::read(store.cache_path(&cfg)).unwrap();
        store.merge_append(&cfg, &points).await.unwrap();
        let twice = std::fs::read(store.cache_path(&cfg)).unwrap();

        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn merge_append_updates_metadata_and_clears_errors() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("vix");

        store.record_error(&cfg.id, "FRED API rate limit exceeded").unwrap();
        assert!(store.should_backoff(&cfg.id));

        store
            .merge_append(&cfg, &[p("2024-05-30", 12.0), p("2024-05-31", 12.9)])
            .await
            .unwrap();

        let meta = store.series_meta(&cfg.id).unwrap();
        assert_eq!(meta.provider, "fred");
        assert_eq!(meta.last_data_date, Some(date("2024-05-31")));
        assert!(meta.last_fetched.is_some());
        assert_eq!(meta.last_error, None);
        assert_eq!(meta.backoff_until, None);
        assert!(!store.should_backoff(&cfg.id));
    }

    #[tokio::test]
    async fn rewrite_replaces_everything() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("housing_starts");

        store
            .merge_append(&cfg, &[p("2023-01-01", 1.0), p("2023-02-01", 2.0)])
            .await
            .unwrap();
        store
            .rewrite(&cfg, &[p("2024-02-01", 4.0), p("2024-01-01", 3.0)])
            .await
            .unwrap();

        assert_eq!(store.read(&cfg), vec![p("2024-01-01", 3.0), p("2024-02-01", 4.0)]);
        assert_eq!(store.last_data_date(&cfg.id), Some(date("2024-02-01")));
    }

    #[tokio::test]
    async fn needs_refresh_follows_last_fetch() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("building_permits");

        assert!(store.needs_refresh(&cfg));

        store.merge_append(&cfg, &[p("2024-01-01", 1.5)]).await.unwrap();
        assert!(!store.needs_refresh(&cfg));

        let now = Utc::now();
        store
            .update_meta(&cfg.id, |m| m.last_fetched = Some(now - Duration::hours(25)))
            .unwrap();
        assert!(store.needs_refresh_at(&cfg, now));

        store
            .update_meta(&cfg.id, |m| m.last_fetched = Some(now - Duration::hours(23)))
            .unwrap();
        assert!(!store.needs_refresh_at(&cfg, now));
    }

    #[test]
    fn backoff_window_elapses() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let now = Utc::now();

        assert!(!store.should_backoff_at("vix", now));
        store.record_error_at("vix", "boom", now).unwrap();
        assert!(store.should_backoff_at("vix", now));
        assert!(store.should_backoff_at("vix", now + Duration::seconds(59)));
        assert!(!store.should_backoff_at("vix", now + Duration::seconds(61)));
    }

    #[test]
    fn backoff_doubles_and_caps_at_an_hour() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let mut now = Utc::now();
        let mut delays = Vec::new();

        for _ in 0..9 {
            store.record_error_at("vix", "boom", now).unwrap();
            let meta = store.series_meta("vix").unwrap();
            let until = meta.backoff_until.unwrap();
            delays.push((until - now).num_seconds());
            // next attempt happens once the window has passed
            now = until + Duration::seconds(1);
        }

        assert_eq!(delays, vec![60, 120, 240, 480, 960, 1920, 3600, 3600, 3600]);
        assert_eq!(store.series_meta("vix").unwrap().last_error.as_deref(), Some("boom"));
    }

    #[tokio::test]
    async fn empty_fetch_moves_last_fetched_only() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("nonfarm_payrolls");
        let earlier = Utc::now() - Duration::hours(30);

        store.merge_append(&cfg, &[p("2024-05-01", 158000.0)]).await.unwrap();
        store.update_meta(&cfg.id, |m| m.last_fetched = Some(earlier)).unwrap();
        store.record_empty_fetch(&cfg).unwrap();

        let meta = store.series_meta(&cfg.id).unwrap();
        assert!(meta.last_fetched.unwrap() > earlier);
        assert_eq!(meta.last_data_date, Some(date("2024-05-01")));
    }

    #[tokio::test]
    async fn metadata_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let cfg = config("vix");
        {
            let store = CacheStore::open(dir.path());
            store.merge_append(&cfg, &[p("2024-05-31", 12.9)]).await.unwrap();
        }
        let store = CacheStore::open(dir.path());
        assert!(!store.needs_refresh(&cfg));
        assert_eq!(store.last_data_date(&cfg.id), Some(date("2024-05-31")));
        assert_eq!(store.read(&cfg), vec![p("2024-05-31", 12.9)]);
    }

    #[tokio::test]
    async fn clear_removes_file_and_metadata() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("vix");

        store.merge_append(&cfg, &[p("2024-05-31", 12.9)]).await.unwrap();
        store.clear(&cfg).await.unwrap();

        assert!(!store.cache_path(&cfg).exists());
        assert_eq!(store.series_meta(&cfg.id), None);
        assert!(store.needs_refresh(&cfg));
        // clearing twice is fine
        store.clear(&cfg).await.unwrap();
    }

    #[test]
    fn invalid_utf8_only_loses_its_row() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("mortgage_rates");
        std::fs::create_dir_all(dir.path().join("fred")).unwrap();
        std::fs::write(
            store.cache_path(&cfg),
            b",rate\n2024-01-01,1.0\n2024-01-02,2.0\n2024-01-03,\xff\n2024-01-04,4.0\n",
        )
        .unwrap();

        assert_eq!(
            store.read(&cfg),
            vec![p("2024-01-01", 1.0), p("2024-01-02", 2.0), p("2024-01-04", 4.0)]
        );
    }

    #[test]
    fn unterminated_quote_only_loses_its_row() {
        let content = b",rate\n2024-01-01,1.0\n2024-01-02,\"2.0\n2024-01-03,3.0\n2024-01-04,4.0\n";
        assert_eq!(
            decode_series(content, "rate").unwrap(),
            vec![p("2024-01-01", 1.0), p("2024-01-03", 3.0), p("2024-01-04", 4.0)]
        );
    }

    #[tokio::test]
    async fn merge_append_keeps_history_around_a_corrupt_row() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("vix");
        std::fs::create_dir_all(dir.path().join("fred")).unwrap();
        std::fs::write(
            store.cache_path(&cfg),
            b",rate\n2024-01-01,1.0\n2024-01-02,2.0\n2024-01-03,\xff\n2024-01-04,4.0\n",
        )
        .unwrap();

        store.merge_append(&cfg, &[p("2024-01-05", 5.0)]).await.unwrap();

        let content = std::fs::read_to_string(store.cache_path(&cfg)).unwrap();
        assert_eq!(content, ",rate\n2024-01-01,1\n2024-01-02,2\n2024-01-04,4\n2024-01-05,5\n");
    }

    #[tokio::test]
    async fn unreadable_file_fails_merge_instead_of_overwriting() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("vix");
        // a directory where the data file should be
        std::fs::create_dir_all(store.cache_path(&cfg)).unwrap();

        let result = store.merge_append(&cfg, &[p("2024-05-31", 12.9)]).await;
        assert!(matches!(result, Err(DataError::Storage(_))));
        assert!(store.cache_path(&cfg).is_dir());
        assert_eq!(store.series_meta(&cfg.id), None);
    }

    #[tokio::test]
    async fn failed_rename_removes_temp_file() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let cfg = config("vix");
        let path = store.cache_path(&cfg);
        std::fs::create_dir_all(path.join("occupied")).unwrap();

        let result = store.rewrite(&cfg, &[p("2024-05-31", 12.9)]).await;
        assert!(matches!(result, Err(DataError::Storage(_))));
        assert!(!dir.path().join("fred/vix.csv.tmp").exists());
        assert_eq!(store.series_meta(&cfg.id), None);
    }

    #[test]
    fn corrupt_backoff_length_saturates_at_the_cap() {
        let dir = TempDir::new().unwrap();
        let store = CacheStore::open(dir.path());
        let now = Utc::now();
        store
            .update_meta("vix", |m| m.backoff_seconds = Some(i64::MAX))
            .unwrap();

        store.record_error_at("vix", "boom", now).unwrap();

        let meta = store.series_meta("vix").unwrap();
        assert_eq!(meta.backoff_seconds, Some(3600));
        assert_eq!(meta.backoff_until, Some(now + Duration::seconds(3600)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_to_one_series_are_serialized() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(CacheStore::open(dir.path()));
        let cfg = config("existing_home_sales");

        let handles: Vec<_> = (1..=8)
            .map(|day| {
                let store = store.clone();
                let cfg = cfg.clone();
                tokio::spawn(async move {
                    let point = DataPoint::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), day as f64);
                    store.merge_append(&cfg, &[point]).await.unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let points = store.read(&cfg);
        assert_eq!(points.len(), 8);
        assert!(points.windows(2).all(|w| w[0].date < w[1].date));
    }
}
