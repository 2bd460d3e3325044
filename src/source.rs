// Where daily reports and boundary documents come from.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{MapError, Result};

/// The two fetches a map build waits on.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Text of the daily report named `name` (e.g. `04-20-2020.csv`).
    async fn fetch_daily_report(&self, name: &str) -> Result<String>;

    /// Text of the boundary document for `region_key`.
    async fn fetch_boundaries(&self, region_key: &str) -> Result<String>;
}

/// Reads reports and boundary documents from two local directories.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    reports_dir: PathBuf,
    maps_dir: PathBuf,
}

impl DirectorySource {
    pub fn new(reports_dir: impl Into<PathBuf>, maps_dir: impl Into<PathBuf>) -> Self {
        Self {
            reports_dir: reports_dir.into(),
            maps_dir: maps_dir.into(),
        }
    }

    async fn read(path: &Path) -> Result<String> {
        debug!(path = %path.display(), "reading");
        tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MapError::fetch(path.display().to_string(), e))
    }
}

#[async_trait]
impl DataSource for DirectorySource {
    async fn fetch_daily_report(&self, name: &str) -> Result<String> {
        Self::read(&self.reports_dir.join(name)).await
    }

    async fn fetch_boundaries(&self, region_key: &str) -> Result<String> {
        Self::read(&self.maps_dir.join(format!("{}.json", region_key))).await
    }
}

/// Date of the newest report expected to be published.
///
/// Reports appear after the UTC day rolls over: once the UTC date is ahead
/// of the local one, today's local report is out; otherwise use yesterday's.
pub fn report_date(utc: NaiveDate, local: NaiveDate) -> NaiveDate {
    if utc > local {
        local
    } else {
        local.pred_opt().unwrap_or(local)
    }
}

pub fn report_name(date: NaiveDate) -> String {
    date.format("%m-%d-%Y.csv").to_string()
}

pub fn daily_report_name(now: DateTime<Local>) -> String {
    report_name(report_date(now.naive_utc().date(), now.date_naive()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn uses_local_day_once_utc_rolls_over() {
        assert_eq!(report_date(d(2020, 4, 21), d(2020, 4, 20)), d(2020, 4, 20));
    }

    #[test]
    fn falls_back_one_day_otherwise() {
        assert_eq!(report_date(d(2020, 4, 20), d(2020, 4, 20)), d(2020, 4, 19));
        // month and year boundaries
        assert_eq!(report_date(d(2020, 3, 1), d(2020, 3, 1)), d(2020, 2, 29));
        assert_eq!(report_date(d(2021, 1, 1), d(2021, 1, 1)), d(2020, 12, 31));
    }

    #[test]
    fn names_reports_by_date() {
        assert_eq!(report_name(d(2020, 4, 9)), "04-09-2020.csv");
        assert_eq!(report_name(d(2020, 10, 10)), "10-10-2020.csv");
    }

    #[tokio::test]
    async fn directory_source_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("04-20-2020.csv"), "a,b\n").unwrap();
        std::fs::write(dir.path().join("texas.json"), "{}").unwrap();
        let source = DirectorySource::new(dir.path(), dir.path());
        assert_eq!(source.fetch_daily_report("04-20-2020.csv").await.unwrap(), "a,b\n");
        assert_eq!(source.fetch_boundaries("texas").await.unwrap(), "{}");
        assert!(matches!(
            source.fetch_boundaries("ohio").await,
            Err(MapError::Fetch { .. })
        ));
    }
}
