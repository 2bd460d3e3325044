use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tabled::Tabled;
use tracing::warn;

use crate::error::MapError;

/// One record of the daily report exactly as it appears in the CSV.
///
/// Every column is optional text; `loader` decides what is usable.
#[derive(Debug, Deserialize)]
pub struct CsvRow {
    #[serde(rename = "Country_Region")]
    pub country_region: Option<String>,
    #[serde(rename = "Province_State")]
    pub province_state: Option<String>,
    #[serde(rename = "Admin2")]
    pub admin2: Option<String>,
    #[serde(rename = "Confirmed")]
    pub confirmed: Option<String>,
    #[serde(rename = "Deaths")]
    pub deaths: Option<String>,
    #[serde(rename = "Recovered")]
    pub recovered: Option<String>,
}

/// A cleaned, typed input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub country: String,
    pub state: String,
    pub county: String,
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
}

impl RawRow {
    pub fn stats(&self) -> CaseStats {
        CaseStats {
            confirmed: self.confirmed,
            deaths: self.deaths,
            recovered: self.recovered,
        }
    }
}

/// The three counts carried by every summary and annotated feature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStats {
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
}

impl CaseStats {
    pub fn get(&self, kind: StatKind) -> u64 {
        match kind {
            StatKind::Confirmed => self.confirmed,
            StatKind::Deaths => self.deaths,
            StatKind::Recovered => self.recovered,
        }
    }
}

/// Totals for a county, a state or the whole country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegionSummary {
    pub name: String,
    pub confirmed: u64,
    pub deaths: u64,
    pub recovered: u64,
}

impl RegionSummary {
    pub fn new(name: impl Into<String>, stats: CaseStats) -> Self {
        Self {
            name: name.into(),
            confirmed: stats.confirmed,
            deaths: stats.deaths,
            recovered: stats.recovered,
        }
    }

    pub fn stats(&self) -> CaseStats {
        CaseStats {
            confirmed: self.confirmed,
            deaths: self.deaths,
            recovered: self.recovered,
        }
    }

    pub fn value(&self, kind: StatKind) -> u64 {
        self.stats().get(kind)
    }

    /// Add `stats` to the running totals. Totals saturate at `u64::MAX`.
    pub fn accumulate(&mut self, stats: CaseStats) {
        let confirmed = self.confirmed.checked_add(stats.confirmed);
        let deaths = self.deaths.checked_add(stats.deaths);
        let recovered = self.recovered.checked_add(stats.recovered);
        if confirmed.is_none() || deaths.is_none() || recovered.is_none() {
            warn!(region = %self.name, "case totals overflowed; saturating");
        }
        self.confirmed = confirmed.unwrap_or(u64::MAX);
        self.deaths = deaths.unwrap_or(u64::MAX);
        self.recovered = recovered.unwrap_or(u64::MAX);
    }
}

/// Aggregated data for one selectable map.
///
/// `info` always equals the sum of `regions`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationBucket {
    pub info: RegionSummary,
    pub regions: Vec<RegionSummary>,
}

impl AggregationBucket {
    pub fn values(&self, kind: StatKind) -> Vec<f64> {
        self.regions.iter().map(|r| r.value(kind) as f64).collect()
    }
}

/// Which count drives the coloring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKind {
    #[default]
    Confirmed,
    Deaths,
    Recovered,
}

impl StatKind {
    pub const ALL: [StatKind; 3] = [StatKind::Confirmed, StatKind::Deaths, StatKind::Recovered];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKind::Confirmed => "confirmed",
            StatKind::Deaths => "deaths",
            StatKind::Recovered => "recovered",
        }
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatKind {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "confirmed" => Ok(StatKind::Confirmed),
            "deaths" => Ok(StatKind::Deaths),
            "recovered" => Ok(StatKind::Recovered),
            other => Err(MapError::Config(format!("unknown statistic '{}'", other))),
        }
    }
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct RegionRow {
    #[serde(rename = "Name")]
    #[tabled(rename = "Name")]
    pub name: String,
    #[serde(rename = "Confirmed")]
    #[tabled(rename = "Confirmed")]
    pub confirmed: String,
    #[serde(rename = "Deaths")]
    #[tabled(rename = "Deaths")]
    pub deaths: String,
    #[serde(rename = "Recovered")]
    #[tabled(rename = "Recovered")]
    pub recovered: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct LegendRow {
    #[serde(rename = "Color")]
    #[tabled(rename = "Color")]
    pub color: String,
    #[serde(rename = "Range")]
    #[tabled(rename = "Range")]
    pub label: String,
}
