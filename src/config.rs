use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::boundary::DEFAULT_JOIN_PROPERTY;
use crate::error::{MapError, Result};
use crate::scale::DEFAULT_LEGEND_CELLS;
use crate::session::{Selection, SessionOptions};
use crate::types::StatKind;
use crate::util::normalize;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub data: DataConfig,
    pub view: ViewConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DataConfig {
    pub reports_dir: PathBuf,
    pub maps_dir: PathBuf,
    pub country: String,
    pub join_property: String,
    /// Pin a specific report (e.g. `04-20-2020.csv`) instead of today's.
    pub report: Option<String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("data/daily_reports"),
            maps_dir: PathBuf::from("maps"),
            country: "US".to_string(),
            join_property: DEFAULT_JOIN_PROPERTY.to_string(),
            report: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ViewConfig {
    pub default_region: String,
    pub default_stat: StatKind,
    pub legend_cells: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_region: "texas".to_string(),
            default_stat: StatKind::Confirmed,
            legend_cells: DEFAULT_LEGEND_CELLS,
        }
    }
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| MapError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)
            .map_err(|e| MapError::Config(format!("failed to parse TOML configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.country.trim().is_empty() {
            return Err(MapError::Config("data.country must not be empty".into()));
        }
        if self.view.legend_cells == 0 {
            return Err(MapError::Config("view.legend_cells must be at least 1".into()));
        }
        Ok(())
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            country: self.data.country.clone(),
            join_property: self.data.join_property.clone(),
            legend_cells: self.view.legend_cells,
            report_name: self.data.report.clone(),
            initial: Selection {
                region: normalize(&self.view.default_region),
                stat: self.view.default_stat,
            },
        }
    }
}
