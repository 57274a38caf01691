// ⚙️ Configuration - JSON file with defaults for every field

use crate::filter::{FilterError, FilterState, YearRange};
use crate::views::ViewOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "mortality-globe.json";
pub const CONFIG_ENV: &str = "MORTALITY_GLOBE_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid initial years: {0}")]
    Years(#[from] FilterError),

    #[error("point_limit must be greater than zero")]
    ZeroPointLimit,

    #[error("tick_ms must be greater than zero")]
    ZeroTick,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub records_path: PathBuf,
    pub regions_path: PathBuf,
    /// `[from, to]`
    pub initial_years: [i32; 2],
    pub point_limit: usize,
    pub jitter_width: f64,
    pub tick_ms: u64,
    pub top_regions: usize,
    pub server_addr: String,
    pub static_dir: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            records_path: PathBuf::from("public/data/AgeDataset-V3-wo-unknown.csv"),
            regions_path: PathBuf::from("public/data/ne_110m_admin_0_countries.json"),
            initial_years: [0, 500],
            point_limit: 1000,
            jitter_width: 10.0,
            tick_ms: 100,
            top_regions: 10,
            server_addr: "0.0.0.0:3000".to_string(),
            static_dir: PathBuf::from("public"),
            log_file: None,
        }
    }
}

impl AppConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(json).context("Failed to parse config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Invalid config in {}", path.display()))
    }

    /// Explicit path > `MORTALITY_GLOBE_CONFIG` > `./mortality-globe.json` > defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let default_path = Path::new(DEFAULT_CONFIG_FILE);
        if default_path.exists() {
            return Self::from_file(default_path);
        }
        Ok(AppConfig::default())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.initial_range()?;
        if self.point_limit == 0 {
            return Err(ConfigError::ZeroPointLimit);
        }
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTick);
        }
        Ok(())
    }

    pub fn initial_range(&self) -> Result<YearRange, FilterError> {
        YearRange::new(self.initial_years[0], self.initial_years[1])
    }

    pub fn initial_filter(&self) -> Result<FilterState, FilterError> {
        Ok(FilterState::new(self.initial_range()?))
    }

    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            point_limit: self.point_limit,
            jitter_width: self.jitter_width,
            top_regions: self.top_regions,
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
