//! Configuration file handling.
//!
//! Loads `supply-dash.toml`: the data source, default filters and which
//! views the report contains.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::analytics::View;
use crate::error::{AnalyticsError, Result};
use crate::filter::FilterSpec;

pub const DEFAULT_CONFIG_FILE: &str = "supply-dash.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    /// Filters applied when no CLI filter flag overrides them.
    #[serde(default)]
    pub filters: FilterSpec,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Path to the supply-chain CSV.
    #[serde(default = "default_data_path")]
    pub path: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

fn default_data_path() -> String {
    "supply_chain_data.csv".to_string()
}

/// How the report is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned text tables (default)
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Views included in the report, in order.
    #[serde(default = "default_views")]
    pub views: Vec<View>,

    #[serde(default)]
    pub format: OutputFormat,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            views: default_views(),
            format: OutputFormat::default(),
        }
    }
}

fn default_views() -> Vec<View> {
    vec![
        View::ProductPerformance,
        View::LocationEfficiency,
        View::SupplierRisk,
        View::TransportationAnalysis,
    ]
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            AnalyticsError::Config(format!("Failed to parse {}: {e}", path.display()))
        })
    }

    /// `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    pub fn default_toml() -> String {
        toml::to_string_pretty(&Config::default()).unwrap_or_default()
    }
}
