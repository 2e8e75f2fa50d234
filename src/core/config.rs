use super::composition::{FundComposition, Holding, default_holdings};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FundConfig {
    pub name: String,
    pub holdings: Vec<Holding>,
}

impl Default for FundConfig {
    fn default() -> Self {
        FundConfig {
            name: "Star Fund".to_string(),
            holdings: default_holdings(),
        }
    }
}

impl FundConfig {
    pub fn composition(&self) -> Result<FundComposition> {
        FundComposition::new(self.holdings.clone())
            .with_context(|| format!("Invalid holdings for fund '{}'", self.name))
    }
}

/// Where input tables live inside the data directory and which columns are read.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct InputLayout {
    /// Number of `<SYMBOL>_<n>.csv` files per symbol.
    pub segments: u32,
    pub timestamp_column: usize,
    pub close_column: usize,
    pub ledger_file: String,
    pub output_file: String,
}

impl Default for InputLayout {
    fn default() -> Self {
        InputLayout {
            segments: 2,
            timestamp_column: 0,
            close_column: 4,
            ledger_file: "users.csv".to_string(),
            output_file: "users_refund.csv".to_string(),
        }
    }
}

impl InputLayout {
    pub fn segment_file(&self, symbol: &str, segment: u32) -> String {
        format!("{symbol}_{segment}.csv")
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub fund: FundConfig,
    #[serde(default)]
    pub inputs: InputLayout,
    /// Fail the run when a ledger date has no fund return.
    #[serde(default)]
    pub strict_dates: bool,
}

impl AppConfig {
    /// Uses `path` when given, then the default config file if one exists,
    /// then the built-in star fund.
    pub fn load_or_default(path: Option<&str>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }
        match Self::default_config_path() {
            Ok(default_path) if default_path.exists() => Self::load_from_path(&default_path),
            _ => {
                debug!("No config file found, using built-in fund");
                Ok(Self::default())
            }
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "starfund", "starfund")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
