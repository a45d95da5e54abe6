//! Settings loaded from `config.toml`
//!
//! Resolution order for the workbook path: `--workbook` flag, then the
//! `CARTEIRA_WORKBOOK` environment variable, then the config file, then
//! `datainvest.xlsx` in the current directory.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::DashboardError;

pub const WORKBOOK_ENV: &str = "CARTEIRA_WORKBOOK";
const DEFAULT_WORKBOOK: &str = "datainvest.xlsx";
const CONFIG_FILENAME: &str = "config.toml";

/// Sheet names of the source workbook
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub monthly: String,
    pub annual: String,
    pub historical: String,
    pub positions: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            monthly: "data_mes".to_string(),
            annual: "data_ano".to_string(),
            historical: "data_port_historico".to_string(),
            positions: "data_port_mes".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub workbook: PathBuf,
    pub sheets: SheetNames,
    /// Number of positions in the largest-positions ranking
    pub top_n: usize,
    /// Allocations pre-selected in the evolution view when none are given
    pub default_allocations: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workbook: PathBuf::from(DEFAULT_WORKBOOK),
            sheets: SheetNames::default(),
            top_n: 10,
            default_allocations: 5,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text; absent keys keep their defaults
    pub fn from_toml(text: &str) -> Result<Self, DashboardError> {
        toml::from_str(text).map_err(|e| DashboardError::ConfigError(e.to_string()))
    }

    /// Load from `path`, or from the default location when `path` is `None`.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, DashboardError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match default_config_path() {
                Some(p) => (p, false),
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            if explicit {
                return Err(DashboardError::ConfigError(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            debug!("No config file at {:?}; using defaults", path);
            return Ok(Self::default());
        }

        debug!("Loading settings from {:?}", path);
        let text = fs::read_to_string(&path)?;
        Self::from_toml(&text)
    }

    /// Apply the environment and command-line overrides for the workbook path
    pub fn with_overrides(mut self, env_workbook: Option<String>, flag: Option<PathBuf>) -> Self {
        if let Some(env) = env_workbook.filter(|v| !v.trim().is_empty()) {
            self.workbook = PathBuf::from(env);
        }
        if let Some(flag) = flag {
            self.workbook = flag;
        }
        self
    }
}

/// `<config_home>/carteira/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dir_spec::config_home().map(|dir| dir.join("carteira").join(CONFIG_FILENAME))
}
