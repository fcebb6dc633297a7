//! YAML configuration for the database target and cleaning defaults.
//!
//! ```yaml
//! database:
//!   path: ev_data.db
//!   table: ev_data
//! cleaning:
//!   empty_numeric: fail
//! ```
//!
//! Every key is optional. Command-line flags take precedence over the file.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::{clean::EmptyMedianPolicy, persist::DEFAULT_TABLE};

pub const DEFAULT_CONFIG_PATH: &str = "config/config.yaml";
pub const DEFAULT_DATABASE_PATH: &str = "ev_data.db";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub table: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CleaningConfig {
    pub empty_numeric: EmptyMedianPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub cleaning: CleaningConfig,
}

impl AppConfig {
    pub fn from_yaml_str(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(input).context("Parsing configuration YAML")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("Reading config file {path:?}"))?;
        Self::from_yaml_str(&contents).with_context(|| format!("Loading config from {path:?}"))
    }

    /// Loads `explicit` when given (it must exist), otherwise the default
    /// location when present, otherwise built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    debug!("No config file at {default_path:?}; using defaults");
                    Ok(Self::default())
                }
            }
        }
    }
}
