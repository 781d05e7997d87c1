//! LODES configuration loading
//!
//! Loads configuration from `~/.config/lodes/lodes.toml` (or `LODES_CONFIG` env).
//! Every field has a default, so a missing file is not an error.

use crate::errors::{LodesError, Result};
use crate::naming::{Year, state_code};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use strum_macros::{AsRefStr, Display, EnumString};

/// How the spatial SQL surface is provided on a connection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, EnumString, Display, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SpatialBackend {
    /// Load the SpatiaLite extension module
    #[default]
    Spatialite,
    /// Register geo-backed functions over WKT geometry columns
    Builtin,
}

/// Root configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LodesConfig {
    /// Path to the LODES SQLite database
    #[serde(default)]
    pub db_path: Option<String>,

    /// Spatial backend for new connections
    #[serde(default)]
    pub backend: SpatialBackend,

    /// SpatiaLite module name or path passed to `load_extension`
    #[serde(default = "default_spatialite_module")]
    pub spatialite_module: String,

    /// State used when a query does not name one
    #[serde(default = "default_state")]
    pub default_state: String,

    /// Vintage of the geometry tables
    #[serde(default = "default_geometry_year")]
    pub geometry_year: u16,
}

fn default_spatialite_module() -> String {
    "mod_spatialite".to_string()
}

fn default_state() -> String {
    "tx".to_string()
}

fn default_geometry_year() -> u16 {
    2020
}

impl Default for LodesConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            backend: SpatialBackend::default(),
            spatialite_module: default_spatialite_module(),
            default_state: default_state(),
            geometry_year: default_geometry_year(),
        }
    }
}

impl LodesConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "LODES_CONFIG";

    /// Default config filename
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "lodes.toml";

    /// Load configuration
    ///
    /// Resolution order:
    /// 1. `LODES_CONFIG` environment variable
    /// 2. `~/.config/lodes/lodes.toml`
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::resolve_config_path();

        if !path.exists() {
            tracing::debug!(
                path = %path.display(),
                "LODES config not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load_from_path(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LodesError::config_with_source(
                format!("failed to read config at {}", path.display()),
                e,
            )
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let cfg: LodesConfig = toml::from_str(contents)
            .map_err(|e| LodesError::config_with_source("failed to parse config", e))?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }

        dirs::home_dir()
            .map(|h| {
                h.join(".config")
                    .join("lodes")
                    .join(Self::DEFAULT_CONFIG_FILENAME)
            })
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
    }

    fn validate(&self) -> Result<()> {
        state_code(&self.default_state)
            .map_err(|e| LodesError::config(format!("default_state: {e}")))?;
        Year::coerce(self.geometry_year)
            .map_err(|e| LodesError::config(format!("geometry_year: {e}")))?;

        if self.backend == SpatialBackend::Builtin && self.spatialite_module != default_spatialite_module() {
            tracing::warn!(
                module = %self.spatialite_module,
                "spatialite_module is ignored with the builtin backend"
            );
        }

        if self.db_path.is_none() {
            tracing::debug!("No db_path configured; commands must pass --db");
        }

        Ok(())
    }

    /// Get the resolved database path (expanding ~ if needed)
    pub fn resolved_db_path(&self) -> Option<PathBuf> {
        let path = self.db_path.as_deref()?;
        if let Some(stripped) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return Some(home.join(stripped));
        }
        Some(PathBuf::from(path))
    }

    /// Geometry table vintage as a `Year`
    pub fn geometry_year(&self) -> Result<Year> {
        Year::coerce(self.geometry_year)
    }
}
