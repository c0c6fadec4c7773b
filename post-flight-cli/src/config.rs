use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result, bail};
use log::debug;
use post_flight_core::pipeline::{DistanceConfig, InterpolationConfig, MergeConfig, RangeConfig};
use serde::{Deserialize, Serialize};

pub const LOCAL_CONFIG_FILE: &str = ".post-flight.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostFlightConfig {
    pub merge_gps: MergeConfig,
    pub replace_altitude: MergeConfig,
    pub distance: DistanceConfig,
    pub range: RangeConfig,
    pub interpolation: InterpolationConfig,
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotConfig {
    pub x_column: String,
    pub y_column: String,
    pub x_label: String,
    pub y_label: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            x_column: "Distance".into(),
            y_column: "CalculatedValue".into(),
            x_label: "Distance".into(),
            y_label: "Max Range (km)".into(),
            title: "Distance vs. Max Range".into(),
            width: 1024,
            height: 768,
        }
    }
}

impl Default for PostFlightConfig {
    fn default() -> Self {
        Self {
            merge_gps: MergeConfig::gps_tracker(),
            replace_altitude: MergeConfig::altitude(),
            distance: DistanceConfig::default(),
            range: RangeConfig::default(),
            interpolation: InterpolationConfig::default(),
            plot: PlotConfig::default(),
        }
    }
}

impl PostFlightConfig {
    /// Loads `path` if given, otherwise the first config found by
    /// [`Self::get_config_path`]. No config file at all means defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            return Self::read(path);
        }

        match Self::get_config_path() {
            Some(path) => Self::read(&path),
            None => Ok(Self::default()),
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config = toml::from_str(&config_str)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, config_str)?;
        Ok(())
    }

    /// `.post-flight.toml` in the working directory, then the user config
    /// directory.
    pub fn get_config_path() -> Option<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Some(local);
        }

        directories::ProjectDirs::from("ca.macrocketry", "MacRocketry", "post-flight")
            .map(|dirs| dirs.config_dir().join("post-flight.toml"))
            .filter(|path| path.exists())
    }
}
