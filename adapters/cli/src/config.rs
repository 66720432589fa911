use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::Deserialize;
use zone_forecast_core::{
    ZoneSchedule, DEFAULT_MAP_HEIGHT, DEFAULT_MAP_WIDTH, DEFAULT_PHASE_RADII,
};
use zone_forecast_system_generation::GenerationConfig;

/// Settings loaded from an optional TOML file.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ForecastConfig {
    /// Radius schedule and map size.
    pub(crate) schedule: ScheduleConfig,
    /// Synthetic generation parameters.
    pub(crate) generation: GenerationConfig,
}

/// Serialisable form of the zone schedule.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScheduleConfig {
    /// Radii per phase, starting at phase one.
    pub(crate) radii: Vec<u32>,
    /// Map width in pixels.
    pub(crate) map_width: u32,
    /// Map height in pixels.
    pub(crate) map_height: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            radii: DEFAULT_PHASE_RADII.to_vec(),
            map_width: DEFAULT_MAP_WIDTH,
            map_height: DEFAULT_MAP_HEIGHT,
        }
    }
}

impl ForecastConfig {
    /// Loads the file at `path`, or the built-in defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents).context("failed to parse config toml contents")
    }

    /// Validated zone schedule described by the configuration.
    pub(crate) fn schedule(&self) -> Result<ZoneSchedule> {
        ZoneSchedule::new(
            self.schedule.radii.clone(),
            self.schedule.map_width,
            self.schedule.map_height,
        )
        .context("zone schedule in config is invalid")
    }
}
