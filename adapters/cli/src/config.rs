//! Optional TOML settings file.
//!
//! ```toml
//! [level]
//! columns = 24
//! rows = 16
//! special_tiles = 60
//! diagonal_navigation = true
//!
//! [agent]
//! speed = 2.5
//! stopping_distance = 0.1
//! slowdown = 0.5
//! ```

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use crystal_defence_core::LevelConfig;
use crystal_defence_system_movement::AgentConfig;
use serde::Deserialize;

/// Level and agent tunables, each table optional.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Settings {
    pub(crate) level: LevelConfig,
    pub(crate) agent: AgentConfig,
}

impl Settings {
    /// Reads the settings file, or falls back to defaults when no path is given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid settings file {}", path.display()))
    }

    fn parse(contents: &str) -> Result<Self> {
        let settings: Self =
            toml::from_str(contents).context("failed to parse settings toml contents")?;
        if settings.level.tile_size <= 0.0 || !settings.level.tile_size.is_finite() {
            bail!(
                "tile_size must be a positive number, got {}",
                settings.level.tile_size
            );
        }
        if settings.agent.speed < 0.0 || settings.agent.stopping_distance < 0.0 {
            bail!("agent speed and stopping_distance must not be negative");
        }
        if !(0.0..=1.0).contains(&settings.agent.slowdown) {
            bail!(
                "agent slowdown must lie between 0 and 1, got {}",
                settings.agent.slowdown
            );
        }
        Ok(settings)
    }
}
