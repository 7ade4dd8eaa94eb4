//! # Simulation Configuration
//!
//! Per-instance settings, loaded once from TOML before initialization.
//!
//! ```toml
//! phenomenon = "SmokeAndFire"
//! disabled_objects_trailing = true
//! force_interaction_strength = 0.2
//!
//! [volume]
//! grid_size = [128.0, 128.0, 128.0]
//! container_size = [10.0, 10.0, 10.0]
//! container_position = [0.0, 5.0, 0.0]
//! ```
//!
//! Missing keys fall back to [`SimulationConfig::default`], which is the
//! liquid profile.

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use vortex_shared::constants::{
    DEFAULT_HEIGHTMAP_RESOLUTION, DEFAULT_SIMULATION_TIME_SCALE, LIQUID_NEURAL_PADDING,
    LIQUID_STATS_PER_RECORD, SMOKE_NEURAL_PADDING, SMOKE_STATS_PER_RECORD,
};
use vortex_shared::Phenomenon;

use crate::error::{CoreError, CoreResult};

/// Statistics slots the liquid decoder reads (count + two corners).
const LIQUID_MIN_STATS: usize = 7;
/// Statistics slots the smoke decoder reads (detector illumination block).
const SMOKE_MIN_STATS: usize = 9;

/// Smallest record window the decoder can read for `phenomenon`.
pub(crate) const fn min_stats_per_record(phenomenon: Phenomenon) -> usize {
    match phenomenon {
        Phenomenon::Liquid => LIQUID_MIN_STATS,
        Phenomenon::SmokeAndFire => SMOKE_MIN_STATS,
    }
}

/// Grid and container geometry used to map grid space to world space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationVolume {
    /// Simulation grid resolution per axis.
    pub grid_size: Vec3,
    /// Container extent in world units.
    pub container_size: Vec3,
    /// Container center in world space.
    pub container_position: Vec3,
}

impl Default for SimulationVolume {
    fn default() -> Self {
        Self {
            grid_size: Vec3::splat(128.0),
            container_size: Vec3::splat(10.0),
            container_position: Vec3::ZERO,
        }
    }
}

impl SimulationVolume {
    /// Grid position (cells) to world position.
    #[must_use]
    pub fn grid_to_world(&self, grid_position: Vec3) -> Vec3 {
        self.container_size * grid_position / self.grid_size - self.container_size * 0.5
            + self.container_position
    }
}

/// Inputs to emitter and void payload encoding.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmissionSettings {
    /// Size of one grid node in world units.
    pub node_size: f32,
    /// Particles per node volume.
    pub particle_density: f32,
    /// Simulation time per world second.
    pub simulation_time_scale: f32,
}

impl Default for EmissionSettings {
    fn default() -> Self {
        Self {
            node_size: 10.0 / 128.0,
            particle_density: 1.0,
            simulation_time_scale: DEFAULT_SIMULATION_TIME_SCALE,
        }
    }
}

/// Settings for one simulation instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Target engine.
    pub phenomenon: Phenomenon,
    /// Sort disabled manipulators after enabled ones inside each type range.
    pub disabled_objects_trailing: bool,
    /// Order force fields analytic, neural, group inside their range.
    pub force_fields_grouped_by_shape: bool,
    /// Bounding-box padding applied to neural shapes.
    pub neural_padding: f32,
    /// Statistics slots per manipulator in the feedback buffer.
    pub stats_per_record: usize,
    /// Collider force interaction strength; reported forces scale by `exp(4 * s)`.
    pub force_interaction_strength: f32,
    /// Grid and container geometry.
    pub volume: SimulationVolume,
    /// Emission inputs.
    pub emission: EmissionSettings,
    /// Smoke engine runs in fire mode (emitters carry fuel and temperature).
    pub fire_mode: bool,
    /// Fire brightness, applied to detector illumination.
    pub fire_brightness: f32,
    /// Black body brightness, applied to detector illumination.
    pub black_body_brightness: f32,
    /// Per-terrain tile resolution in the heightmap atlas.
    pub heightmap_resolution: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self::liquid()
    }
}

impl SimulationConfig {
    /// Liquid engine profile.
    #[must_use]
    pub fn liquid() -> Self {
        Self {
            phenomenon: Phenomenon::Liquid,
            disabled_objects_trailing: false,
            force_fields_grouped_by_shape: false,
            neural_padding: LIQUID_NEURAL_PADDING,
            stats_per_record: LIQUID_STATS_PER_RECORD,
            force_interaction_strength: 0.01,
            volume: SimulationVolume::default(),
            emission: EmissionSettings::default(),
            fire_mode: false,
            fire_brightness: 0.0,
            black_body_brightness: 0.0,
            heightmap_resolution: DEFAULT_HEIGHTMAP_RESOLUTION,
        }
    }

    /// Smoke & fire engine profile.
    #[must_use]
    pub fn smoke_and_fire() -> Self {
        Self {
            phenomenon: Phenomenon::SmokeAndFire,
            disabled_objects_trailing: true,
            force_fields_grouped_by_shape: true,
            neural_padding: SMOKE_NEURAL_PADDING,
            stats_per_record: SMOKE_STATS_PER_RECORD,
            fire_mode: true,
            fire_brightness: 400.0,
            black_body_brightness: 4000.0,
            ..Self::liquid()
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] on malformed TOML or invalid values.
    pub fn from_toml_str(source: &str) -> CoreResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the file cannot be read or is invalid.
    pub fn from_toml_file(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Checks the values the decoder and payload encoders divide by or index
    /// with.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] describing the first invalid value.
    pub fn validate(&self) -> CoreResult<()> {
        let min_stats = min_stats_per_record(self.phenomenon);
        if self.stats_per_record < min_stats {
            return Err(CoreError::Config(format!(
                "stats_per_record {} is below the {min_stats} slots the decoder reads",
                self.stats_per_record
            )));
        }
        if self.volume.grid_size.min_element() <= 0.0 {
            return Err(CoreError::Config("grid_size must be positive".into()));
        }
        if self.emission.node_size <= 0.0 {
            return Err(CoreError::Config("node_size must be positive".into()));
        }
        if self.emission.simulation_time_scale <= 0.0 {
            return Err(CoreError::Config("simulation_time_scale must be positive".into()));
        }
        if !(0.0..1.0).contains(&self.neural_padding) {
            return Err(CoreError::Config("neural_padding must be in [0, 1)".into()));
        }
        Ok(())
    }

    /// Whether the active engine uses the smoke record layouts.
    #[must_use]
    pub fn is_smoke(&self) -> bool {
        self.phenomenon == Phenomenon::SmokeAndFire
    }
}
