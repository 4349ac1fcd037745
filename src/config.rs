//! Tunables for the collision world and the pathfinder.
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! [collision]
//! cell_size = 48.0
//!
//! [pathfinding]
//! max_search_nodes = 4000
//! allow_diagonal = false
//! ```

use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::types::LayerMatrix;

/// Collision world configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Spatial index cell size in world units.
    pub cell_size: f32,
    /// Extra separation added on top of the penetration depth when resolving.
    pub resolution_buffer: f32,
    /// Which layers may collide with which.
    pub layer_matrix: LayerMatrix,
    /// Enable internal timing instrumentation (adds small overhead when true).
    pub enable_timing: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            cell_size: 64.0,
            resolution_buffer: 1.0,
            layer_matrix: LayerMatrix::default(),
            enable_timing: false,
        }
    }
}

impl WorldConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_cell_size("collision.cell_size", self.cell_size)?;
        if !(self.resolution_buffer.is_finite() && self.resolution_buffer >= 0.0) {
            return Err(ConfigError::InvalidResolutionBuffer(self.resolution_buffer));
        }
        Ok(())
    }
}

/// Pathfinder configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathfinderConfig {
    /// Navigation grid cell size in world units.
    pub cell_size: f32,
    /// Nodes a single search may close before giving up.
    pub max_search_nodes: usize,
    pub allow_diagonal: bool,
    /// String-pull found paths.
    pub smooth_paths: bool,
    /// Radius used when a caller does not pass one.
    pub default_unit_radius: f32,
    /// Simulated seconds between wholesale node cache invalidations.
    pub cache_ttl_secs: f32,
    /// How many rings around an unwalkable goal are searched for a substitute.
    pub goal_search_rings: u32,
}

impl Default for PathfinderConfig {
    fn default() -> Self {
        Self {
            cell_size: 32.0,
            max_search_nodes: 2000,
            allow_diagonal: true,
            smooth_paths: true,
            default_unit_radius: 16.0,
            cache_ttl_secs: 5.0,
            goal_search_rings: 10,
        }
    }
}

impl PathfinderConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        check_cell_size("pathfinding.cell_size", self.cell_size)?;
        if self.max_search_nodes == 0 {
            return Err(ConfigError::ZeroSearchBudget);
        }
        if !(self.default_unit_radius.is_finite() && self.default_unit_radius >= 0.0) {
            return Err(ConfigError::InvalidUnitRadius(self.default_unit_radius));
        }
        if !(self.cache_ttl_secs > 0.0) {
            return Err(ConfigError::InvalidCacheTtl(self.cache_ttl_secs));
        }
        Ok(())
    }
}

/// Combined configuration, as loaded from one TOML document.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub collision: WorldConfig,
    pub pathfinding: PathfinderConfig,
}

impl SimConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let cfg: SimConfig = toml::from_str(text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg = Self::from_toml_str(&text)?;
        debug!("Loaded simulation config from {}", path.display());
        Ok(cfg)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.collision.validate()?;
        self.pathfinding.validate()
    }
}

fn check_cell_size(field: &'static str, value: f32) -> ConfigResult<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidCellSize { field, value })
    }
}
