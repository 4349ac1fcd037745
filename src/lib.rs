//! skirmish-grid: uniform-grid collision and grid pathfinding for 2D RTS units
//!
//! [`CollisionWorld`] keeps colliders between ticks, reports contacts and
//! trigger events, and doubles as an [`ObstacleMap`] for the [`Pathfinder`].

pub mod types;
pub mod api;
pub mod config;
pub mod error;
pub mod grid;
pub mod narrowphase;
pub mod world;
pub mod terrain;
pub mod node_cache;
pub mod pathfinder;
pub mod flow_field;
pub mod debug_draw;

pub use crate::types::*;
pub use crate::api::*;
pub use crate::config::{PathfinderConfig, SimConfig, WorldConfig};
pub use crate::error::{ConfigError, ConfigResult};
pub use crate::world::CollisionWorld;
pub use crate::terrain::{GridTerrain, OpenTerrain};
pub use crate::node_cache::GridCoord;
pub use crate::pathfinder::{PathResult, Pathfinder};
pub use crate::flow_field::{FlowField, GridBounds};
pub use crate::debug_draw::{DebugSurface, DebugView};
