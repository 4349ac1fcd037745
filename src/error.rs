use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration.
///
/// Simulation calls never fail; unknown ids and unreachable goals are
/// reported through return values instead.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Cell size must be positive and finite, got {value} ({field})")]
    InvalidCellSize { field: &'static str, value: f32 },

    #[error("Search budget must be at least 1 node")]
    ZeroSearchBudget,

    #[error("Resolution buffer must be non-negative and finite, got {0}")]
    InvalidResolutionBuffer(f32),

    #[error("Cache TTL must be positive, got {0}")]
    InvalidCacheTtl(f32),

    #[error("Unit radius must be non-negative, got {0}")]
    InvalidUnitRadius(f32),
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
