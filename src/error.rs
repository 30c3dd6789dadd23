//! Error types. Only construction-time problems are `Result`s; broken
//! invariants during play (stale handles, nested-search overflow, pool
//! exhaustion) are panics.

/// Spatial index construction errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum IndexError {
    /// A grid needs at least one cell on each axis.
    #[error("grid needs at least one cell per axis, got {cells_x}x{cells_y}")]
    NoCells { cells_x: u32, cells_y: u32 },

    /// At least the outermost search must be allowed.
    #[error("max_searches must be at least 1")]
    NoSearches,

    /// Bounds are inverted, empty, or not finite.
    #[error("invalid grid bounds: min {min:?} max {max:?}")]
    InvalidBounds { min: glam::Vec2, max: glam::Vec2 },
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Value out of range or inconsistent with another value
    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Crate-level error.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("spatial index: {0}")]
    Index(#[from] IndexError),
}
