use thiserror::Error;

use crate::blocks::BlockId;

// Errors raised while registering materials and block types with a registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("material `{0}` is already registered with a different color")]
    MaterialConflict(String),

    #[error("block `{block}` refers to unknown material `{material}`")]
    UnknownMaterial { block: String, material: String },

    #[error("block `{name}` is already registered with material `{existing}`")]
    BlockConflict { name: String, existing: String },

    #[error("no block ids left to assign")]
    IdsExhausted,
}

// Errors raised while loading or validating a world configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("chunk size must be positive")]
    ZeroChunkSize,

    #[error("chunk remove distance {remove} is smaller than add distance {add}")]
    Distances { add: f32, remove: f32 },

    #[error("{field}: octave count must be at least 1")]
    NoOctaves { field: &'static str },

    #[error("{field}: persistence {value} is outside (0, 1]")]
    Persistence { field: &'static str, value: f64 },

    #[error("{field}: scale {value} must be positive and finite")]
    Scale { field: &'static str, value: f64 },
}

// Errors raised by player input handling.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum InputError {
    #[error("block id {0} is not registered")]
    UnknownBlock(BlockId),
}
