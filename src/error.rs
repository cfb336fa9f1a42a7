//! Setup-time configuration errors
//!
//! Anything here is fatal: the game refuses to start rather than index past
//! a table at runtime.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("level table is empty")]
    NoLevels,

    #[error("level {index} out of range (table has {len} levels)")]
    LevelOutOfRange { index: usize, len: usize },

    #[error("level {level}: pattern bank is empty")]
    EmptyBank { level: usize },

    #[error("level {level}: shape {shape} has no rows")]
    EmptyShape { level: usize, shape: usize },

    #[error("level {level}: shape {shape} has {len} rows, capacity is {max}")]
    ShapeTooLong {
        level: usize,
        shape: usize,
        len: usize,
        max: usize,
    },

    #[error("level {level}: shape {shape} row {row} has bits {bits:#04x} outside the column mask")]
    RowOutOfRange {
        level: usize,
        shape: usize,
        row: usize,
        bits: u8,
    },

    #[error("level {level}: block height must be at least 1")]
    ZeroBlockHeight { level: usize },

    #[error("level {level}: step delay must be non-zero")]
    ZeroStepDelay { level: usize },

    #[error("level {level}: at least one section is required")]
    NoSections { level: usize },

    #[error("hall period window [{min}, {max}] us is empty or starts at zero")]
    PeriodWindow { min: u32, max: u32 },

    #[error("nominal period {nominal} us outside the accepted window [{min}, {max}] us")]
    NominalPeriod { nominal: u32, min: u32, max: u32 },

    #[error("drift settling must be at least 1, got {0}")]
    DriftSettling(i32),

    #[error("invalid level table JSON: {0}")]
    Json(#[from] serde_json::Error),
}
