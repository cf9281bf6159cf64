//! Error types shared by the grid loader, the config layer and the engine.

use std::io;

#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum GridError {
    #[error("grid has no cells")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown cell code {code} at ({row}, {col})")]
    UnknownCode { code: u8, row: usize, col: usize },

    #[error("unknown cell character {ch:?} at ({row}, {col})")]
    UnknownChar { ch: char, row: usize, col: usize },

    #[error("cell ({row}, {col}) is outside the {height}x{width} grid")]
    OutOfBounds {
        row: i32,
        col: i32,
        width: i32,
        height: i32,
    },
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: i64 },

    #[error("{field} ({speed}) must divide the cell size ({cell_size})")]
    SpeedNotDivisor {
        field: &'static str,
        speed: i32,
        cell_size: i32,
    },

    #[error("{what} spawn ({row}, {col}) is not a walkable cell")]
    SpawnBlocked {
        what: &'static str,
        row: i32,
        col: i32,
    },

    #[error("at least one ghost spawn is required")]
    NoGhosts,

    #[error("expected {expected} ghost chase ranges, got {found}")]
    ChaseRangeCount { expected: usize, found: usize },
}

pub type GameResult<T> = Result<T, GameError>;
