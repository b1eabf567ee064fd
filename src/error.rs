use std::io;
use std::path::PathBuf;

/// Contract violations raised by the engine surface.
///
/// Legitimate game endings are reported through `Status`, never through this type.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("unknown direction: {0:?}")]
    UnknownDirection(String),
    #[error("invalid tile {value} at row {row}, col {col}: expected 0 or a power of two in 2..=32768")]
    InvalidTile { row: usize, col: usize, value: u32 },
}

/// Failures of a best-score persistence backend.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("malformed best-score file {path}: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
}
