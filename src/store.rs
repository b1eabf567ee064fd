//! Best-score persistence port.
//!
//! The engine loads the best score once at construction and saves it every
//! time a move pushes the current score past it. Race boards normally use a
//! [`MemoryStore`] each so they never contend over one value; single-player
//! sessions can point a [`FileStore`] at disk.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::Score;
use crate::error::StoreError;

/// Load/save access to a single best-score scalar.
pub trait BestScoreStore {
    fn load(&mut self) -> Result<Score, StoreError>;
    fn save(&mut self, best: Score) -> Result<(), StoreError>;
}

/// Process-local store. Nothing survives the process.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStore {
    best: Score,
}

impl MemoryStore {
    pub fn new(best: Score) -> Self { Self { best } }

    pub fn best(&self) -> Score { self.best }
}

impl BestScoreStore for MemoryStore {
    fn load(&mut self) -> Result<Score, StoreError> { Ok(self.best) }

    fn save(&mut self, best: Score) -> Result<(), StoreError> {
        self.best = best;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct BestScoreFile {
    best: Score,
}

/// JSON file holding `{"best": N}`. A missing file loads as 0.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path { &self.path }
}

impl BestScoreStore for FileStore {
    fn load(&mut self) -> Result<Score, StoreError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(source) => return Err(StoreError::Io { path: self.path.clone(), source }),
        };
        let file: BestScoreFile = serde_json::from_str(&text)
            .map_err(|source| StoreError::Json { path: self.path.clone(), source })?;
        Ok(file.best)
    }

    fn save(&mut self, best: Score) -> Result<(), StoreError> {
        let text = serde_json::to_string(&BestScoreFile { best })
            .map_err(|source| StoreError::Json { path: self.path.clone(), source })?;
        fs::write(&self.path, text).map_err(|source| StoreError::Io { path: self.path.clone(), source })
    }
}
