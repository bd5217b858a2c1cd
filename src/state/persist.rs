//! On-disk persistence of Project State as JSON.

use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use super::ProjectState;
use crate::fingerprint::FINGERPRINT_VERSION;

/// Errors raised while saving or loading a State.
#[derive(Debug, Error)]
pub enum PersistError {
    /// IO error during read/write.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or incompatible JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The State was recorded with another fingerprint algorithm.
    #[error("State recorded with fingerprint version {found}, expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },
}

impl ProjectState {
    /// Write the State to `path`, replacing any previous file.
    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(fs::File::create(path)?);
        serde_json::to_writer(writer, self)?;
        debug!("[PERSIST] saved state of {} to {}", self.project(), path.display());
        Ok(())
    }

    /// Read a State from `path`.
    ///
    /// A State written by a different fingerprint version is rejected; the
    /// caller discards it and builds the project from scratch.
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let reader = BufReader::new(fs::File::open(path)?);
        let state: ProjectState = serde_json::from_reader(reader)?;
        if !state.is_compatible() {
            return Err(PersistError::VersionMismatch {
                found: state.fingerprint_version(),
                expected: FINGERPRINT_VERSION,
            });
        }
        Ok(state)
    }
}
