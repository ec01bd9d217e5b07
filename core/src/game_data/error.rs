//! Error types for reference data loading

use std::path::PathBuf;
use thiserror::Error;

/// Errors while loading the spell and pet name reference tables
#[derive(Debug, Error)]
pub enum ReferenceError {
    #[error("failed to open reference file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read reference data")]
    Io(#[from] std::io::Error),
}
