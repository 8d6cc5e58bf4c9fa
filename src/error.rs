//! Error types for the variable indexing engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while discovering, reading, or validating workspace files.
///
/// Per-file read failures never abort a rebuild; they are collected into the
/// [`ScanReport`](crate::index::ScanReport) instead. The remaining variants
/// stop the operation that raised them.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid glob pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: globset::Error,
    },

    #[error("invalid manifest {path:?}: {message}")]
    Manifest { path: PathBuf, message: String },

    #[error("workspace walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("scan task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Why a requested rescan did not produce a new table.
#[derive(Debug, Error)]
pub enum RescanError {
    #[error("workspace does not use {library}")]
    Inactive { library: String },

    #[error("no workspace folder is open")]
    NoWorkspaceRoot,

    #[error("invalid scan configuration: {0}")]
    InvalidConfiguration(#[source] ScanError),

    #[error("rebuild failed: {0}")]
    RebuildFailed(#[source] ScanError),
}
