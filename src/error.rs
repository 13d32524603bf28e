//! Error types shared across the crate.

use std::io;
use std::path::PathBuf;

use crate::schema::ConfigError;

/// Errors produced while loading, reconstructing, rendering or encoding.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input artifact does not exist.
    #[error("Artifact not found: {}", path.display())]
    MissingArtifact { path: PathBuf },
    /// Input artifact exists but cannot be parsed as a numeric table.
    #[error("Malformed artifact {} (line {line}): {reason}", path.display())]
    MalformedArtifact {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    /// Column layout violates the naming convention or a consumer's needs.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
    /// Reconstruction requested for a row the table does not have.
    #[error("Frame {frame} out of range (table has {rows} rows)")]
    FrameOutOfRange { frame: usize, rows: usize },
    /// The frame encoder rejected a frame or could not finalize.
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
    /// Static figure backend failure.
    #[error("Render failed: {0}")]
    Render(String),
    /// Animation session driven out of order.
    #[error("Animation session is {found}, expected {expected}")]
    InvalidState {
        expected: &'static str,
        found: &'static str,
    },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid scene file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl Error {
    /// True for the recoverable "artifact absent" condition.
    pub fn is_missing_artifact(&self) -> bool {
        matches!(self, Error::MissingArtifact { .. })
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
