use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading project descriptors
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid descriptor: {0}")]
    Invalid(String),
}
