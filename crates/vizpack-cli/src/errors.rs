//! Centralized error types for the build pipeline

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use vizpack_manifest::ManifestError;

/// Errors that can occur while preparing a build
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("Failed to parse configuration {}: {reason}", path.display())]
    ConfigParseError { path: PathBuf, reason: String },

    #[error("Invalid API version: {0}")]
    InvalidApiVersion(String),

    #[error("Package install failed: {0}")]
    PackageInstall(String),

    #[error("The '{0}' package is not installed and could not be installed")]
    ApiPackageUnavailable(String),

    #[error("{tool} failed: {message}")]
    ExternalTool { tool: String, message: String },

    #[error("Certificate unavailable: {0}")]
    Certificate(String),

    #[error("Invalid option: {0}")]
    InvalidOption(String),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<ManifestError> for BuildError {
    fn from(err: ManifestError) -> Self {
        match err {
            ManifestError::NotFound(path) => BuildError::ConfigNotFound(path),
            ManifestError::Parse { path, source } => BuildError::ConfigParseError {
                path,
                reason: source.to_string(),
            },
            ManifestError::Invalid(reason) => BuildError::ConfigParseError {
                path: PathBuf::new(),
                reason,
            },
            ManifestError::Io(e) => BuildError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_not_found_maps_to_config_not_found() {
        let err: BuildError = ManifestError::NotFound(PathBuf::from("pbiviz.json")).into();
        assert!(matches!(err, BuildError::ConfigNotFound(_)));
        assert_eq!(err.to_string(), "Configuration file not found: pbiviz.json");
    }

    #[test]
    fn test_invalid_api_version_display() {
        let err = BuildError::InvalidApiVersion("~9.9.9".to_string());
        assert_eq!(err.to_string(), "Invalid API version: ~9.9.9");
    }
}
