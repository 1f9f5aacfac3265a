//! Locating external executables (npm, tsc, lessc)
//!
//! On Windows the Node toolchain ships `.cmd` shims, so a bare `npm`
//! lookup has to try those names as well.

use std::path::{Path, PathBuf};

#[cfg(not(windows))]
const SHIM_SUFFIXES: &[&str] = &[""];
#[cfg(windows)]
const SHIM_SUFFIXES: &[&str] = &[".cmd", ".exe", ""];

/// Error type for tool path resolution
#[derive(Debug, Clone)]
pub enum ToolPathError {
    /// A configured path does not exist
    ConfiguredPathMissing(PathBuf),
    /// The tool is not on PATH
    NotFound(String),
}

impl std::fmt::Display for ToolPathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolPathError::ConfiguredPathMissing(path) => {
                write!(f, "Configured tool path does not exist: {}", path.display())
            }
            ToolPathError::NotFound(name) => write!(f, "'{}' was not found on PATH", name),
        }
    }
}

impl std::error::Error for ToolPathError {}

/// Resolve an executable, preferring an explicitly configured path
///
/// # Arguments
///
/// * `name` - Tool name as it appears on PATH (e.g. `npm`)
/// * `configured` - Optional path from settings
pub fn resolve_tool(name: &str, configured: Option<&str>) -> Result<PathBuf, ToolPathError> {
    if let Some(path) = configured {
        let path = Path::new(path);
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(ToolPathError::ConfiguredPathMissing(path.to_path_buf()));
    }

    SHIM_SUFFIXES
        .iter()
        .find_map(|suffix| which::which(format!("{}{}", name, suffix)).ok())
        .ok_or_else(|| ToolPathError::NotFound(name.to_string()))
}
