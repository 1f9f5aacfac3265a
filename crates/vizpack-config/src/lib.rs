//! Build settings for vizpack
//!
//! A single [`Settings`] value is loaded at process start and passed by
//! reference to every pipeline component. Nothing in the workspace reads
//! settings from ambient global state.

pub mod settings;
pub mod tool_paths;

pub use settings::{
    BuildSettings, PackageSettings, ProjectPaths, ServerSettings, Settings, SettingsError,
    ToolSettings,
};
pub use tool_paths::{resolve_tool, ToolPathError};
