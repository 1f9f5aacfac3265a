//! Visual project descriptors
//!
//! Typed, read-only views of the files a visual project is built from:
//! the visual manifest (`pbiviz.json`), the compiler configuration
//! (`tsconfig.json`), the optional dependency descriptor, and the
//! installed platform-API package.
//!
//! Everything here is loaded once per run and never mutated afterwards.

pub mod api_package;
pub mod errors;
pub mod manifest;
pub mod types;

pub use api_package::{ApiPackageInfo, ApiSchemas, API_PACKAGE_NAME};
pub use errors::ManifestError;
pub use manifest::load_dependencies;
pub use types::{CompilerConfig, CompilerOptions, Layout, VisualInfo, VisualManifest};
