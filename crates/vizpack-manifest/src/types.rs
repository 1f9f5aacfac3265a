use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Which build pipeline a project uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Directory output (`compilerOptions.outDir`), generated plugin glue
    Modern,
    /// Single combined output (`compilerOptions.out`), hand-written plugin glue
    Legacy,
}

impl Layout {
    pub fn is_legacy(self) -> bool {
        matches!(self, Layout::Legacy)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VisualInfo {
    pub guid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// The typed fields the pipeline reads from `pbiviz.json`
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ManifestFields {
    pub visual: VisualInfo,
    #[serde(default)]
    pub api_version: Option<String>,
    pub capabilities: String,
    #[serde(default)]
    pub dependencies: Option<String>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default, rename = "externalJS")]
    pub external_js: Option<Vec<String>>,
}

/// Visual manifest (`pbiviz.json`)
///
/// Keeps the full parsed document alongside the typed fields so that
/// unknown keys pass through to the packaging plugin untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualManifest {
    pub visual: VisualInfo,
    pub api_version: Option<String>,
    /// Capabilities file, relative to the project root
    pub capabilities: String,
    /// Dependency descriptor, relative to the project root
    pub dependencies: Option<String>,
    /// Stylesheet entry (legacy layout)
    pub style: Option<String>,
    /// Scripts concatenated ahead of the visual (legacy layout)
    pub external_js: Vec<String>,
    pub(crate) document: Map<String, Value>,
    pub(crate) base_path: PathBuf,
}

impl VisualManifest {
    /// Required API version; `None` when absent or `"latest"`
    pub fn required_api_version(&self) -> Option<&str> {
        self.api_version
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty() && *v != "latest")
    }

    /// The whole manifest document as loaded
    pub fn document(&self) -> &Map<String, Value> {
        &self.document
    }

    /// Directory the manifest was loaded from
    pub fn base_path(&self) -> &std::path::Path {
        &self.base_path
    }

    pub fn capabilities_path(&self) -> PathBuf {
        self.base_path.join(&self.capabilities)
    }

    pub fn dependencies_path(&self) -> Option<PathBuf> {
        self.dependencies.as_ref().map(|d| self.base_path.join(d))
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CompilerOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out: Option<String>,
    #[serde(default, rename = "outDir", skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// Compiler configuration (`tsconfig.json`)
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CompilerConfig {
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default, rename = "compilerOptions")]
    pub compiler_options: CompilerOptions,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl CompilerConfig {
    /// `outDir` selects the modern layout; anything else is legacy
    pub fn layout(&self) -> Layout {
        if self.compiler_options.out_dir.is_some() {
            Layout::Modern
        } else {
            Layout::Legacy
        }
    }

    /// The combined output file, when the project compiles to one
    pub fn single_output(&self) -> Option<&str> {
        self.compiler_options.out.as_deref()
    }

    /// First source file, the visual's entry
    pub fn entry_source(&self) -> Option<&str> {
        self.files.first().map(String::as_str)
    }
}
