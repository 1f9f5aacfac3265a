//! Loading project descriptors from disk

use crate::errors::ManifestError;
use crate::types::{CompilerConfig, ManifestFields, VisualManifest};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::debug;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ManifestError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(ManifestError::NotFound(path.to_path_buf()));
        }
        Err(err) => return Err(ManifestError::Io(err)),
    };
    serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl VisualManifest {
    /// Load `pbiviz.json` (or any manifest file)
    pub fn load_from_path(path: &Path) -> Result<Self, ManifestError> {
        let document: Map<String, Value> = read_json(path)?;
        let fields: ManifestFields = serde_json::from_value(Value::Object(document.clone()))
            .map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if fields.visual.guid.trim().is_empty() {
            return Err(ManifestError::Invalid(format!(
                "{}: visual.guid must not be empty",
                path.display()
            )));
        }

        let base_path = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        debug!(
            "Loaded manifest for visual {} (apiVersion: {:?})",
            fields.visual.guid, fields.api_version
        );

        Ok(VisualManifest {
            visual: fields.visual,
            api_version: fields.api_version,
            capabilities: fields.capabilities,
            dependencies: fields.dependencies,
            style: fields.style,
            external_js: fields.external_js.unwrap_or_default(),
            document,
            base_path,
        })
    }
}

impl CompilerConfig {
    /// Load `tsconfig.json` (or any compiler configuration file)
    pub fn load_from_path(path: &Path) -> Result<Self, ManifestError> {
        let config: CompilerConfig = read_json(path)?;
        debug!(
            "Loaded compiler config with {} files (out: {:?}, outDir: {:?})",
            config.files.len(),
            config.compiler_options.out,
            config.compiler_options.out_dir
        );
        Ok(config)
    }
}

/// Load the dependency descriptor named by the manifest
///
/// Dependencies are optional: a missing field, a missing file, or a
/// document that is not a JSON object all yield an empty object.
pub fn load_dependencies(manifest: &VisualManifest) -> Result<Value, ManifestError> {
    let Some(path) = manifest.dependencies_path() else {
        return Ok(Value::Object(Map::new()));
    };
    if !path.is_file() {
        debug!("No dependency descriptor at {}", path.display());
        return Ok(Value::Object(Map::new()));
    }

    let value: Value = read_json(&path)?;
    if value.is_object() {
        Ok(value)
    } else {
        Ok(Value::Object(Map::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Layout;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "visual": { "name": "barChart", "guid": "barChart4A5B" },
        "apiVersion": "2.3.0",
        "author": { "name": "someone" },
        "capabilities": "capabilities.json",
        "dependencies": "dependencies.json",
        "style": "style/visual.less",
        "externalJS": ["node_modules/d3/d3.min.js"]
    }"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        assert!(fs::write(&path, content).is_ok());
        path
    }

    #[test]
    fn test_load_manifest_fields() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = write(&dir, "pbiviz.json", MANIFEST);
        let Ok(manifest) = VisualManifest::load_from_path(&path) else {
            assert!(false, "manifest should load");
            return;
        };

        assert_eq!(manifest.visual.guid, "barChart4A5B");
        assert_eq!(manifest.required_api_version(), Some("2.3.0"));
        assert_eq!(manifest.external_js, vec!["node_modules/d3/d3.min.js"]);
        assert_eq!(
            manifest.capabilities_path(),
            dir.path().join("capabilities.json")
        );
        assert!(manifest.document().contains_key("author"));
    }

    #[test]
    fn test_latest_api_version_is_unspecified() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = write(
            &dir,
            "pbiviz.json",
            r#"{"visual": {"guid": "g"}, "apiVersion": "latest", "capabilities": "c.json"}"#,
        );
        let manifest = VisualManifest::load_from_path(&path);
        assert!(manifest.is_ok_and(|m| m.required_api_version().is_none()));
    }

    #[test]
    fn test_missing_manifest_is_not_found() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let result = VisualManifest::load_from_path(&dir.path().join("pbiviz.json"));
        assert!(matches!(result, Err(ManifestError::NotFound(_))));
    }

    #[test]
    fn test_malformed_manifest_is_parse_error() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = write(&dir, "pbiviz.json", "{ not json");
        let result = VisualManifest::load_from_path(&path);
        assert!(matches!(result, Err(ManifestError::Parse { .. })));

        let path = write(&dir, "other.json", r#"{"capabilities": "c.json"}"#);
        let result = VisualManifest::load_from_path(&path);
        assert!(matches!(result, Err(ManifestError::Parse { .. })));
    }

    #[test]
    fn test_compiler_config_layouts() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let modern = write(
            &dir,
            "modern.json",
            r#"{
                "compilerOptions": {"outDir": ".tmp/build", "target": "es6"},
                "files": ["src/visual.ts"]
            }"#,
        );
        let legacy = write(
            &dir,
            "legacy.json",
            r#"{"compilerOptions": {"out": "dist/visual.js"}, "files": ["src/visual.ts"]}"#,
        );

        let modern = CompilerConfig::load_from_path(&modern);
        assert!(modern
            .as_ref()
            .is_ok_and(|c| c.layout() == Layout::Modern && c.single_output().is_none()));
        assert!(modern.is_ok_and(|c| c.compiler_options.other.contains_key("target")));

        let legacy = CompilerConfig::load_from_path(&legacy);
        assert!(legacy.is_ok_and(|c| c.layout() == Layout::Legacy
            && c.single_output() == Some("dist/visual.js")
            && c.entry_source() == Some("src/visual.ts")));
    }

    #[test]
    fn test_dependencies_optional() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = write(&dir, "pbiviz.json", MANIFEST);
        let Ok(manifest) = VisualManifest::load_from_path(&path) else {
            assert!(false, "manifest should load");
            return;
        };

        // declared but absent on disk
        let deps = load_dependencies(&manifest);
        assert!(deps.is_ok_and(|d| d == serde_json::json!({})));

        write(&dir, "dependencies.json", r#"{"cranPackages": []}"#);
        let deps = load_dependencies(&manifest);
        assert!(deps.is_ok_and(|d| d == serde_json::json!({"cranPackages": []})));
    }
}
