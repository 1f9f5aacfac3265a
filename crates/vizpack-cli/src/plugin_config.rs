//! Options for the visual packaging plugin
//!
//! Assembly is pure: it reads the loaded descriptors and, for the modern
//! layout, an already reconciled [`ApiPackageInfo`]. Every call starts
//! from its own copy of the manifest document, so repeated assembly
//! within a run (dev and prod stats builds) never shares state.

use crate::errors::BuildError;
use crate::options::BuildOptions;
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Component, Path, PathBuf};
use vizpack_config::{BuildSettings, ProjectPaths};
use vizpack_manifest::{ApiPackageInfo, CompilerConfig, VisualManifest};

const CUSTOM_VISUAL_PREFIX: &str = "CustomVisual_";

/// Keys this module derives; manifest values under these names are replaced
const DERIVED_KEYS: &[&str] = &[
    "customVisualID",
    "devMode",
    "generateResources",
    "generatePbiviz",
    "minifyJS",
    "dependencies",
    "modules",
    "visualSourceLocation",
    "pluginLocation",
    "compression",
    "apiVersion",
    "capabilitiesSchema",
    "pbivizSchema",
    "stringResourcesSchema",
    "dependenciesSchema",
    "schemaLocation",
    "externalJS",
    "cssStyles",
    "generatePlugin",
];

/// Fields present whatever the layout
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CommonPluginConfig {
    #[serde(rename = "customVisualID")]
    pub custom_visual_id: String,
    pub dev_mode: bool,
    pub generate_resources: bool,
    pub generate_pbiviz: bool,
    #[serde(rename = "minifyJS")]
    pub minify_js: bool,
    pub dependencies: Value,
    /// Mirrors the layout: `true` for modern, `false` for legacy
    pub modules: bool,
    pub visual_source_location: String,
    pub plugin_location: PathBuf,
    pub compression: u8,
    /// Remaining manifest fields, passed through untouched
    #[serde(flatten)]
    pub project: Map<String, Value>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModernPluginConfig {
    pub api_version: String,
    pub capabilities_schema: Value,
    pub pbiviz_schema: Value,
    pub string_resources_schema: Value,
    pub dependencies_schema: Value,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LegacyPluginConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    pub schema_location: PathBuf,
    #[serde(rename = "externalJS")]
    pub external_js: PathBuf,
    pub css_styles: PathBuf,
    pub generate_plugin: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum LayoutPluginConfig {
    Modern(ModernPluginConfig),
    Legacy(LegacyPluginConfig),
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PluginConfiguration {
    #[serde(flatten)]
    pub common: CommonPluginConfig,
    #[serde(flatten)]
    pub layout: LayoutPluginConfig,
}

impl PluginConfiguration {
    pub fn is_modern(&self) -> bool {
        matches!(self.layout, LayoutPluginConfig::Modern(_))
    }
}

/// What the layout-specific half of the configuration is built from
#[derive(Debug, Clone, Copy)]
pub enum LayoutSource<'a> {
    Modern(&'a ApiPackageInfo),
    Legacy,
}

/// `CustomVisual_<guid>` with every non-word, non-space character removed
pub fn custom_visual_id(guid: &str) -> String {
    format!("{}{}", CUSTOM_VISUAL_PREFIX, guid)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

fn lexical_components(path: &Path) -> Vec<Component<'_>> {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts
}

/// Lexical relative path from the directory `from` to `to`, `/`-separated
///
/// Both sides should share a base (both absolute, or both relative to the
/// same directory). When they share nothing, `to` is returned as is.
pub fn relative_posix(from: &Path, to: &Path) -> String {
    let from = lexical_components(from);
    let to = lexical_components(to);
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    if common == 0 && to.first().is_some_and(|c| !matches!(c, Component::Normal(_))) {
        let absolute: PathBuf = to.iter().collect();
        return absolute.to_string_lossy().replace('\\', "/");
    }

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    parts.join("/")
}

fn strip_ts_extension(path: &str) -> &str {
    path.strip_suffix(".tsx")
        .or_else(|| path.strip_suffix(".ts"))
        .unwrap_or(path)
}

pub struct PluginConfigAssembler<'a> {
    manifest: &'a VisualManifest,
    compiler: &'a CompilerConfig,
    dependencies: &'a Value,
    build: &'a BuildSettings,
    paths: &'a ProjectPaths,
}

impl<'a> PluginConfigAssembler<'a> {
    pub fn new(
        manifest: &'a VisualManifest,
        compiler: &'a CompilerConfig,
        dependencies: &'a Value,
        build: &'a BuildSettings,
        paths: &'a ProjectPaths,
    ) -> Self {
        Self {
            manifest,
            compiler,
            dependencies,
            build,
            paths,
        }
    }

    /// Build a fresh [`PluginConfiguration`]
    pub fn assemble(
        &self,
        options: &BuildOptions,
        source: LayoutSource<'_>,
    ) -> Result<PluginConfiguration, BuildError> {
        let entry = self.compiler.entry_source().ok_or_else(|| {
            BuildError::InvalidOption("compiler configuration lists no source files".to_string())
        })?;

        let mut project = self.manifest.document().clone();
        for key in DERIVED_KEYS {
            project.remove(*key);
        }

        let layout = match source {
            LayoutSource::Modern(api) => LayoutPluginConfig::Modern(ModernPluginConfig {
                api_version: api.version.clone(),
                capabilities_schema: api.schemas.capabilities.clone(),
                pbiviz_schema: api.schemas.pbiviz.clone(),
                string_resources_schema: api.schemas.string_resources.clone(),
                dependencies_schema: api.schemas.dependencies.clone(),
            }),
            LayoutSource::Legacy => {
                let api_version = self.manifest.api_version.clone();
                let schema_dir = format!("v{}", api_version.as_deref().unwrap_or("latest"));
                LayoutPluginConfig::Legacy(LegacyPluginConfig {
                    schema_location: self.paths.root.join(".api").join(schema_dir),
                    api_version,
                    external_js: self.paths.external_js.clone(),
                    css_styles: self.paths.css.clone(),
                    generate_plugin: false,
                })
            }
        };

        let common = CommonPluginConfig {
            custom_visual_id: custom_visual_id(&self.manifest.visual.guid),
            dev_mode: options.dev_mode(),
            generate_resources: options.generate_resources,
            generate_pbiviz: options.generate_pbiviz,
            minify_js: options.minify,
            dependencies: self.dependencies.clone(),
            modules: matches!(layout, LayoutPluginConfig::Modern(_)),
            visual_source_location: strip_ts_extension(&relative_posix(
                &self.paths.precompile,
                &self.paths.root.join(entry),
            ))
            .to_string(),
            plugin_location: Path::new(&self.build.precompile_folder).join(&self.build.plugin_file),
            compression: options.compression,
            project,
        };

        Ok(PluginConfiguration { common, layout })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;
    use vizpack_config::Settings;
    use vizpack_manifest::ApiSchemas;

    struct Fixture {
        _dir: TempDir,
        manifest: VisualManifest,
        compiler: CompilerConfig,
        settings: Settings,
        paths: ProjectPaths,
    }

    fn fixture(compiler_options: &str) -> Option<Fixture> {
        let dir = TempDir::new().ok()?;
        let manifest_path = dir.path().join("pbiviz.json");
        fs::write(
            &manifest_path,
            r#"{
                "visual": {"name": "chart", "guid": "{abc-123}"},
                "apiVersion": "2.3.0",
                "capabilities": "capabilities.json",
                "dependencies": "dependencies.json",
                "author": {"name": "someone"},
                "modules": "from manifest"
            }"#,
        )
        .ok()?;
        let manifest = VisualManifest::load_from_path(&manifest_path).ok()?;
        let compiler: CompilerConfig = serde_json::from_str(&format!(
            r#"{{"files": ["src/visual.tsx"], "compilerOptions": {}}}"#,
            compiler_options
        ))
        .ok()?;
        let settings = Settings::default();
        let paths = settings.project_paths(dir.path());
        Some(Fixture {
            _dir: dir,
            manifest,
            compiler,
            settings,
            paths,
        })
    }

    fn assembler_for<'a>(f: &'a Fixture, deps: &'a Value) -> PluginConfigAssembler<'a> {
        PluginConfigAssembler::new(&f.manifest, &f.compiler, deps, &f.settings.build, &f.paths)
    }

    fn api() -> ApiPackageInfo {
        ApiPackageInfo {
            version: "2.3.0".to_string(),
            schemas: ApiSchemas {
                capabilities: json!({"s": "capabilities"}),
                pbiviz: json!({"s": "pbiviz"}),
                string_resources: json!({"s": "strings"}),
                dependencies: json!({"s": "dependencies"}),
            },
        }
    }

    #[test]
    fn test_custom_visual_id() {
        assert_eq!(custom_visual_id("{abc-123}"), "CustomVisual_abc123");
        assert_eq!(
            custom_visual_id("barChart_4A5B"),
            "CustomVisual_barChart_4A5B"
        );
    }

    #[test]
    fn test_relative_posix() {
        let rel = |from: &str, to: &str| relative_posix(Path::new(from), Path::new(to));
        assert_eq!(
            rel(".tmp/precompile", "src/visual.ts"),
            "../../src/visual.ts"
        );
        assert_eq!(rel("./.tmp/precompile", "./.tmp/precompile/a.ts"), "a.ts");
        assert_eq!(rel("a/b", "a/c/d"), "../c/d");
    }

    #[cfg(unix)]
    #[test]
    fn test_relative_posix_keeps_absolute_roots() {
        let rel = |from: &str, to: &str| relative_posix(Path::new(from), Path::new(to));
        assert_eq!(
            rel("/work/visual/.tmp/precompile", "/work/visual/src/visual.ts"),
            "../../src/visual.ts"
        );
        assert_eq!(
            rel("/work/visual/./out/../pre", "/work/visual/src/a.ts"),
            "../src/a.ts"
        );
        assert_eq!(rel("/", "/work/a.ts"), "work/a.ts");
        assert_eq!(rel("/a/b", "/c"), "../../c");
        assert_eq!(rel("pre", "/abs/a.ts"), "/abs/a.ts");
    }

    #[test]
    fn test_modern_configuration() {
        let Some(f) = fixture(r#"{"outDir": ".tmp/build"}"#) else {
            assert!(false, "fixture should load");
            return;
        };
        let deps = json!({});
        let api = api();
        let assembler = assembler_for(&f, &deps);
        let Ok(config) = assembler.assemble(&BuildOptions::default(), LayoutSource::Modern(&api))
        else {
            assert!(false, "assembly should succeed");
            return;
        };

        assert!(config.is_modern());
        assert!(config.common.modules);
        assert!(config.common.dev_mode);
        assert_eq!(config.common.custom_visual_id, "CustomVisual_abc123");
        assert_eq!(config.common.visual_source_location, "../../src/visual");
        assert_eq!(
            config.common.plugin_location,
            PathBuf::from(".tmp/precompile/visualPlugin.ts")
        );

        let Ok(value) = serde_json::to_value(&config) else {
            assert!(false, "configuration should serialize");
            return;
        };
        assert_eq!(value["apiVersion"], json!("2.3.0"));
        assert_eq!(value["pbivizSchema"], json!({"s": "pbiviz"}));
        assert_eq!(value["modules"], json!(true));
        assert_eq!(value["author"], json!({"name": "someone"}));
        assert_eq!(value["customVisualID"], json!("CustomVisual_abc123"));
        assert!(value.get("schemaLocation").is_none());
    }

    #[test]
    fn test_source_location_with_absolute_paths() {
        let Some(mut f) = fixture(r#"{"outDir": ".tmp/build"}"#) else {
            assert!(false, "fixture should load");
            return;
        };
        let root = f.paths.root.clone();
        f.settings.build.precompile_folder = root.join("out/pre").to_string_lossy().into_owned();
        f.paths = f.settings.project_paths(&root);
        f.compiler.files = vec![root.join("src/visual.ts").to_string_lossy().into_owned()];

        let deps = json!({});
        let assembler = assembler_for(&f, &deps);
        let config = assembler.assemble(&BuildOptions::default(), LayoutSource::Legacy);
        assert!(config.is_ok_and(|c| c.common.visual_source_location == "../../src/visual"));
    }

    #[test]
    fn test_legacy_configuration() {
        let Some(f) = fixture(r#"{"out": "dist/visual.js"}"#) else {
            assert!(false, "fixture should load");
            return;
        };
        let deps = json!({"cranPackages": []});
        let assembler = assembler_for(&f, &deps);
        let options = BuildOptions {
            dev_mode: Some(false),
            compression: 5,
            ..BuildOptions::default()
        };
        let Ok(config) = assembler.assemble(&options, LayoutSource::Legacy) else {
            assert!(false, "assembly should succeed");
            return;
        };

        assert!(!config.common.modules);
        assert!(!config.common.dev_mode);
        assert_eq!(config.common.compression, 5);
        let LayoutPluginConfig::Legacy(legacy) = &config.layout else {
            assert!(false, "expected legacy layout");
            return;
        };
        assert!(!legacy.generate_plugin);
        assert_eq!(
            legacy.schema_location,
            f.paths.root.join(".api").join("v2.3.0")
        );
        assert_eq!(legacy.external_js, f.paths.external_js);
        assert_eq!(legacy.css_styles, f.paths.css);

        let Ok(value) = serde_json::to_value(&config) else {
            assert!(false, "configuration should serialize");
            return;
        };
        assert_eq!(value["dependencies"], json!({"cranPackages": []}));
        assert_eq!(value["generatePlugin"], json!(false));
        assert!(value.get("pbivizSchema").is_none());
    }

    #[test]
    fn test_assembly_does_not_share_state() {
        let Some(f) = fixture(r#"{"outDir": ".tmp/build"}"#) else {
            assert!(false, "fixture should load");
            return;
        };
        let deps = json!({});
        let api = api();
        let assembler = assembler_for(&f, &deps);
        let options = BuildOptions::default();

        let Ok(mut first) = assembler.assemble(&options, LayoutSource::Modern(&api)) else {
            assert!(false, "assembly should succeed");
            return;
        };
        first
            .common
            .project
            .insert("plugins".to_string(), json!(["mutated"]));
        if let Some(Value::Object(author)) = first.common.project.get_mut("author") {
            author.insert("name".to_string(), json!("changed"));
        }

        let second = assembler.assemble(&options, LayoutSource::Modern(&api));
        assert!(second
            .as_ref()
            .is_ok_and(|s| !s.common.project.contains_key("plugins")));
        assert!(second.is_ok_and(|s| s.common.project["author"] == json!({"name": "someone"})));
        assert_eq!(f.manifest.document()["author"], json!({"name": "someone"}));
    }

    #[test]
    fn test_no_source_files_is_an_error() {
        let Some(mut f) = fixture(r#"{"outDir": ".tmp/build"}"#) else {
            assert!(false, "fixture should load");
            return;
        };
        f.compiler.files.clear();
        let deps = json!({});
        let assembler = assembler_for(&f, &deps);
        let result = assembler.assemble(&BuildOptions::default(), LayoutSource::Legacy);
        assert!(matches!(result, Err(BuildError::InvalidOption(_))));
    }
}
