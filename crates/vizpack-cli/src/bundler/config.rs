//! The configuration tree handed to the external bundler
//!
//! A run starts from a clone of the base configuration and extends it in
//! a fixed order: mode and loader options, plugins, dev server, entry and
//! output. The finished tree is serialized once and never touched again.

use crate::errors::BuildError;
use crate::options::TransformTarget;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const TS_LOADER: &str = "ts-loader";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
    None,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Optimization {
    pub concatenate_modules: bool,
    pub minimize: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ModuleRule {
    pub test: String,
    pub loader: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ModuleConfig {
    #[serde(default)]
    pub rules: Vec<ModuleRule>,
}

/// A plugin as the bundler sees it: a name and its options
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PluginEntry {
    pub name: String,
    #[serde(default)]
    pub options: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum EntryPoint {
    File(PathBuf),
    Files(Vec<PathBuf>),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OutputConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_target: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct WatchOptions {
    #[serde(default)]
    pub ignored: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct BundlerConfig {
    #[serde(default)]
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devtool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optimization: Option<Optimization>,
    #[serde(default)]
    pub module: ModuleConfig,
    /// Execution order downstream follows list order
    #[serde(default)]
    pub plugins: Vec<PluginEntry>,
    #[serde(default)]
    pub entry: BTreeMap<String, EntryPoint>,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub dev_server: Map<String, Value>,
    #[serde(default)]
    pub watch_options: WatchOptions,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl BundlerConfig {
    /// Built-in base: TypeScript and stylesheet loaders, source maps
    pub fn default_base() -> Self {
        let mut ts_options = Map::new();
        ts_options.insert("transpileOnly".to_string(), Value::Bool(false));
        ts_options.insert(
            "compilerOptions".to_string(),
            json!({ "target": TransformTarget::Es2015.as_str() }),
        );

        let mut dev_server = Map::new();
        dev_server.insert("compress".to_string(), Value::Bool(true));
        dev_server.insert("hot".to_string(), Value::Bool(false));
        dev_server.insert(
            "headers".to_string(),
            json!({ "access-control-allow-origin": "*" }),
        );

        BundlerConfig {
            mode: Mode::Development,
            devtool: Some("source-map".to_string()),
            optimization: None,
            module: ModuleConfig {
                rules: vec![
                    ModuleRule {
                        test: r"(\.ts)x|\.ts$".to_string(),
                        loader: TS_LOADER.to_string(),
                        options: ts_options,
                        exclude: vec!["node_modules".to_string()],
                    },
                    ModuleRule {
                        test: r"\.(less|css)$".to_string(),
                        loader: "less-loader".to_string(),
                        options: Map::new(),
                        exclude: Vec::new(),
                    },
                ],
            },
            plugins: Vec::new(),
            entry: BTreeMap::new(),
            output: OutputConfig {
                filename: Some("[name]".to_string()),
                ..OutputConfig::default()
            },
            dev_server,
            watch_options: WatchOptions {
                ignored: vec!["node_modules/**".to_string()],
            },
            other: Map::new(),
        }
    }

    /// Load a base configuration from a JSON file
    pub fn load_base(path: &Path) -> Result<Self, BuildError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(BuildError::ConfigNotFound(path.to_path_buf()));
            }
            Err(err) => return Err(BuildError::Io(err)),
        };
        serde_json::from_str(&content).map_err(|e| BuildError::ConfigParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn set_dev_mode(&mut self, dev_mode: bool) {
        self.mode = if dev_mode {
            Mode::Development
        } else {
            Mode::Production
        };
    }

    /// Apply the optimize pass. Only the first call has an effect.
    pub fn enable_optimization(&mut self) -> bool {
        if self.optimization.is_some() {
            return false;
        }
        self.optimization = Some(Optimization {
            concatenate_modules: false,
            minimize: true,
        });
        true
    }

    fn ts_rules_mut(&mut self) -> impl Iterator<Item = &mut ModuleRule> {
        self.module
            .rules
            .iter_mut()
            .filter(|rule| rule.loader == TS_LOADER)
    }

    pub fn set_transform_target(&mut self, target: TransformTarget) {
        for rule in self.ts_rules_mut() {
            let compiler_options = rule
                .options
                .entry("compilerOptions")
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = compiler_options {
                map.insert(
                    "target".to_string(),
                    Value::String(target.as_str().to_string()),
                );
            } else {
                *compiler_options = json!({ "target": target.as_str() });
            }
        }
    }

    pub fn transform_target(&self) -> Option<&str> {
        self.module
            .rules
            .iter()
            .find(|rule| rule.loader == TS_LOADER)
            .and_then(|rule| rule.options.get("compilerOptions"))
            .and_then(|options| options.get("target"))
            .and_then(Value::as_str)
    }

    /// Fast builds skip type checking in the TypeScript loader
    pub fn set_fast(&mut self, fast: bool) {
        for rule in self.ts_rules_mut() {
            rule.options
                .insert("transpileOnly".to_string(), Value::Bool(fast));
        }
    }

    pub fn push_plugin(&mut self, name: &str, options: Value) {
        self.plugins.push(PluginEntry {
            name: name.to_string(),
            options,
        });
    }

    pub fn plugin_names(&self) -> Vec<&str> {
        self.plugins.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn to_json_pretty(&self) -> Result<String, BuildError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
