use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while locating, reading, or writing the settings file
#[derive(Debug)]
pub enum SettingsError {
    /// The home/config directory could not be determined
    NoConfigDir,
    /// Reading or writing the settings file failed
    Io(std::io::Error),
    /// The settings file is not valid TOML for [`Settings`]
    Parse(toml::de::Error),
    /// Serializing settings failed
    Serialize(toml::ser::Error),
    /// `set` was called with an unknown key or an unparsable value
    InvalidKey(String),
}

impl std::fmt::Display for SettingsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingsError::NoConfigDir => write!(f, "Could not determine config directory"),
            SettingsError::Io(e) => write!(f, "Settings IO error: {}", e),
            SettingsError::Parse(e) => write!(f, "Failed to parse settings: {}", e),
            SettingsError::Serialize(e) => write!(f, "Failed to serialize settings: {}", e),
            SettingsError::InvalidKey(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

/// Keys accepted by [`Settings::get`] and [`Settings::set`]
pub const KEYS: &[&str] = &[
    "precompile-folder",
    "drop-folder",
    "package-drop-folder",
    "stats",
    "base-config",
    "server-port",
    "assets-route",
    "private-key",
    "certificate",
    "pfx",
    "passphrase",
    "npm-path",
    "tsc",
    "lessc",
];

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub build: BuildSettings,
    #[serde(default)]
    pub package: PackageSettings,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub tools: ToolSettings,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct BuildSettings {
    pub tmp_folder: String,
    pub precompile_folder: String,
    pub drop_folder: String,
    pub plugin_file: String,
    pub external_js_file: String,
    pub css_file: String,
    pub stats: String,
    /// JSON file holding a base bundler configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_config: Option<String>,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            tmp_folder: ".tmp".to_string(),
            precompile_folder: ".tmp/precompile".to_string(),
            drop_folder: ".tmp/drop".to_string(),
            plugin_file: "visualPlugin.ts".to_string(),
            external_js_file: "externalJS.js".to_string(),
            css_file: "visual.css".to_string(),
            stats: "webpack.statistics.html".to_string(),
            base_config: None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct PackageSettings {
    pub drop_folder: String,
}

impl Default for PackageSettings {
    fn default() -> Self {
        Self {
            drop_folder: "dist".to_string(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServerSettings {
    pub port: u16,
    pub assets_route: String,
    pub private_key: String,
    pub certificate: String,
    pub pfx: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
    /// External command (argv) that creates the certificate files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_command: Option<Vec<String>>,
}

/// Self-signed pair at the default key/certificate locations
fn openssl_certificate_command(private_key: &str, certificate: &str) -> Vec<String> {
    [
        "openssl",
        "req",
        "-x509",
        "-newkey",
        "rsa:2048",
        "-nodes",
        "-keyout",
        private_key,
        "-out",
        certificate,
        "-days",
        "180",
        "-subj",
        "/CN=localhost",
    ]
    .iter()
    .map(ToString::to_string)
    .collect()
}

impl Default for ServerSettings {
    fn default() -> Self {
        let private_key = "certs/PowerBICustomVisualTest_private.key";
        let certificate = "certs/PowerBICustomVisualTest_public.crt";
        Self {
            port: 8080,
            assets_route: "/assets".to_string(),
            private_key: private_key.to_string(),
            certificate: certificate.to_string(),
            pfx: "certs/PowerBICustomVisualTest_public.pfx".to_string(),
            passphrase: None,
            certificate_command: Some(openssl_certificate_command(private_key, certificate)),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ToolSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npm_path: Option<String>,
    pub tsc: String,
    pub lessc: String,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            npm_path: None,
            tsc: "tsc".to_string(),
            lessc: "lessc".to_string(),
        }
    }
}

impl Settings {
    pub fn path() -> Result<PathBuf, SettingsError> {
        // VIZPACK_CONFIG wins for tests and isolated runs
        if let Ok(env_path) = std::env::var("VIZPACK_CONFIG") {
            let trimmed = env_path.trim();
            if !trimmed.is_empty() {
                return Ok(PathBuf::from(trimmed));
            }
        }

        #[cfg(not(target_os = "windows"))]
        let default = dirs::home_dir()
            .ok_or(SettingsError::NoConfigDir)?
            .join(".config")
            .join("vizpack")
            .join("vizpack.toml");

        #[cfg(target_os = "windows")]
        let default = dirs::config_dir()
            .ok_or(SettingsError::NoConfigDir)?
            .join("vizpack")
            .join("vizpack.toml");

        Ok(default)
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Result<Self, SettingsError> {
        Self::load_from_path(&Self::path()?)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(SettingsError::Parse)
    }

    pub fn save(&self) -> Result<(), SettingsError> {
        self.save_to_path(&Self::path()?)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(SettingsError::Serialize)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "precompile-folder" => Some(self.build.precompile_folder.clone()),
            "drop-folder" => Some(self.build.drop_folder.clone()),
            "package-drop-folder" => Some(self.package.drop_folder.clone()),
            "stats" => Some(self.build.stats.clone()),
            "base-config" => self.build.base_config.clone(),
            "server-port" => Some(self.server.port.to_string()),
            "assets-route" => Some(self.server.assets_route.clone()),
            "private-key" => Some(self.server.private_key.clone()),
            "certificate" => Some(self.server.certificate.clone()),
            "pfx" => Some(self.server.pfx.clone()),
            "passphrase" => self.server.passphrase.clone(),
            "npm-path" => self.tools.npm_path.clone(),
            "tsc" => Some(self.tools.tsc.clone()),
            "lessc" => Some(self.tools.lessc.clone()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: String) -> Result<(), SettingsError> {
        match key {
            "precompile-folder" => self.build.precompile_folder = value,
            "drop-folder" => self.build.drop_folder = value,
            "package-drop-folder" => self.package.drop_folder = value,
            "stats" => self.build.stats = value,
            "base-config" => self.build.base_config = Some(value),
            "server-port" => {
                self.server.port = value.parse().map_err(|_| {
                    SettingsError::InvalidKey(format!("Invalid port number: {}", value))
                })?;
            }
            "assets-route" => self.server.assets_route = value,
            "private-key" => self.server.private_key = value,
            "certificate" => self.server.certificate = value,
            "pfx" => self.server.pfx = value,
            "passphrase" => self.server.passphrase = Some(value),
            "npm-path" => self.tools.npm_path = Some(value),
            "tsc" => self.tools.tsc = value,
            "lessc" => self.tools.lessc = value,
            _ => {
                return Err(SettingsError::InvalidKey(format!(
                    "Unknown config key: {}. Supported keys: {}",
                    key,
                    KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    pub fn values_iter(&self) -> Vec<(&'static str, String)> {
        KEYS.iter()
            .filter_map(|key| self.get(key).map(|value| (*key, value)))
            .collect()
    }

    /// Resolve every project-relative location for a project rooted at `root`
    pub fn project_paths(&self, root: &Path) -> ProjectPaths {
        let precompile = root.join(&self.build.precompile_folder);
        let drop = root.join(&self.build.drop_folder);
        ProjectPaths {
            root: root.to_path_buf(),
            tmp: root.join(&self.build.tmp_folder),
            plugin_file: precompile.join(&self.build.plugin_file),
            external_js: precompile.join(&self.build.external_js_file),
            css: drop.join(&self.build.css_file),
            precompile,
            drop,
            package_drop: root.join(&self.package.drop_folder),
        }
    }
}

/// Absolute locations derived from [`Settings`] for one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub tmp: PathBuf,
    pub precompile: PathBuf,
    pub drop: PathBuf,
    pub package_drop: PathBuf,
    /// Generated plugin-glue source file
    pub plugin_file: PathBuf,
    /// Aggregated external scripts (legacy layout)
    pub external_js: PathBuf,
    /// Compiled stylesheet (legacy layout)
    pub css: PathBuf,
}

impl ProjectPaths {
    /// Analyzer report location, e.g. `webpack.statistics.dev.html`
    pub fn stats_report(&self, stats: &str, dev_mode: bool) -> PathBuf {
        let stats_path = Path::new(stats);
        let stem = stats_path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "statistics".to_string());
        let file_name = format!("{}.{}.html", stem, if dev_mode { "dev" } else { "prod" });
        match stats_path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                self.root.join(parent).join(file_name)
            }
            _ => self.root.join(file_name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_match_build_layout() {
        let settings = Settings::default();
        assert_eq!(settings.build.precompile_folder, ".tmp/precompile");
        assert_eq!(settings.build.drop_folder, ".tmp/drop");
        assert_eq!(settings.package.drop_folder, "dist");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.assets_route, "/assets");
        let command = settings.server.certificate_command.unwrap_or_default();
        assert_eq!(command.first().map(String::as_str), Some("openssl"));
        assert!(command.contains(&settings.server.private_key));
        assert!(command.contains(&settings.server.certificate));
    }

    #[test]
    fn test_set_get() {
        let mut settings = Settings::default();
        assert!(settings.set("drop-folder", "out".to_string()).is_ok());
        assert_eq!(settings.get("drop-folder"), Some("out".to_string()));
    }

    #[test]
    fn test_set_rejects_bad_port_and_unknown_key() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.set("server-port", "eighty".to_string()),
            Err(SettingsError::InvalidKey(_))
        ));
        assert!(settings.set("unknown-key", "value".to_string()).is_err());
        assert_eq!(settings.get("unknown-key"), None);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = dir.path().join("vizpack.toml");
        assert!(fs::write(&path, "[server]\nport = 9000\n").is_ok());

        let settings = Settings::load_from_path(&path);
        assert!(settings.as_ref().is_ok_and(|s| s.server.port == 9000));
        assert!(settings.is_ok_and(|s| s.build.drop_folder == ".tmp/drop"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let settings = Settings::load_from_path(&dir.path().join("absent.toml"));
        assert!(settings.is_ok_and(|s| s == Settings::default()));
    }

    #[test]
    fn test_save_round_trip() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let path = dir.path().join("nested").join("vizpack.toml");
        let mut settings = Settings::default();
        settings.server.passphrase = Some("secret".to_string());
        assert!(settings.save_to_path(&path).is_ok());
        assert!(Settings::load_from_path(&path).is_ok_and(|s| s == settings));
    }

    #[test]
    fn test_project_paths() {
        let paths = Settings::default().project_paths(Path::new("/work/visual"));
        assert_eq!(
            paths.precompile,
            PathBuf::from("/work/visual/.tmp/precompile")
        );
        assert_eq!(
            paths.plugin_file,
            PathBuf::from("/work/visual/.tmp/precompile/visualPlugin.ts")
        );
        assert_eq!(
            paths.css,
            PathBuf::from("/work/visual/.tmp/drop/visual.css")
        );
        assert_eq!(paths.package_drop, PathBuf::from("/work/visual/dist"));
    }

    #[test]
    fn test_stats_report_names() {
        let paths = Settings::default().project_paths(Path::new("/work/visual"));
        assert_eq!(
            paths.stats_report("webpack.statistics.html", true),
            PathBuf::from("/work/visual/webpack.statistics.dev.html")
        );
        assert_eq!(
            paths.stats_report("reports/stats.html", false),
            PathBuf::from("/work/visual/reports/stats.prod.html")
        );
    }
}
