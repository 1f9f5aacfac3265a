//! The bundler plugin list
//!
//! Order matters downstream: the analyzer must see the finished bundle,
//! the packaging plugin consumes the [`PluginConfiguration`], and the
//! globals shim goes last.

use super::config::BundlerConfig;
use crate::errors::BuildError;
use crate::plugin_config::PluginConfiguration;
use serde_json::json;
use std::path::Path;

pub const BUNDLE_ANALYZER: &str = "webpack-bundle-analyzer";
pub const PACKAGING_PLUGIN: &str = "powerbi-visuals-webpack-plugin";
pub const EXTRA_WATCH: &str = "extra-watch-webpack-plugin";
pub const FRIENDLY_ERRORS: &str = "friendly-errors-webpack-plugin";
pub const PROVIDE_GLOBALS: &str = "webpack.ProvidePlugin";

/// Append the five build plugins in their fixed order
pub fn append_plugins(
    bundler: &mut BundlerConfig,
    plugin_config: &PluginConfiguration,
    stats_report: &Path,
    capabilities: &Path,
) -> Result<(), BuildError> {
    bundler.push_plugin(
        BUNDLE_ANALYZER,
        json!({
            "reportFilename": stats_report,
            "openAnalyzer": false,
            "analyzerMode": "static",
        }),
    );
    bundler.push_plugin(PACKAGING_PLUGIN, serde_json::to_value(plugin_config)?);
    bundler.push_plugin(EXTRA_WATCH, json!({ "files": [capabilities] }));
    bundler.push_plugin(FRIENDLY_ERRORS, json!({}));
    bundler.push_plugin(
        PROVIDE_GLOBALS,
        json!({
            "window": "realWindow",
            "define": "fakeDefine",
            "powerbi": "corePowerbiObject",
        }),
    );
    Ok(())
}
