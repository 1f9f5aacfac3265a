//! The installed platform-API package
//!
//! The package carries its version in `package.json` and ships four JSON
//! schema documents at its root. A fresh [`ApiPackageInfo`] is read every
//! time the package is resolved; nothing is cached between reads.

use crate::errors::ManifestError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const API_PACKAGE_NAME: &str = "powerbi-visuals-api";

const CAPABILITIES_SCHEMA: &str = "schema.capabilities.json";
const PBIVIZ_SCHEMA: &str = "schema.pbiviz.json";
const STRING_RESOURCES_SCHEMA: &str = "schema.stringResources.json";
const DEPENDENCIES_SCHEMA: &str = "schema.dependencies.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiSchemas {
    pub capabilities: Value,
    pub pbiviz: Value,
    pub string_resources: Value,
    pub dependencies: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ApiPackageInfo {
    pub version: String,
    pub schemas: ApiSchemas,
}

#[derive(Deserialize)]
struct PackageJson {
    version: String,
}

fn read_value(path: &Path) -> Result<Value, ManifestError> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ManifestError::NotFound(path.to_path_buf()),
        _ => ManifestError::Io(e),
    })?;
    serde_json::from_str(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

impl ApiPackageInfo {
    /// Read version and schemas from an installed package directory
    pub fn load(package_dir: &Path) -> Result<Self, ManifestError> {
        let package_json: PackageJson =
            serde_json::from_value(read_value(&package_dir.join("package.json"))?).map_err(
                |source| ManifestError::Parse {
                    path: package_dir.join("package.json"),
                    source,
                },
            )?;

        let schemas = ApiSchemas {
            capabilities: read_value(&package_dir.join(CAPABILITIES_SCHEMA))?,
            pbiviz: read_value(&package_dir.join(PBIVIZ_SCHEMA))?,
            string_resources: read_value(&package_dir.join(STRING_RESOURCES_SCHEMA))?,
            dependencies: read_value(&package_dir.join(DEPENDENCIES_SCHEMA))?,
        };

        debug!(
            "Read {} {} from {}",
            API_PACKAGE_NAME,
            package_json.version,
            package_dir.display()
        );

        Ok(ApiPackageInfo {
            version: package_json.version,
            schemas,
        })
    }
}
