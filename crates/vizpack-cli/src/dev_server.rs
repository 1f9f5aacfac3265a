//! Development server block of the bundler configuration

use crate::bundler::config::BundlerConfig;
use crate::errors::BuildError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;
use vizpack_config::{ProjectPaths, ServerSettings};
use vizpack_logger as logger;

/// TLS files and passphrase handed to the dev server
#[derive(Serialize, Debug, Clone, PartialEq, Eq, Default)]
pub struct TlsMaterial {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pfx: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,
}

impl TlsMaterial {
    /// A key/certificate pair or a pfx bundle
    pub fn is_usable(&self) -> bool {
        (self.key.is_some() && self.cert.is_some()) || self.pfx.is_some()
    }
}

#[async_trait]
pub trait CertificateProvider: Send + Sync {
    async fn resolve(&self, project_root: &Path) -> Result<TlsMaterial, BuildError>;
}

/// Certificates from the paths in [`ServerSettings`], optionally
/// generated by `certificate_command` when none are present
#[derive(Debug, Clone)]
pub struct FileCertificateProvider {
    settings: ServerSettings,
}

impl FileCertificateProvider {
    pub fn new(settings: &ServerSettings) -> Self {
        Self {
            settings: settings.clone(),
        }
    }

    async fn existing(path: PathBuf) -> Option<PathBuf> {
        tokio::fs::metadata(&path)
            .await
            .is_ok_and(|m| m.is_file())
            .then_some(path)
    }

    async fn lookup(&self, project_root: &Path) -> TlsMaterial {
        TlsMaterial {
            key: Self::existing(project_root.join(&self.settings.private_key)).await,
            cert: Self::existing(project_root.join(&self.settings.certificate)).await,
            pfx: Self::existing(project_root.join(&self.settings.pfx)).await,
            passphrase: self.settings.passphrase.clone(),
        }
    }

    async fn generate(&self, project_root: &Path, argv: &[String]) -> Result<(), BuildError> {
        let Some((program, args)) = argv.split_first() else {
            return Err(BuildError::Certificate("certificate command is empty".to_string()));
        };

        for file in [&self.settings.private_key, &self.settings.certificate] {
            let target = project_root.join(file);
            let Some(dir) = target.parent() else {
                continue;
            };
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                let message = format!("failed to create {}: {}", dir.display(), e);
                return Err(BuildError::Certificate(message));
            }
        }

        logger::step(&format!("Generating development certificate with {}", program));
        let output = Command::new(program)
            .args(args)
            .current_dir(project_root)
            .output()
            .await
            .map_err(|e| BuildError::Certificate(format!("failed to run {}: {}", program, e)))?;
        logger::capture_output(&argv.join(" "), &output);

        if !output.status.success() {
            return Err(BuildError::Certificate(format!(
                "{} exited with {:?}: {}",
                program,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CertificateProvider for FileCertificateProvider {
    async fn resolve(&self, project_root: &Path) -> Result<TlsMaterial, BuildError> {
        let material = self.lookup(project_root).await;
        if material.is_usable() {
            return Ok(material);
        }

        let Some(argv) = &self.settings.certificate_command else {
            return Err(BuildError::Certificate(format!(
                "no certificate at {} and no certificate command configured",
                project_root.join(&self.settings.certificate).display()
            )));
        };

        self.generate(project_root, argv).await?;
        let material = self.lookup(project_root).await;
        if material.is_usable() {
            Ok(material)
        } else {
            Err(BuildError::Certificate(
                "certificate command did not produce a key/certificate pair or pfx".to_string(),
            ))
        }
    }
}

/// Merge server options onto the existing `devServer` block. New keys
/// win; everything else already there is kept. Without `tls` any
/// existing `https` entry is left alone.
pub fn merge_dev_server(
    bundler: &mut BundlerConfig,
    tls: Option<&TlsMaterial>,
    port: u16,
    content_base: &Path,
    public_path: &str,
) -> Result<(), BuildError> {
    let mut overrides = vec![
        ("port", json!(port)),
        ("contentBase", json!(content_base)),
        ("publicPath", Value::String(public_path.to_string())),
    ];
    if let Some(tls) = tls {
        overrides.push(("https", serde_json::to_value(tls)?));
    }
    for (key, value) in overrides {
        bundler.dev_server.insert(key.to_string(), value);
    }
    Ok(())
}

/// Resolve certificates and merge the dev server block
///
/// Only a dev-mode run serves anything, so a production run that cannot
/// resolve certificates warns and leaves `https` out.
pub async fn configure_dev_server(
    bundler: &mut BundlerConfig,
    certificates: &dyn CertificateProvider,
    port: Option<u16>,
    dev_mode: bool,
    server: &ServerSettings,
    paths: &ProjectPaths,
) -> Result<(), BuildError> {
    let tls = match certificates.resolve(&paths.root).await {
        Ok(tls) => Some(tls),
        Err(e) if !dev_mode => {
            logger::warn(&format!("Dev server left without TLS: {}", e));
            None
        }
        Err(e) => return Err(e),
    };
    let port = port.unwrap_or(server.port);
    debug!("Dev server on port {} serving {}", port, paths.drop.display());
    merge_dev_server(
        bundler,
        tls.as_ref(),
        port,
        &paths.drop,
        &server.assets_route,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use vizpack_config::Settings;

    fn tls() -> TlsMaterial {
        TlsMaterial {
            key: Some(PathBuf::from("/p/certs/key.key")),
            cert: Some(PathBuf::from("/p/certs/cert.crt")),
            pfx: None,
            passphrase: Some("secret".to_string()),
        }
    }

    #[test]
    fn test_merge_preserves_unrelated_fields() {
        let mut bundler = BundlerConfig::default_base();
        bundler.dev_server.insert("open".to_string(), json!(true));
        bundler.dev_server.insert("port".to_string(), json!(3000));
        bundler
            .dev_server
            .insert("publicPath".to_string(), json!("/old"));

        let drop = Path::new("/p/.tmp/drop");
        let merged = merge_dev_server(&mut bundler, Some(&tls()), 8080, drop, "/assets");
        assert!(merged.is_ok());

        let server = &bundler.dev_server;
        assert_eq!(server["open"], json!(true));
        assert_eq!(server["compress"], json!(true));
        assert_eq!(server["port"], json!(8080));
        assert_eq!(server["contentBase"], json!("/p/.tmp/drop"));
        assert_eq!(server["publicPath"], json!("/assets"));
        assert_eq!(server["https"]["key"], json!("/p/certs/key.key"));
        assert_eq!(server["https"]["passphrase"], json!("secret"));
        assert!(server["https"].get("pfx").is_none());
    }

    struct FixedCertificates;

    #[async_trait]
    impl CertificateProvider for FixedCertificates {
        async fn resolve(&self, _project_root: &Path) -> Result<TlsMaterial, BuildError> {
            Ok(tls())
        }
    }

    struct NoCertificates;

    #[async_trait]
    impl CertificateProvider for NoCertificates {
        async fn resolve(&self, _project_root: &Path) -> Result<TlsMaterial, BuildError> {
            Err(BuildError::Certificate("nothing here".to_string()))
        }
    }

    #[tokio::test]
    async fn test_missing_certificates_only_fail_dev_mode() {
        let settings = Settings::default();
        let paths = settings.project_paths(Path::new("/p"));

        let mut bundler = BundlerConfig::default_base();
        let result = configure_dev_server(
            &mut bundler,
            &NoCertificates,
            None,
            false,
            &settings.server,
            &paths,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(bundler.dev_server["port"], json!(8080));
        assert!(bundler.dev_server.get("https").is_none());

        let result = configure_dev_server(
            &mut bundler,
            &NoCertificates,
            None,
            true,
            &settings.server,
            &paths,
        )
        .await;
        assert!(matches!(result, Err(BuildError::Certificate(_))));
    }

    #[tokio::test]
    async fn test_port_falls_back_to_settings() {
        let settings = Settings::default();
        let paths = settings.project_paths(Path::new("/p"));
        let mut bundler = BundlerConfig::default_base();

        let result = configure_dev_server(
            &mut bundler,
            &FixedCertificates,
            None,
            true,
            &settings.server,
            &paths,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(bundler.dev_server["port"], json!(8080));

        let result = configure_dev_server(
            &mut bundler,
            &FixedCertificates,
            Some(9000),
            true,
            &settings.server,
            &paths,
        )
        .await;
        assert!(result.is_ok());
        assert_eq!(bundler.dev_server["port"], json!(9000));
    }

    #[tokio::test]
    async fn test_file_provider_finds_existing_pair() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let server = ServerSettings::default();
        let key = dir.path().join(&server.private_key);
        let cert = dir.path().join(&server.certificate);
        assert!(key.parent().is_some_and(|p| fs::create_dir_all(p).is_ok()));
        assert!(fs::write(&key, "key").is_ok());
        assert!(fs::write(&cert, "cert").is_ok());

        let material = FileCertificateProvider::new(&server).resolve(dir.path()).await;
        assert!(material
            .as_ref()
            .is_ok_and(|m| m.key.as_ref() == Some(&key) && m.cert.as_ref() == Some(&cert)));
        assert!(material.is_ok_and(|m| m.pfx.is_none()));
    }

    #[tokio::test]
    async fn test_file_provider_without_certificates_or_command() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let server = ServerSettings {
            certificate_command: None,
            ..ServerSettings::default()
        };
        let provider = FileCertificateProvider::new(&server);
        let result = provider.resolve(dir.path()).await;
        assert!(matches!(result, Err(BuildError::Certificate(_))));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_file_provider_runs_certificate_command() {
        let Ok(dir) = TempDir::new() else {
            return;
        };
        let server = ServerSettings {
            certificate_command: Some(vec![
                "sh".to_string(),
                "-c".to_string(),
                "echo pfx > certs/PowerBICustomVisualTest_public.pfx".to_string(),
            ]),
            ..ServerSettings::default()
        };

        let material = FileCertificateProvider::new(&server).resolve(dir.path()).await;
        assert!(material.is_ok_and(|m| m.pfx.is_some() && m.key.is_none()));
    }
}
