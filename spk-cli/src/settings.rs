// SPDX-License-Identifier: AGPL-3.0-or-later
//! Connector settings from a TOML file plus `SPK_*` environment overrides

use secrecy::SecretString;
use serde::Deserialize;
use spk_core::{SpkError, SpkResult};
use spk_sharepoint::ConnectorConfig;
use std::path::{Path, PathBuf};

/// Default config file: `<config_dir>/spk/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "spk", "spk").map(|d| d.config_dir().join("config.toml"))
}

/// Every field optional so the environment can fill the gaps
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    tenant_id: Option<String>,
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    site: Option<String>,
    drive: Option<String>,
    prefix: Option<String>,
    timeout_secs: Option<u64>,
    verify_tls: Option<bool>,
    graph_url: Option<String>,
    login_url: Option<String>,
}

impl FileSettings {
    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        let overrides = [
            ("SPK_TENANT_ID", &mut self.tenant_id),
            ("SPK_CLIENT_ID", &mut self.client_id),
            ("SPK_SITE", &mut self.site),
            ("SPK_DRIVE", &mut self.drive),
            ("SPK_PREFIX", &mut self.prefix),
        ];
        for (key, field) in overrides {
            if let Some(value) = env(key).filter(|v| !v.is_empty()) {
                *field = Some(value);
            }
        }
        if let Some(secret) = env("SPK_CLIENT_SECRET").filter(|v| !v.is_empty()) {
            self.client_secret = Some(SecretString::new(secret));
        }
    }

    fn into_config(self) -> SpkResult<ConnectorConfig> {
        fn required<T>(value: Option<T>, key: &str, env: &str) -> SpkResult<T> {
            value.ok_or_else(|| SpkError::Config(format!("missing {key} (set it in the config file or {env})")))
        }

        let defaults = ConnectorConfig::new("", "", "", "");
        let config = ConnectorConfig {
            tenant_id: required(self.tenant_id, "tenant_id", "SPK_TENANT_ID")?,
            client_id: required(self.client_id, "client_id", "SPK_CLIENT_ID")?,
            client_secret: required(self.client_secret, "client_secret", "SPK_CLIENT_SECRET")?,
            site: required(self.site, "site", "SPK_SITE")?,
            drive: self.drive,
            prefix: self.prefix,
            timeout_secs: self.timeout_secs.unwrap_or(defaults.timeout_secs),
            verify_tls: self.verify_tls.unwrap_or(defaults.verify_tls),
            graph_url: self.graph_url,
            login_url: self.login_url,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Loads settings from `path` (or the default location) and the process environment.
///
/// An explicit path must exist; the default location is optional.
pub fn load(path: Option<&Path>) -> SpkResult<ConnectorConfig> {
    load_with(path, default_config_path(), |key| std::env::var(key).ok())
}

fn load_with(
    explicit: Option<&Path>,
    fallback: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> SpkResult<ConnectorConfig> {
    let mut settings = match (explicit, fallback) {
        (Some(path), _) => read_file(path)?,
        (None, Some(path)) if path.exists() => read_file(&path)?,
        _ => FileSettings::default(),
    };
    settings.apply_env(env);
    settings.into_config()
}

fn read_file(path: &Path) -> SpkResult<FileSettings> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| SpkError::Config(format!("cannot read {}: {e}", path.display())))?;
    toml::from_str(&raw).map_err(|e| SpkError::Config(format!("invalid config {}: {e}", path.display())))
}
