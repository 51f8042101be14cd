//! Connector configuration

use secrecy::SecretString;
use serde::Deserialize;
use spk_core::{SpkError, SpkResult};
use std::time::Duration;

pub const GRAPH_BASE_URL: &str = "https://graph.microsoft.com";
pub const LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const MAX_REDIRECTS: usize = 10;

/// HTTP transport settings for one base address
#[derive(Debug, Clone)]
pub struct GraphClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub verify_tls: bool,
    pub max_redirects: usize,
    pub user_agent: String,
}

impl Default for GraphClientConfig {
    fn default() -> Self {
        Self {
            base_url: GRAPH_BASE_URL.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            verify_tls: true,
            max_redirects: MAX_REDIRECTS,
            user_agent: concat!("spk/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl GraphClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

/// Everything needed to open a connector, fixed for its lifetime
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: SecretString,
    /// Site name as it appears in `/sites/{name}`
    pub site: String,
    /// Document library name; the site's default drive when unset
    #[serde(default)]
    pub drive: Option<String>,
    /// Folder that acts as the root for every path
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    #[serde(default)]
    pub graph_url: Option<String>,
    #[serde(default)]
    pub login_url: Option<String>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_verify_tls() -> bool {
    true
}

impl ConnectorConfig {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        site: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            site: site.into(),
            drive: None,
            prefix: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verify_tls: true,
            graph_url: None,
            login_url: None,
        }
    }

    pub fn with_drive(mut self, drive: impl Into<String>) -> Self {
        self.drive = Some(drive.into());
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn validate(&self) -> SpkResult<()> {
        let required = [
            ("tenant_id", &self.tenant_id),
            ("client_id", &self.client_id),
            ("site", &self.site),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(SpkError::Config(format!("{field} must not be empty")));
            }
        }
        if self.timeout_secs == 0 {
            return Err(SpkError::Config("timeout_secs must be positive".into()));
        }
        Ok(())
    }

    /// Transport settings for Graph calls
    pub fn graph_client_config(&self) -> GraphClientConfig {
        self.client_config(self.graph_url.as_deref().unwrap_or(GRAPH_BASE_URL))
    }

    /// Transport settings for the token endpoint
    pub fn login_client_config(&self) -> GraphClientConfig {
        self.client_config(self.login_url.as_deref().unwrap_or(LOGIN_BASE_URL))
    }

    fn client_config(&self, base_url: &str) -> GraphClientConfig {
        GraphClientConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(self.timeout_secs),
            verify_tls: self.verify_tls,
            ..GraphClientConfig::default()
        }
    }
}
