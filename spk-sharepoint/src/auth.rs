//! Client-credentials token exchange

use chrono::{DateTime, Utc};
use oauth2::{
    basic::BasicClient, AuthType, ClientId, ClientSecret, RequestTokenError, Scope, TokenResponse,
    TokenUrl,
};
use reqwest::redirect;
use secrecy::{ExposeSecret, SecretString};
use spk_core::{SpkError, SpkResult};
use tracing::{debug, info};

use crate::client::Credentials;
use crate::config::ConnectorConfig;

const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Bearer token for Graph; never refreshed, a new token means a new connector
#[derive(Debug, Clone)]
pub struct AccessToken {
    token: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: SecretString::new(token.into()),
            expires_at,
        }
    }

    pub fn secret(&self) -> &SecretString {
        &self.token
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::Bearer(self.secret().clone())
    }
}

/// Token endpoint for the configured tenant
pub fn token_url(config: &ConnectorConfig) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        config.login_client_config().base_url,
        config.tenant_id
    )
}

/// Exchanges the app's client id and secret for a Graph access token
pub async fn request_token(config: &ConnectorConfig) -> SpkResult<AccessToken> {
    let login = config.login_client_config();
    let url = token_url(config);
    let token_uri = TokenUrl::new(url.clone())
        .map_err(|e| SpkError::Config(format!("invalid token endpoint {url}: {e}")))?;

    let client = BasicClient::new(ClientId::new(config.client_id.clone()))
        .set_client_secret(ClientSecret::new(config.client_secret.expose_secret().clone()))
        .set_auth_type(AuthType::RequestBody)
        .set_token_uri(token_uri);

    // The token endpoint must never redirect
    let http = reqwest::Client::builder()
        .redirect(redirect::Policy::none())
        .timeout(login.timeout)
        .danger_accept_invalid_certs(!login.verify_tls)
        .build()
        .map_err(|e| SpkError::Config(format!("Failed to set up HTTP client: {e}")))?;

    debug!(tenant = %config.tenant_id, client_id = %config.client_id, "requesting access token");
    let response = client
        .exchange_client_credentials()
        .add_scope(Scope::new(GRAPH_SCOPE.to_string()))
        .request_async(&http)
        .await
        .map_err(|e| match e {
            RequestTokenError::ServerResponse(err) => SpkError::Auth(format!(
                "Token exchange failed: {}{}",
                err.error(),
                err.error_description()
                    .map(|d| format!(": {d}"))
                    .unwrap_or_default()
            )),
            other => SpkError::Auth(format!("Token exchange failed: {other}")),
        })?;

    let expires_at = response
        .expires_in()
        .and_then(|d| chrono::Duration::from_std(d).ok())
        .map(|d| Utc::now() + d);

    info!(tenant = %config.tenant_id, expires_at = ?expires_at, "obtained access token");
    Ok(AccessToken::new(response.access_token().secret().clone(), expires_at))
}
