//! Site and document library discovery

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;
use spk_core::{SpkError, SpkResult};
use tracing::debug;

use crate::client::{RequestClient, RequestSpec};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RootSite {
    site_collection: Option<SiteCollection>,
}

#[derive(Debug, Deserialize)]
struct SiteCollection {
    hostname: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IdOnly {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DriveList {
    value: Vec<DriveSummary>,
}

#[derive(Debug, Deserialize)]
struct DriveSummary {
    id: String,
    name: Option<String>,
}

/// Turns a site name (and optional library name) into a drive id
#[derive(Debug, Clone)]
pub struct SiteDriveResolver {
    client: RequestClient,
}

impl SiteDriveResolver {
    pub fn new(client: RequestClient) -> Self {
        Self { client }
    }

    /// Host name of the tenant's root site collection
    pub async fn root_site_hostname(&self) -> SpkResult<String> {
        let value = self
            .client
            .request(RequestSpec::get("/v1.0/sites/root"))
            .await
            .require_json("root site")?;
        let site: RootSite = decode(value, "root site")?;

        site.site_collection
            .and_then(|c| c.hostname)
            .ok_or_else(|| SpkError::MalformedResponse("root site: missing siteCollection.hostname".into()))
    }

    pub async fn site_id(&self, site_name: &str) -> SpkResult<String> {
        let hostname = self.root_site_hostname().await?;
        let url = format!(
            "/v1.0/sites/{hostname}:/sites/{}",
            utf8_percent_encode(site_name, NON_ALPHANUMERIC)
        );
        let context = format!("site {site_name}");
        let value = self.client.request(RequestSpec::get(url)).await.require_json(&context)?;
        let site: IdOnly = decode(value, &context)?;

        let id = site
            .id
            .ok_or_else(|| SpkError::MalformedResponse(format!("{context}: missing id")))?;
        debug!(site = site_name, site_id = %id, "resolved site");
        Ok(id)
    }

    pub async fn default_drive_id(&self, site_id: &str) -> SpkResult<String> {
        let url = format!("/v1.0/sites/{site_id}/drive");
        let context = format!("default drive of site {site_id}");
        let value = self.client.request(RequestSpec::get(url)).await.require_json(&context)?;
        let drive: IdOnly = decode(value, &context)?;

        drive
            .id
            .ok_or_else(|| SpkError::MalformedResponse(format!("{context}: missing id")))
    }

    /// Document library with exactly this display name
    pub async fn drive_id_by_name(&self, site_id: &str, drive_name: &str) -> SpkResult<String> {
        let url = format!("/v1.0/sites/{site_id}/drives");
        let context = format!("drives of site {site_id}");
        let value = self.client.request(RequestSpec::get(url)).await.require_json(&context)?;
        let drives: DriveList = decode(value, &context)?;

        drives
            .value
            .into_iter()
            .find(|d| d.name.as_deref() == Some(drive_name))
            .map(|d| d.id)
            .ok_or_else(|| SpkError::NotFound(format!("drive {drive_name:?} in site {site_id}")))
    }

    /// Site name to drive id; the default library unless `drive_name` is set
    pub async fn resolve(&self, site_name: &str, drive_name: Option<&str>) -> SpkResult<String> {
        let site_id = self.site_id(site_name).await?;
        let drive_id = match drive_name {
            Some(name) => self.drive_id_by_name(&site_id, name).await?,
            None => self.default_drive_id(&site_id).await?,
        };
        debug!(site = site_name, drive_id = %drive_id, "resolved drive");
        Ok(drive_id)
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: serde_json::Value, context: &str) -> SpkResult<T> {
    serde_json::from_value(value).map_err(|e| SpkError::MalformedResponse(format!("{context}: {e}")))
}
