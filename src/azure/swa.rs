//! Static Web Apps control-plane operations.
//!
//! Each published app is one `Microsoft.Web/staticSites` resource named after
//! its slug, with the display name and description kept in ARM tags. Content
//! is pushed through the `zipdeploy` child operation, which fetches the
//! archive itself from a signed blob URL.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use crate::azure::rest::ArmClient;
use crate::config::Config;
use crate::error::{Result, ShipError};

/// Provider label recorded by the ingestion backend for each deployment.
pub const ZIPDEPLOY_PROVIDER: &str = "siteship";

pub const TAG_APP_NAME: &str = "appName";
pub const TAG_APP_DESCRIPTION: &str = "appDescription";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticSite {
    /// Full ARM resource id.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub properties: SiteProperties,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProperties {
    #[serde(default)]
    pub default_hostname: String,
}

impl StaticSite {
    /// Public URL of the site.
    #[must_use]
    pub fn url(&self) -> String {
        format!("https://{}", self.properties.default_hostname)
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        self.tags.get(TAG_APP_NAME).map_or(&self.name, String::as_str)
    }

    #[must_use]
    pub fn description(&self) -> &str {
        self.tags
            .get(TAG_APP_DESCRIPTION)
            .map_or("", String::as_str)
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    value: Vec<StaticSite>,
}

#[derive(Debug, Deserialize)]
struct SecretsResponse {
    properties: SecretsProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SecretsProperties {
    api_key: String,
}

pub struct SwaClient {
    arm: ArmClient,
    subscription_id: String,
    resource_group: String,
    api_version: String,
    zipdeploy_api_version: String,
    location: String,
    sku_name: String,
    sku_tier: String,
}

impl SwaClient {
    #[must_use]
    pub fn new(config: &Config, arm_token: &str) -> Self {
        Self {
            arm: ArmClient::new(&config.azure.arm_endpoint, arm_token),
            subscription_id: config.azure.subscription_id.clone(),
            resource_group: config.azure.resource_group.clone(),
            api_version: config.site.api_version.clone(),
            zipdeploy_api_version: config.site.zipdeploy_api_version.clone(),
            location: config.azure.location.clone(),
            sku_name: config.site.sku_name.clone(),
            sku_tier: config.site.sku_tier.clone(),
        }
    }

    fn site_path(&self, slug: &str) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/staticSites/{}",
            self.subscription_id, self.resource_group, slug
        )
    }

    fn collection_path(&self) -> String {
        format!(
            "/subscriptions/{}/resourceGroups/{}/providers/Microsoft.Web/staticSites",
            self.subscription_id, self.resource_group
        )
    }

    pub fn create(&self, slug: &str, app_name: &str, app_description: &str) -> Result<StaticSite> {
        info!(slug, "creating static web app");
        let body = json!({
            "location": self.location,
            "sku": { "name": self.sku_name, "tier": self.sku_tier },
            "properties": {},
            "tags": {
                TAG_APP_NAME: app_name,
                TAG_APP_DESCRIPTION: app_description,
            },
        });
        let value = require_body(
            self.arm.put(&self.site_path(slug), &self.api_version, &body)?,
            "create static site",
        )?;
        Ok(serde_json::from_value(value)?)
    }

    pub fn get(&self, slug: &str) -> Result<StaticSite> {
        let value = self
            .arm
            .get(&self.site_path(slug), &self.api_version)
            .map_err(|err| missing_site(slug, err))?;
        Ok(serde_json::from_value(require_body(value, "get static site")?)?)
    }

    pub fn list(&self) -> Result<Vec<StaticSite>> {
        let value = require_body(
            self.arm.get(&self.collection_path(), &self.api_version)?,
            "list static sites",
        )?;
        let response: ListResponse = serde_json::from_value(value)?;
        Ok(response.value)
    }

    pub fn delete(&self, slug: &str) -> Result<()> {
        info!(slug, "deleting static web app");
        self.arm
            .delete(&self.site_path(slug), &self.api_version)
            .map_err(|err| missing_site(slug, err))?;
        Ok(())
    }

    pub fn update_tags(&self, slug: &str, tags: &BTreeMap<String, String>) -> Result<StaticSite> {
        let body = json!({ "tags": tags });
        let value = self
            .arm
            .patch(&self.site_path(slug), &self.api_version, &body)
            .map_err(|err| missing_site(slug, err))?;
        Ok(serde_json::from_value(require_body(value, "update tags")?)?)
    }

    /// The site's deployment secret, needed by some external CI integrations.
    pub fn deployment_token(&self, slug: &str) -> Result<String> {
        let path = format!("{}/listSecrets", self.site_path(slug));
        let value = self
            .arm
            .post(&path, &self.api_version, None)
            .map_err(|err| missing_site(slug, err))?;
        let response: SecretsResponse =
            serde_json::from_value(require_body(value, "list secrets")?)?;
        Ok(response.properties.api_key)
    }

    /// Point the ingestion backend at a signed archive URL. Both 200 and 202
    /// are success; 202 just means the build is still rolling out.
    pub fn zip_deploy(&self, slug: &str, app_zip_url: &str) -> Result<()> {
        info!(slug, "requesting zip deployment");
        let body = json!({
            "properties": {
                "appZipUrl": app_zip_url,
                "provider": ZIPDEPLOY_PROVIDER,
            },
        });
        let path = format!("{}/zipdeploy", self.site_path(slug));

        match self.arm.post(&path, &self.zipdeploy_api_version, Some(&body)) {
            Ok(_) => Ok(()),
            Err(ShipError::Api {
                status,
                code,
                message,
            }) => Err(ShipError::Ingestion {
                status,
                code,
                message,
            }),
            Err(err) => Err(err),
        }
    }
}

fn require_body(value: Option<Value>, what: &str) -> Result<Value> {
    value.ok_or_else(|| ShipError::Api {
        status: 202,
        code: "EmptyResponse".to_string(),
        message: format!("{what}: expected a response body"),
    })
}

/// A 404 with `ResourceNotFound` means the site does not exist; other 404s
/// (for example a missing resource group) keep their original ARM error.
fn missing_site(slug: &str, err: ShipError) -> ShipError {
    match err {
        ShipError::Api {
            status: 404,
            ref code,
            ..
        } if code == "ResourceNotFound" => {
            ShipError::NotFound(format!("static web app '{slug}'"))
        }
        other => other,
    }
}
