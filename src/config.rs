//! Configuration for siteship.
//!
//! Layered the usual way: built-in defaults, then an optional TOML file
//! (`--config`, `SITESHIP_CONFIG`, or the global config dir), then
//! `SITESHIP_*` environment overrides. `validate()` is separate from loading
//! so commands that never touch Azure (e.g. `auth logout`) still run with an
//! incomplete config.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShipError};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub azure: AzureConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub site: SiteConfig,
}

/// Identity and ARM-side settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Entra tenant the app registration lives in.
    #[serde(default)]
    pub tenant_id: String,
    /// Public client (device-code) app registration.
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub subscription_id: String,
    #[serde(default = "default_resource_group")]
    pub resource_group: String,
    #[serde(default = "default_location")]
    pub location: String,
    #[serde(default = "default_arm_endpoint")]
    pub arm_endpoint: String,
    #[serde(default = "default_entra_endpoint")]
    pub entra_endpoint: String,
    #[serde(default = "default_arm_scope")]
    pub arm_scope: String,
    #[serde(default = "default_storage_scope")]
    pub storage_scope: String,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            tenant_id: String::new(),
            client_id: String::new(),
            subscription_id: String::new(),
            resource_group: default_resource_group(),
            location: default_location(),
            arm_endpoint: default_arm_endpoint(),
            entra_endpoint: default_entra_endpoint(),
            arm_scope: default_arm_scope(),
            storage_scope: default_storage_scope(),
        }
    }
}

/// Blob storage settings. The endpoint override exists for the storage
/// emulator and for tests; when unset the account's public endpoint is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub account: String,
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default = "default_storage_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            account: String::new(),
            container: default_container(),
            api_version: default_storage_api_version(),
            endpoint: None,
        }
    }
}

impl StorageConfig {
    /// Base URL of the blob account, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            format!("https://{}.blob.core.windows.net", self.account)
        })
    }
}

/// Static Web App resource settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_swa_api_version")]
    pub api_version: String,
    #[serde(default = "default_zipdeploy_api_version")]
    pub zipdeploy_api_version: String,
    #[serde(default = "default_sku")]
    pub sku_name: String,
    #[serde(default = "default_sku")]
    pub sku_tier: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            api_version: default_swa_api_version(),
            zipdeploy_api_version: default_zipdeploy_api_version(),
            sku_name: default_sku(),
            sku_tier: default_sku(),
        }
    }
}

fn default_resource_group() -> String {
    "rg-published-apps".to_string()
}

fn default_location() -> String {
    "westeurope".to_string()
}

fn default_arm_endpoint() -> String {
    "https://management.azure.com".to_string()
}

fn default_entra_endpoint() -> String {
    "https://login.microsoftonline.com".to_string()
}

fn default_arm_scope() -> String {
    "https://management.azure.com/.default offline_access".to_string()
}

fn default_storage_scope() -> String {
    "https://storage.azure.com/.default offline_access".to_string()
}

fn default_container() -> String {
    "app-content".to_string()
}

fn default_storage_api_version() -> String {
    "2024-11-04".to_string()
}

fn default_swa_api_version() -> String {
    "2022-09-01".to_string()
}

fn default_zipdeploy_api_version() -> String {
    "2024-04-01".to_string()
}

fn default_sku() -> String {
    "Free".to_string()
}

impl Config {
    /// Load config: defaults, then a TOML patch, then env overrides.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| std::env::var("SITESHIP_CONFIG").ok().map(PathBuf::from));

        if let Some(path) = explicit {
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else if let Some(global) = Self::load_global()? {
            config.merge_patch(global);
        }

        config.apply_env_overrides();

        Ok(config)
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        let Some(dir) = dirs::config_dir() else {
            return Ok(None);
        };
        Self::load_patch(&dir.join("siteship/config.toml"))
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| ShipError::Config(format!("read config {}: {err}", path.display())))?;
        let patch = toml::from_str(&raw)
            .map_err(|err| ShipError::Config(format!("parse config {}: {err}", path.display())))?;
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.azure {
            self.azure.merge(patch);
        }
        if let Some(patch) = patch.storage {
            self.storage.merge(patch);
        }
        if let Some(patch) = patch.site {
            self.site.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Some(value) = env_string("SITESHIP_TENANT_ID") {
            self.azure.tenant_id = value;
        }
        if let Some(value) = env_string("SITESHIP_CLIENT_ID") {
            self.azure.client_id = value;
        }
        if let Some(value) = env_string("SITESHIP_SUBSCRIPTION_ID") {
            self.azure.subscription_id = value;
        }
        if let Some(value) = env_string("SITESHIP_RESOURCE_GROUP") {
            self.azure.resource_group = value;
        }
        if let Some(value) = env_string("SITESHIP_LOCATION") {
            self.azure.location = value;
        }
        if let Some(value) = env_string("SITESHIP_ARM_ENDPOINT") {
            self.azure.arm_endpoint = value;
        }
        if let Some(value) = env_string("SITESHIP_ENTRA_ENDPOINT") {
            self.azure.entra_endpoint = value;
        }
        if let Some(value) = env_string("SITESHIP_STORAGE_ACCOUNT") {
            self.storage.account = value;
        }
        if let Some(value) = env_string("SITESHIP_CONTAINER_NAME") {
            self.storage.container = value;
        }
        if let Some(value) = env_string("SITESHIP_STORAGE_API_VERSION") {
            self.storage.api_version = value;
        }
        if let Some(value) = env_string("SITESHIP_BLOB_ENDPOINT") {
            self.storage.endpoint = Some(value);
        }
        if let Some(value) = env_string("SITESHIP_SWA_API_VERSION") {
            self.site.api_version = value;
        }
    }

    /// Check that every field a deploy needs is present.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.azure.tenant_id.is_empty() {
            missing.push("azure.tenant_id (SITESHIP_TENANT_ID)");
        }
        if self.azure.client_id.is_empty() {
            missing.push("azure.client_id (SITESHIP_CLIENT_ID)");
        }
        if self.azure.subscription_id.is_empty() {
            missing.push("azure.subscription_id (SITESHIP_SUBSCRIPTION_ID)");
        }
        if self.storage.account.is_empty() {
            missing.push("storage.account (SITESHIP_STORAGE_ACCOUNT)");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ShipError::MissingConfig(missing.join(", ")))
        }
    }

    /// Check only the fields the device-code sign-in needs, so `auth login`
    /// works before the deployment target is configured.
    pub fn validate_auth(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.azure.tenant_id.is_empty() {
            missing.push("azure.tenant_id (SITESHIP_TENANT_ID)");
        }
        if self.azure.client_id.is_empty() {
            missing.push("azure.client_id (SITESHIP_CLIENT_ID)");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ShipError::MissingConfig(missing.join(", ")))
        }
    }
}

/// Partial config parsed from a TOML file; every field optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigPatch {
    pub azure: Option<AzurePatch>,
    pub storage: Option<StoragePatch>,
    pub site: Option<SitePatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AzurePatch {
    pub tenant_id: Option<String>,
    pub client_id: Option<String>,
    pub subscription_id: Option<String>,
    pub resource_group: Option<String>,
    pub location: Option<String>,
    pub arm_endpoint: Option<String>,
    pub entra_endpoint: Option<String>,
    pub arm_scope: Option<String>,
    pub storage_scope: Option<String>,
}

impl AzureConfig {
    fn merge(&mut self, patch: AzurePatch) {
        if let Some(value) = patch.tenant_id {
            self.tenant_id = value;
        }
        if let Some(value) = patch.client_id {
            self.client_id = value;
        }
        if let Some(value) = patch.subscription_id {
            self.subscription_id = value;
        }
        if let Some(value) = patch.resource_group {
            self.resource_group = value;
        }
        if let Some(value) = patch.location {
            self.location = value;
        }
        if let Some(value) = patch.arm_endpoint {
            self.arm_endpoint = value;
        }
        if let Some(value) = patch.entra_endpoint {
            self.entra_endpoint = value;
        }
        if let Some(value) = patch.arm_scope {
            self.arm_scope = value;
        }
        if let Some(value) = patch.storage_scope {
            self.storage_scope = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoragePatch {
    pub account: Option<String>,
    pub container: Option<String>,
    pub api_version: Option<String>,
    pub endpoint: Option<String>,
}

impl StorageConfig {
    fn merge(&mut self, patch: StoragePatch) {
        if let Some(value) = patch.account {
            self.account = value;
        }
        if let Some(value) = patch.container {
            self.container = value;
        }
        if let Some(value) = patch.api_version {
            self.api_version = value;
        }
        if let Some(value) = patch.endpoint {
            self.endpoint = Some(value);
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SitePatch {
    pub api_version: Option<String>,
    pub zipdeploy_api_version: Option<String>,
    pub sku_name: Option<String>,
    pub sku_tier: Option<String>,
}

impl SiteConfig {
    fn merge(&mut self, patch: SitePatch) {
        if let Some(value) = patch.api_version {
            self.api_version = value;
        }
        if let Some(value) = patch.zipdeploy_api_version {
            self.zipdeploy_api_version = value;
        }
        if let Some(value) = patch.sku_name {
            self.sku_name = value;
        }
        if let Some(value) = patch.sku_tier {
            self.sku_tier = value;
        }
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
