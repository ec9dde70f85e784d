//! Blob storage data-plane client.
//!
//! Bearer-token (Entra) auth only; no account keys anywhere. Uploads and
//! deletes carry the caller's storage-scoped token, and the delegation key
//! for SAS signing is requested with that same token.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::blocking::Client;
use tracing::debug;

use crate::azure::sas::{self, UserDelegationKey};
use crate::config::Config;
use crate::error::{Result, ShipError};

/// Uploads can be tens of megabytes on a slow uplink.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

pub struct BlobClient {
    client: Client,
    base_url: String,
    container: String,
    api_version: String,
    token: String,
}

impl BlobClient {
    pub fn new(config: &Config, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| ShipError::Config(format!("build http client: {err}")))?;

        Ok(Self {
            client,
            base_url: config.storage.base_url().trim_end_matches('/').to_string(),
            container: config.storage.container.clone(),
            api_version: config.storage.api_version.clone(),
            token: token.to_string(),
        })
    }

    fn blob_url(&self, blob_path: &str) -> String {
        format!("{}/{}/{}", self.base_url, self.container, blob_path)
    }

    /// PUT a block blob in one shot.
    pub fn upload(&self, blob_path: &str, content: Vec<u8>) -> Result<()> {
        debug!(blob_path, bytes = content.len(), "uploading blob");

        let response = self
            .client
            .put(self.blob_url(blob_path))
            .bearer_auth(&self.token)
            .header("x-ms-version", &self.api_version)
            .header("x-ms-blob-type", "BlockBlob")
            .header("Content-Type", "application/octet-stream")
            .body(content)
            .send()
            .map_err(|err| ShipError::Upload {
                status: 0,
                detail: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ShipError::Upload {
                status: status.as_u16(),
                detail: response.text().unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// DELETE a blob. A 404 counts as success so cleanup stays idempotent.
    pub fn delete(&self, blob_path: &str) -> Result<()> {
        debug!(blob_path, "deleting blob");

        let response = self
            .client
            .delete(self.blob_url(blob_path))
            .bearer_auth(&self.token)
            .header("x-ms-version", &self.api_version)
            .send()
            .map_err(|err| ShipError::Api {
                status: 0,
                code: "TransportError".to_string(),
                message: format!("delete {blob_path}: {err}"),
            })?;

        let status = response.status();
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            return Err(ShipError::Api {
                status: status.as_u16(),
                code: "BlobDeleteFailed".to_string(),
                message: response.text().unwrap_or_default(),
            });
        }
        Ok(())
    }

    /// Ask the service for a user delegation key covering `start..expiry`.
    pub fn user_delegation_key(
        &self,
        start: DateTime<Utc>,
        expiry: DateTime<Utc>,
    ) -> Result<UserDelegationKey> {
        let url = format!(
            "{}/?restype=service&comp=userdelegationkey",
            self.base_url
        );
        let body = format!(
            "<?xml version=\"1.0\" encoding=\"utf-8\"?><KeyInfo><Start>{}</Start><Expiry>{}</Expiry></KeyInfo>",
            sas::format_sas_time(start),
            sas::format_sas_time(expiry),
        );

        let response = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .header("x-ms-version", &self.api_version)
            .header("Content-Type", "application/xml")
            .body(body)
            .send()
            .map_err(|err| ShipError::Sign(format!("key issuance request: {err}")))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|err| ShipError::Sign(format!("key issuance response: {err}")))?;
        if !status.is_success() {
            return Err(ShipError::Sign(format!(
                "key issuance failed (HTTP {status}): {text}"
            )));
        }

        sas::parse_user_delegation_key(&text)
    }
}
