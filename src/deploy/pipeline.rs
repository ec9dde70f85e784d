//! The deploy pipeline.
//!
//! One linear pass per invocation: filter the folder, encode the archive,
//! upload it to a per-invocation temp blob, sign a one-hour read SAS, hand
//! the URL to the ingestion backend, and delete the temp blob. The delete
//! runs on every exit path after the upload via a drop guard; a cleanup
//! failure is logged and never replaces the error that got us there.
//!
//! No retries here. A failed upload, signing call, or ingestion call
//! surfaces immediately and the caller decides whether to run the whole
//! deploy again.

use std::path::Path;

use chrono::{Duration, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::azure::sas::SasRequest;
use crate::azure::{blob_sas_url, BlobClient, SwaClient};
use crate::config::Config;
use crate::deploy::archive::{encode_archive, read_file_entries};
use crate::deploy::filter::collect_files;
use crate::deploy::manifest::{self, generate_slug, DeployManifest};
use crate::error::{Result, ShipError};

/// How long the ingestion backend gets to fetch the archive.
const SAS_VALIDITY_HOURS: i64 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct DeployOutcome {
    pub slug: String,
    pub url: String,
    pub resource_id: String,
    pub file_count: usize,
    pub archive_bytes: usize,
    /// True when this run created the site (first deploy).
    pub created: bool,
}

/// Deletes the temp blob when dropped, so every exit path after the upload
/// goes through the same cleanup.
struct TempBlobGuard<'a> {
    blob: &'a BlobClient,
    path: String,
}

impl Drop for TempBlobGuard<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.blob.delete(&self.path) {
            warn!(path = %self.path, error = %err, "temp blob cleanup failed");
        }
    }
}

/// Deploy `folder`. First deploys need `app_name` and `app_description`;
/// redeploys read the slug from `.deploy.json` instead.
pub fn deploy_folder(
    config: &Config,
    arm_token: &str,
    storage_token: &str,
    folder: &Path,
    app_name: Option<&str>,
    app_description: Option<&str>,
) -> Result<DeployOutcome> {
    let existing = manifest::read_manifest(folder)?;

    let files = collect_files(folder)?;
    if files.is_empty() {
        return Err(ShipError::Filter(format!(
            "no deployable files found in {}",
            folder.display()
        )));
    }

    let entries = read_file_entries(folder, &files)?;
    let archive = encode_archive(&entries)?;
    let archive_bytes = archive.len();
    debug!(
        files = files.len(),
        bytes = archive_bytes,
        sha256 = %hex::encode(Sha256::digest(&archive)),
        "archive encoded"
    );

    // Resolve slug and required metadata before any network call.
    let first_deploy = existing.is_none();
    let (slug, name, description) = match &existing {
        Some(manifest) => (
            manifest.app_slug.clone(),
            manifest.app_name.clone(),
            manifest.app_description.clone(),
        ),
        None => {
            let (Some(name), Some(description)) = (app_name, app_description) else {
                return Err(ShipError::Manifest(
                    "first deploy needs an app name and description; \
                     redeploys read them from .deploy.json"
                        .to_string(),
                ));
            };
            let slug = generate_slug(name);
            if slug.is_empty() {
                return Err(ShipError::Manifest(
                    "app name must contain at least one letter or digit".to_string(),
                ));
            }
            (slug, name.to_string(), description.to_string())
        }
    };

    let swa = SwaClient::new(config, arm_token);
    let blob = BlobClient::new(config, storage_token)?;

    let site = if first_deploy {
        swa.create(&slug, &name, &description)?
    } else {
        swa.get(&slug)?
    };

    transfer_archive(config, &swa, &blob, &slug, archive)?;

    if first_deploy {
        manifest::write_manifest(
            folder,
            &DeployManifest {
                app_slug: slug.clone(),
                app_name: name,
                app_description: description,
                resource_id: site.id.clone(),
            },
        )?;
    }

    info!(slug, url = %site.url(), "deploy complete");
    Ok(DeployOutcome {
        slug,
        url: site.url(),
        resource_id: site.id,
        file_count: files.len(),
        archive_bytes,
        created: first_deploy,
    })
}

/// Upload, sign, ingest. The temp blob is removed on all paths out of this
/// function, success and failure alike.
fn transfer_archive(
    config: &Config,
    swa: &SwaClient,
    blob: &BlobClient,
    slug: &str,
    archive: Vec<u8>,
) -> Result<()> {
    let temp_path = format!("_deploy-temp/{}.zip", Utc::now().timestamp_millis());

    blob.upload(&temp_path, archive)?;
    let guard = TempBlobGuard {
        blob,
        path: temp_path,
    };

    let start = Utc::now();
    let expiry = start + Duration::hours(SAS_VALIDITY_HOURS);
    let key = blob.user_delegation_key(start, expiry)?;
    let sas_url = blob_sas_url(
        &config.storage.base_url(),
        &SasRequest {
            account: &config.storage.account,
            container: &config.storage.container,
            blob_path: &guard.path,
            start,
            expiry,
            api_version: &config.storage.api_version,
        },
        &key,
    )?;

    swa.zip_deploy(slug, &sas_url)?;
    drop(guard);
    Ok(())
}
