//! The `.deploy.json` manifest.
//!
//! Written into the deploy folder after a first deploy so later runs can
//! redeploy without re-asking for the app name. The file itself is on the
//! deny list, so it never ends up inside the archive.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ShipError};

pub const MANIFEST_NAME: &str = ".deploy.json";

/// Slugs feed DNS labels and resource names, so the cap stays well under
/// the 63-character label limit.
const SLUG_MAX_LEN: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployManifest {
    pub app_slug: String,
    pub app_name: String,
    pub app_description: String,
    /// Full ARM resource id of the Static Web App.
    pub resource_id: String,
}

/// Derive a URL-safe slug from a display name.
///
/// Lowercases, maps anything outside `[a-z0-9-]` to a dash, collapses dash
/// runs, strips dashes from both ends, and caps the length. Truncation can
/// leave a trailing dash behind, so the end gets trimmed once more.
#[must_use]
pub fn generate_slug(app_name: &str) -> String {
    let mut slug = String::with_capacity(app_name.len());
    let mut last_was_dash = false;

    for ch in app_name.to_lowercase().chars() {
        let mapped = if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            ch
        } else {
            '-'
        };
        if mapped == '-' {
            if last_was_dash {
                continue;
            }
            last_was_dash = true;
        } else {
            last_was_dash = false;
        }
        slug.push(mapped);
    }

    let slug: String = slug.trim_matches('-').chars().take(SLUG_MAX_LEN).collect();
    slug.trim_end_matches('-').to_string()
}

/// Read the manifest from `dir`, if present.
///
/// A missing file means "first deploy". A file that exists but does not
/// parse is an error; silently treating it as a first deploy would spawn a
/// duplicate site.
pub fn read_manifest(dir: &Path) -> Result<Option<DeployManifest>> {
    let path = dir.join(MANIFEST_NAME);
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(&path)
        .map_err(|err| ShipError::Manifest(format!("read {}: {err}", path.display())))?;
    let manifest = serde_json::from_str(&raw)
        .map_err(|err| ShipError::Manifest(format!("parse {}: {err}", path.display())))?;
    Ok(Some(manifest))
}

pub fn write_manifest(dir: &Path, manifest: &DeployManifest) -> Result<()> {
    let path = dir.join(MANIFEST_NAME);
    let mut raw = serde_json::to_string_pretty(manifest)?;
    raw.push('\n');
    std::fs::write(&path, raw)
        .map_err(|err| ShipError::Manifest(format!("write {}: {err}", path.display())))?;
    Ok(())
}
