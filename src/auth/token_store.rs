//! On-disk token cache.
//!
//! `tokens.json` lives next to the config file (0600, atomic writes via a
//! temp file), holding both access tokens plus the shared refresh token.
//! `SITESHIP_TOKEN_DIR` points the cache somewhere else so tests never touch
//! a real sign-in.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Result, ShipError};

const TOKENS_FILE: &str = "tokens.json";

/// Tokens are refreshed this many milliseconds before they actually expire.
const SAFETY_MARGIN_MS: i64 = 5 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
    /// ARM-scoped access token.
    pub access_token: String,
    /// Storage-scoped access token.
    pub storage_access_token: String,
    pub refresh_token: String,
    /// Unix milliseconds when the ARM token expires.
    pub expires_at: i64,
    /// Unix milliseconds when the storage token expires.
    pub storage_expires_at: i64,
}

impl StoredTokens {
    /// True when either token is within the safety margin of expiry. Both
    /// scopes refresh together, so one check covers the pair.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        let now_ms = chrono::Utc::now().timestamp_millis();
        self.expires_at - now_ms < SAFETY_MARGIN_MS
            || self.storage_expires_at - now_ms < SAFETY_MARGIN_MS
    }
}

fn token_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("SITESHIP_TOKEN_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|dir| dir.join("siteship"))
        .ok_or_else(|| ShipError::Auth("could not locate a config directory".to_string()))
}

fn tokens_path() -> Result<PathBuf> {
    Ok(token_dir()?.join(TOKENS_FILE))
}

/// Persist tokens with owner-only permissions, atomically.
pub fn save_tokens(tokens: &StoredTokens) -> Result<()> {
    let path = tokens_path()?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|err| ShipError::Auth(format!("create token dir: {err}")))?;
    }

    let json = serde_json::to_string_pretty(tokens)?;

    // Write to a sibling temp file first so a crash never leaves a torn cache.
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, json)
        .map_err(|err| ShipError::Auth(format!("write token cache: {err}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&temp_path, fs::Permissions::from_mode(0o600))
            .map_err(|err| ShipError::Auth(format!("set token cache permissions: {err}")))?;
    }

    fs::rename(&temp_path, &path)
        .map_err(|err| ShipError::Auth(format!("save token cache: {err}")))?;
    debug!(path = %path.display(), "token cache saved");
    Ok(())
}

/// Load cached tokens. Missing or unreadable caches come back as `None`;
/// the worst outcome of a broken cache should be another login prompt.
pub fn load_tokens() -> Result<Option<StoredTokens>> {
    let path = tokens_path()?;
    if !path.exists() {
        return Ok(None);
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        if let Ok(metadata) = fs::metadata(&path) {
            let mode = metadata.mode() & 0o777;
            if mode != 0o600 {
                warn!(
                    path = %path.display(),
                    mode = format!("{mode:o}"),
                    "token cache has insecure permissions"
                );
            }
        }
    }

    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(err) => {
            warn!(error = %err, "could not read token cache");
            return Ok(None);
        }
    };
    match serde_json::from_str(&raw) {
        Ok(tokens) => Ok(Some(tokens)),
        Err(err) => {
            warn!(error = %err, "token cache is corrupt, ignoring it");
            Ok(None)
        }
    }
}

/// Drop the cache. Overwrites before unlinking so the tokens do not linger
/// in the old blocks, and treats a missing file as already done.
pub fn clear_tokens() -> Result<()> {
    let path = tokens_path()?;
    if !path.exists() {
        return Ok(());
    }

    let _ = fs::write(&path, "{}");
    fs::remove_file(&path)
        .map_err(|err| ShipError::Auth(format!("remove token cache: {err}")))?;
    Ok(())
}
