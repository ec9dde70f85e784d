//! Entra ID authentication.
//!
//! Device-code flow (RFC 8628) against the tenant's `/oauth2/v2.0` endpoints,
//! suited to terminals and SSH sessions where a browser redirect is not an
//! option. One login yields two access tokens from a single refresh token:
//! an ARM-scoped token for the management plane and a storage-scoped token
//! for blob uploads. Both are cached on disk and refreshed together.
//!
//! ```ignore
//! siteship auth login    // device-code sign-in
//! siteship auth status   // who am I, token lifetimes
//! siteship auth logout   // drop the local token cache
//! ```

pub mod device_code;
pub mod token_store;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, ShipError};

pub use device_code::DeviceCodeResponse;
pub use token_store::StoredTokens;

/// Current sign-in state, as shown by `auth status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    /// User principal name from the cached ARM token, when decodable.
    pub user: Option<String>,
    /// Seconds until the ARM token expires.
    pub expires_in: Option<i64>,
    /// Seconds until the storage token expires.
    pub storage_expires_in: Option<i64>,
}

pub struct AuthClient {
    http_client: reqwest::blocking::Client,
}

impl AuthClient {
    pub fn new() -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|err| ShipError::Config(format!("build http client: {err}")))?;
        Ok(Self { http_client })
    }

    /// Run the full interactive login: device-code flow for the ARM scope,
    /// then a refresh-token grant to pick up the storage scope, and cache
    /// both tokens.
    pub fn login(
        &self,
        config: &Config,
        display: impl Fn(&DeviceCodeResponse),
    ) -> Result<StoredTokens> {
        let arm = device_code::run_device_code_flow(
            &self.http_client,
            config,
            &config.azure.arm_scope,
            display,
        )?;

        // The same refresh token can be redeemed for other scopes of this
        // client; that is how the storage token is minted without a second
        // interactive sign-in.
        let storage = device_code::refresh_token_grant(
            &self.http_client,
            config,
            &arm.refresh_token,
            &config.azure.storage_scope,
        )?;

        let now_ms = chrono::Utc::now().timestamp_millis();
        let tokens = StoredTokens {
            access_token: arm.access_token,
            storage_access_token: storage.access_token,
            refresh_token: pick_refresh_token(&storage.refresh_token, &arm.refresh_token)
                .to_string(),
            expires_at: now_ms + expiry_ms(arm.expires_in),
            storage_expires_at: now_ms + expiry_ms(storage.expires_in),
        };
        token_store::save_tokens(&tokens)?;

        info!(
            user = tokens_user(&tokens).as_deref().unwrap_or("unknown"),
            "signed in"
        );
        Ok(tokens)
    }

    /// Return cached tokens, refreshing both scopes when either is stale.
    /// Fails with an auth error when no one is signed in.
    pub fn ensure_tokens(&self, config: &Config) -> Result<StoredTokens> {
        let tokens = token_store::load_tokens()?.ok_or_else(|| {
            ShipError::Auth("not signed in; run 'siteship auth login' first".to_string())
        })?;

        if !tokens.is_stale() {
            return Ok(tokens);
        }
        debug!("cached tokens are stale, refreshing");

        let arm = device_code::refresh_token_grant(
            &self.http_client,
            config,
            &tokens.refresh_token,
            &config.azure.arm_scope,
        )?;
        let storage = device_code::refresh_token_grant(
            &self.http_client,
            config,
            pick_refresh_token(&arm.refresh_token, &tokens.refresh_token),
            &config.azure.storage_scope,
        )?;

        let now_ms = chrono::Utc::now().timestamp_millis();
        let refreshed = StoredTokens {
            access_token: arm.access_token,
            storage_access_token: storage.access_token,
            refresh_token: pick_refresh_token(
                &storage.refresh_token,
                pick_refresh_token(&arm.refresh_token, &tokens.refresh_token),
            )
            .to_string(),
            expires_at: now_ms + expiry_ms(arm.expires_in),
            storage_expires_at: now_ms + expiry_ms(storage.expires_in),
        };
        token_store::save_tokens(&refreshed)?;
        Ok(refreshed)
    }

    pub fn status(&self) -> AuthStatus {
        match token_store::load_tokens() {
            Ok(Some(tokens)) => {
                let now_ms = chrono::Utc::now().timestamp_millis();
                AuthStatus {
                    authenticated: true,
                    user: tokens_user(&tokens),
                    expires_in: Some(((tokens.expires_at - now_ms) / 1000).max(0)),
                    storage_expires_in: Some(
                        ((tokens.storage_expires_at - now_ms) / 1000).max(0),
                    ),
                }
            }
            Ok(None) => AuthStatus {
                authenticated: false,
                user: None,
                expires_in: None,
                storage_expires_in: None,
            },
            Err(err) => {
                tracing::warn!(error = %err, "could not read token cache");
                AuthStatus {
                    authenticated: false,
                    user: None,
                    expires_in: None,
                    storage_expires_in: None,
                }
            }
        }
    }

    pub fn logout(&self) -> Result<()> {
        token_store::clear_tokens()?;
        info!("signed out, local tokens cleared");
        Ok(())
    }
}

fn tokens_user(tokens: &StoredTokens) -> Option<String> {
    extract_upn(&tokens.access_token)
}

/// Refresh responses may rotate the refresh token or omit it; prefer the
/// newest non-empty value.
fn pick_refresh_token<'a>(candidate: &'a str, fallback: &'a str) -> &'a str {
    if candidate.is_empty() {
        fallback
    } else {
        candidate
    }
}

fn expiry_ms(expires_in_secs: u64) -> i64 {
    i64::try_from(expires_in_secs).unwrap_or(i64::MAX / 2) * 1000
}

/// Pull the user principal name out of a JWT access token for audit display.
/// The signature is not validated; this never gates any operation.
#[must_use]
pub fn extract_upn(token: &str) -> Option<String> {
    let mut parts = token.split('.');
    let (_header, payload, _sig) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let decoded = URL_SAFE_NO_PAD.decode(payload).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&decoded).ok()?;
    claims
        .get("upn")
        .or_else(|| claims.get("preferred_username"))
        .and_then(serde_json::Value::as_str)
        .map(ToString::to_string)
}
