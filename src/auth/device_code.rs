//! Device-code grant against Entra ID.
//!
//! Two endpoints under `{entra}/{tenant}/oauth2/v2.0`: `devicecode` hands out
//! the user code, `token` is polled with the device code until the user
//! finishes signing in. The same `token` endpoint also serves the
//! refresh-token grant used to mint additional scopes later.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, ShipError};

/// Extra seconds added to the poll interval when the service pushes back.
const SLOW_DOWN_STEP: u64 = 5;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceCodeResponse {
    /// Secret polled against the token endpoint; never shown to the user.
    pub device_code: String,
    /// Short code the user types on the verification page.
    pub user_code: String,
    pub verification_uri: String,
    /// Seconds until the codes expire.
    pub expires_in: u64,
    /// Minimum seconds between polls.
    pub interval: u64,
    /// Ready-made instruction sentence from the identity service.
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// May be absent on refresh grants when the token is not rotated.
    #[serde(default)]
    pub refresh_token: String,
    pub expires_in: u64,
    #[serde(default)]
    pub token_type: String,
}

#[derive(Debug, Deserialize, Default)]
struct ErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl ErrorBody {
    fn detail(&self) -> String {
        match &self.error_description {
            Some(desc) => format!("{}: {}", self.error, desc),
            None => self.error.clone(),
        }
    }
}

/// One poll against the token endpoint.
#[derive(Debug)]
pub enum PollResult {
    Success(Box<TokenResponse>),
    /// User has not finished signing in yet.
    Pending,
    /// Service asked for a longer poll interval.
    SlowDown,
    Expired,
    AccessDenied,
}

fn device_code_url(config: &Config) -> String {
    format!(
        "{}/{}/oauth2/v2.0/devicecode",
        config.azure.entra_endpoint.trim_end_matches('/'),
        config.azure.tenant_id
    )
}

fn token_url(config: &Config) -> String {
    format!(
        "{}/{}/oauth2/v2.0/token",
        config.azure.entra_endpoint.trim_end_matches('/'),
        config.azure.tenant_id
    )
}

/// Ask Entra for a device code covering `scope`.
pub fn request_device_code(
    client: &reqwest::blocking::Client,
    config: &Config,
    scope: &str,
) -> Result<DeviceCodeResponse> {
    info!(client_id = %config.azure.client_id, scope, "requesting device code");

    let response = client
        .post(device_code_url(config))
        .form(&[("client_id", config.azure.client_id.as_str()), ("scope", scope)])
        .send()
        .map_err(|err| ShipError::Auth(format!("device code request: {err}")))?;

    let status = response.status();
    let body = response
        .text()
        .map_err(|err| ShipError::Auth(format!("device code response: {err}")))?;

    if !status.is_success() {
        let error: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        return Err(ShipError::Auth(format!(
            "device code request failed ({status}): {}",
            error.detail()
        )));
    }

    serde_json::from_str(&body)
        .map_err(|err| ShipError::Auth(format!("invalid device code response: {err}")))
}

/// Poll the token endpoint once for the device-code grant.
pub fn poll_for_token(
    client: &reqwest::blocking::Client,
    config: &Config,
    device_code: &str,
) -> Result<PollResult> {
    let response = client
        .post(token_url(config))
        .form(&[
            ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
            ("client_id", config.azure.client_id.as_str()),
            ("device_code", device_code),
        ])
        .send()
        .map_err(|err| ShipError::Auth(format!("token poll: {err}")))?;

    let status = response.status();
    let body = response
        .text()
        .map_err(|err| ShipError::Auth(format!("token poll response: {err}")))?;

    if status.is_success() {
        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|err| ShipError::Auth(format!("invalid token response: {err}")))?;
        return Ok(PollResult::Success(Box::new(token)));
    }

    let error: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
    match error.error.as_str() {
        "authorization_pending" => Ok(PollResult::Pending),
        "slow_down" => Ok(PollResult::SlowDown),
        "expired_token" => Ok(PollResult::Expired),
        "access_denied" => Ok(PollResult::AccessDenied),
        _ => Err(ShipError::Auth(format!(
            "token request failed: {}",
            error.detail()
        ))),
    }
}

/// Run the whole grant: request a code, show it via `display`, poll until
/// the user signs in or the code dies.
pub fn run_device_code_flow(
    client: &reqwest::blocking::Client,
    config: &Config,
    scope: &str,
    display: impl Fn(&DeviceCodeResponse),
) -> Result<TokenResponse> {
    let device = request_device_code(client, config, scope)?;
    display(&device);

    let deadline = Instant::now() + Duration::from_secs(device.expires_in);
    let mut interval = Duration::from_secs(device.interval);

    loop {
        if Instant::now() >= deadline {
            return Err(ShipError::Auth(
                "device code expired; run 'siteship auth login' again".to_string(),
            ));
        }
        std::thread::sleep(interval);

        match poll_for_token(client, config, &device.device_code)? {
            PollResult::Success(token) => {
                debug!("device code grant complete");
                return Ok(*token);
            }
            PollResult::Pending => {}
            PollResult::SlowDown => {
                interval += Duration::from_secs(SLOW_DOWN_STEP);
                debug!(interval_secs = interval.as_secs(), "slowing poll rate");
            }
            PollResult::Expired => {
                return Err(ShipError::Auth(
                    "device code expired; run 'siteship auth login' again".to_string(),
                ));
            }
            PollResult::AccessDenied => {
                return Err(ShipError::Auth(
                    "access denied; the sign-in request was rejected".to_string(),
                ));
            }
        }
    }
}

/// Redeem a refresh token for an access token with the given scope.
///
/// The explicit `scope` is what lets one refresh token produce both the
/// management and the storage access tokens.
pub fn refresh_token_grant(
    client: &reqwest::blocking::Client,
    config: &Config,
    refresh_token: &str,
    scope: &str,
) -> Result<TokenResponse> {
    let response = client
        .post(token_url(config))
        .form(&[
            ("grant_type", "refresh_token"),
            ("client_id", config.azure.client_id.as_str()),
            ("refresh_token", refresh_token),
            ("scope", scope),
        ])
        .send()
        .map_err(|err| ShipError::Auth(format!("token refresh: {err}")))?;

    let status = response.status();
    let body = response
        .text()
        .map_err(|err| ShipError::Auth(format!("token refresh response: {err}")))?;

    if !status.is_success() {
        let error: ErrorBody = serde_json::from_str(&body).unwrap_or_default();
        return Err(ShipError::Auth(format!(
            "token refresh failed ({status}): {}",
            error.detail()
        )));
    }

    serde_json::from_str(&body)
        .map_err(|err| ShipError::Auth(format!("invalid refresh response: {err}")))
}
