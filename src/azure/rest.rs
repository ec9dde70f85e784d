//! Thin ARM REST wrapper.
//!
//! Every management-plane call goes through [`ArmClient::send`], which owns
//! the three behaviors the individual clients should not repeat: bearer auth,
//! the `api-version` query parameter, and unwrapping the standard ARM error
//! envelope (`{"error": {"code", "message"}}`) into [`ShipError::Api`].

use reqwest::blocking::Client;
use reqwest::Method;
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, ShipError};

pub struct ArmClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ArmClient {
    #[must_use]
    pub fn new(base_url: &str, token: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        }
    }

    pub fn get(&self, path: &str, api_version: &str) -> Result<Option<Value>> {
        self.send(Method::GET, path, api_version, None)
    }

    pub fn put(&self, path: &str, api_version: &str, body: &Value) -> Result<Option<Value>> {
        self.send(Method::PUT, path, api_version, Some(body))
    }

    pub fn post(&self, path: &str, api_version: &str, body: Option<&Value>) -> Result<Option<Value>> {
        self.send(Method::POST, path, api_version, body)
    }

    pub fn patch(&self, path: &str, api_version: &str, body: &Value) -> Result<Option<Value>> {
        self.send(Method::PATCH, path, api_version, Some(body))
    }

    pub fn delete(&self, path: &str, api_version: &str) -> Result<Option<Value>> {
        self.send(Method::DELETE, path, api_version, None)
    }

    /// Issue one request. `Ok(None)` means the backend accepted the call
    /// without a body (202 Accepted, 204 No Content, or an empty 200).
    fn send(
        &self,
        method: Method,
        path: &str,
        api_version: &str,
        body: Option<&Value>,
    ) -> Result<Option<Value>> {
        let url = format!("{}{}?api-version={}", self.base_url, path, api_version);
        debug!(method = %method, path, "arm request");

        let mut request = self
            .client
            .request(method.clone(), &url)
            .bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|err| ShipError::Api {
            status: 0,
            code: "TransportError".to_string(),
            message: format!("{method} {path}: {err}"),
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::ACCEPTED || status == reqwest::StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let text = response.text().map_err(|err| ShipError::Api {
            status: status.as_u16(),
            code: "TransportError".to_string(),
            message: format!("read response body: {err}"),
        })?;

        if !status.is_success() {
            let (code, message) = parse_error_envelope(&text);
            return Err(ShipError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        if text.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&text)?))
    }
}

/// Pull `code` and `message` out of the ARM error envelope, falling back to
/// the raw body when the response is not in the expected shape.
fn parse_error_envelope(body: &str) -> (String, String) {
    let fallback = || ("UnknownError".to_string(), body.to_string());

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return fallback();
    };
    let Some(envelope) = value.get("error") else {
        return fallback();
    };

    let code = envelope
        .get("code")
        .and_then(Value::as_str)
        .unwrap_or("UnknownError")
        .to_string();
    let message = envelope
        .get("message")
        .and_then(Value::as_str)
        .map_or_else(|| body.to_string(), ToString::to_string);
    (code, message)
}
