//! `setWebhook` registration handshake.
//!
//! Tells Telegram where to deliver future updates. The request carries the
//! public URL (when configured) and never uploads a certificate.

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use super::WebhookEndpoint;
use crate::bot::{ApiFiles, ApiParams, Bot, TransportError};

/// Bot API method used for registration.
pub const SET_WEBHOOK: &str = "setWebhook";

/// Decoded `setWebhook` response. Fields other than `ok` and
/// `description` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisterResult {
    /// Whether Telegram accepted the registration.
    pub ok: bool,
    /// Human-readable reason, present on failure.
    #[serde(default)]
    pub description: Option<String>,
}

/// Why a registration attempt did not succeed.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// The call never produced a usable response.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The response was not a `setWebhook` result.
    #[error("bad json data {:?}: {source}", String::from_utf8_lossy(.response))]
    Decode {
        /// Raw response bytes.
        response: Vec<u8>,
        /// JSON error.
        #[source]
        source: serde_json::Error,
    },
    /// Telegram answered with `ok: false`.
    #[error("cannot register webhook: {description}")]
    Rejected {
        /// Telegram's description, empty when none was given.
        description: String,
    },
}

/// Parameters for `setWebhook`.
///
/// Without an endpoint the `url` key is left out and Telegram falls back to
/// the address it observed the call from, which is rarely the address a
/// deployment behind a load balancer wants.
pub fn registration_params(endpoint: Option<&WebhookEndpoint>) -> ApiParams {
    let mut params = ApiParams::new();
    if let Some(endpoint) = endpoint {
        params.insert("url".to_owned(), endpoint.public_url.clone());
    }
    params
}

/// Attachments for `setWebhook`: always none.
pub fn registration_files() -> ApiFiles {
    ApiFiles::new()
}

/// Interpret raw `setWebhook` response bytes.
///
/// # Errors
///
/// [`RegistrationError::Decode`] on malformed JSON (including empty input),
/// [`RegistrationError::Rejected`] when `ok` is false.
pub fn parse_register_result(response: Vec<u8>) -> Result<RegisterResult, RegistrationError> {
    let result: RegisterResult = match serde_json::from_slice(&response) {
        Ok(result) => result,
        Err(source) => return Err(RegistrationError::Decode { response, source }),
    };
    if !result.ok {
        return Err(RegistrationError::Rejected {
            description: result.description.unwrap_or_default(),
        });
    }
    Ok(result)
}

/// Register the webhook with Telegram. One attempt, no retry.
///
/// # Errors
///
/// See [`RegistrationError`].
pub async fn register(
    bot: &Bot,
    endpoint: Option<&WebhookEndpoint>,
) -> Result<RegisterResult, RegistrationError> {
    let params = registration_params(endpoint);
    debug!(
        url = endpoint.map(|e| e.public_url.as_str()),
        "registering webhook"
    );
    let response = bot
        .send_files(SET_WEBHOOK, registration_files(), params)
        .await?;
    let result = parse_register_result(response)?;
    info!(
        description = result.description.as_deref().unwrap_or(""),
        "webhook registered"
    );
    Ok(result)
}
