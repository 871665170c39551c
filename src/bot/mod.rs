//! Bot client collaborator.
//!
//! The webhook adapters never talk HTTP to Telegram themselves. They go
//! through two narrow seams owned by the bot:
//! - [`BotApi`]: "send a named Bot API method with parameters and file
//!   attachments, hand back the raw response bytes"
//! - [`Diagnostics`]: a write-only sink for errors the adapters swallow
//!
//! [`Bot`] bundles both behind cheap-to-clone handles. [`http::HttpBotApi`]
//! is the production `BotApi`; [`TracingDiagnostics`] the production sink.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

pub mod http;

// ---------------------------------------------------------------------------
// Request payload types
// ---------------------------------------------------------------------------

/// A file attached to a Bot API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputFile {
    /// Read from the local filesystem when the request is built.
    Path(PathBuf),
    /// In-memory contents.
    Memory {
        /// File name reported to Telegram.
        file_name: String,
        /// Raw file contents.
        data: Vec<u8>,
    },
}

/// File attachments keyed by multipart field name.
pub type ApiFiles = HashMap<String, InputFile>;

/// String parameters keyed by Bot API parameter name.
pub type ApiParams = HashMap<String, String>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A Bot API call failed before a usable response came back.
///
/// `response` holds whatever bytes were received (often none) so the
/// failure can be reported with the backend's own words.
#[derive(Debug, Error)]
#[error("{method} failed {:?}: {source}", String::from_utf8_lossy(.response))]
pub struct TransportError {
    /// Bot API method name, e.g. `setWebhook`.
    pub method: String,
    /// Raw response bytes received before the failure, if any.
    pub response: Vec<u8>,
    /// Underlying cause.
    #[source]
    pub source: Box<dyn std::error::Error + Send + Sync>,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Send-files capability of the bot client.
///
/// Implementations must be `Send + Sync` so adapters can share them across
/// tokio tasks.
#[async_trait]
pub trait BotApi: Send + Sync {
    /// Call `method` with `params` as text fields and `files` as file parts.
    ///
    /// Returns the raw response body. Interpreting it (the `ok` flag,
    /// `description`, `result`) is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when the request cannot be sent or the
    /// response body cannot be read.
    async fn send_files(
        &self,
        method: &str,
        files: ApiFiles,
        params: ApiParams,
    ) -> Result<Vec<u8>, TransportError>;
}

/// Write-only error reporting owned by the bot.
///
/// Implementations must never fail and may discard everything.
pub trait Diagnostics: Send + Sync {
    /// Report an error the caller is not going to propagate.
    fn report(&self, error: &dyn std::error::Error);
}

/// Reports diagnostics as `tracing` warnings.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn report(&self, error: &dyn std::error::Error) {
        match error.source() {
            Some(cause) => warn!(error = %error, cause = %cause, "bot diagnostics"),
            None => warn!(error = %error, "bot diagnostics"),
        }
    }
}

// ---------------------------------------------------------------------------
// Bot handle
// ---------------------------------------------------------------------------

/// Handle to the bot client: API access plus its diagnostics sink.
#[derive(Clone)]
pub struct Bot {
    api: Arc<dyn BotApi>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Bot {
    /// Assemble a bot from its two collaborators.
    pub fn new(api: Arc<dyn BotApi>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self { api, diagnostics }
    }

    /// Production bot: HTTP transport against `api_base`, tracing diagnostics.
    pub fn from_token(token: &str, api_base: &str) -> Self {
        Self::new(
            Arc::new(http::HttpBotApi::new(token, api_base)),
            Arc::new(TracingDiagnostics),
        )
    }

    /// Forward a call to the underlying [`BotApi`].
    ///
    /// # Errors
    ///
    /// Propagates the [`TransportError`] from the API implementation.
    pub async fn send_files(
        &self,
        method: &str,
        files: ApiFiles,
        params: ApiParams,
    ) -> Result<Vec<u8>, TransportError> {
        self.api.send_files(method, files, params).await
    }

    /// Report an error to the bot's diagnostics sink.
    pub fn debug(&self, error: &dyn std::error::Error) {
        self.diagnostics.report(error);
    }

    /// Shared handle to the diagnostics sink.
    pub fn diagnostics(&self) -> Arc<dyn Diagnostics> {
        Arc::clone(&self.diagnostics)
    }
}

impl std::fmt::Debug for Bot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bot").finish_non_exhaustive()
    }
}
