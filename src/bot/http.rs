//! reqwest-backed [`BotApi`] speaking `multipart/form-data` to the Bot API.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use tracing::debug;

use super::{ApiFiles, ApiParams, BotApi, InputFile, TransportError};

/// Base URL for the Telegram Bot API.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// HTTP transport for Bot API calls.
///
/// Every call is a `POST {api_base}/bot{token}/{method}` with parameters as
/// text parts and files as file parts. Telegram answers errors with a JSON
/// body (`ok: false`), so the body is returned whatever the status code;
/// only connection and body-read failures become [`TransportError`]s.
#[derive(Clone)]
pub struct HttpBotApi {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl HttpBotApi {
    /// Create a transport for `token` against `api_base`.
    pub fn new(token: &str, api_base: &str) -> Self {
        Self::with_client(reqwest::Client::new(), token, api_base)
    }

    /// Create a transport reusing an existing `reqwest::Client`.
    pub fn with_client(client: reqwest::Client, token: &str, api_base: &str) -> Self {
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
        }
    }

    /// Full endpoint URL for `method`. Contains the bot token.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn build_form(
        method: &str,
        files: ApiFiles,
        params: ApiParams,
    ) -> Result<Form, TransportError> {
        let mut form = Form::new();
        for (name, value) in params {
            form = form.text(name, value);
        }
        for (name, file) in files {
            let part = match file {
                InputFile::Path(path) => {
                    let data = tokio::fs::read(&path).await.map_err(|e| TransportError {
                        method: method.to_owned(),
                        response: Vec::new(),
                        source: Box::new(e),
                    })?;
                    let file_name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| name.clone());
                    Part::bytes(data).file_name(file_name)
                }
                InputFile::Memory { file_name, data } => Part::bytes(data).file_name(file_name),
            };
            form = form.part(name, part);
        }
        Ok(form)
    }
}

impl std::fmt::Debug for HttpBotApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBotApi")
            .field("api_base", &self.api_base)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl BotApi for HttpBotApi {
    async fn send_files(
        &self,
        method: &str,
        files: ApiFiles,
        params: ApiParams,
    ) -> Result<Vec<u8>, TransportError> {
        let form = Self::build_form(method, files, params).await?;

        // reqwest errors embed the request URL, which carries the token.
        let resp = self
            .client
            .post(self.method_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransportError {
                method: method.to_owned(),
                response: Vec::new(),
                source: Box::new(e.without_url()),
            })?;

        let status = resp.status();
        let body = resp.bytes().await.map_err(|e| TransportError {
            method: method.to_owned(),
            response: Vec::new(),
            source: Box::new(e.without_url()),
        })?;

        debug!(method, status = status.as_u16(), bytes = body.len(), "Bot API call completed");
        Ok(body.to_vec())
    }
}
