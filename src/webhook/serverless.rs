//! One-shot webhook poller for serverless function hosts.
//!
//! A function host hands each invocation exactly one HTTP request. The
//! poller registers the webhook, decodes the single update carried by that
//! request, forwards it to the sink and fires the completion signal so the
//! host may end the invocation.

use axum::extract::Request;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::completion::CompletionSignal;
use super::forward::{IngestError, UpdateForwarder};
use super::handler::WebhookHandler;
use super::register::register;
use super::WebhookEndpoint;
use crate::bot::Bot;
use crate::types::Update;

/// Which exit path a [`ServerlessWebhook::poll_once`] call took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// One update reached the sink. Completion fired.
    Forwarded,
    /// `setWebhook` failed or was rejected. Nothing was read. Completion fired.
    RegistrationFailed,
    /// The request body was unreadable or not an update. Completion was
    /// NOT fired.
    DecodeFailed,
    /// The update decoded but the sink was closed. Completion fired.
    SinkClosed,
}

/// Serverless webhook poller.
///
/// Holds configuration and collaborators only; the request of each
/// invocation is passed to [`poll_once`](Self::poll_once), so one instance
/// can serve concurrent invocations.
pub struct ServerlessWebhook<U = Update> {
    listen: Option<String>,
    endpoint: Option<WebhookEndpoint>,
    forwarder: UpdateForwarder<U>,
    bot: Bot,
}

impl<U> ServerlessWebhook<U>
where
    U: DeserializeOwned + Send,
{
    /// Create a poller forwarding updates to `dest`.
    pub fn new(bot: Bot, dest: mpsc::Sender<U>) -> Self {
        Self {
            listen: None,
            endpoint: None,
            forwarder: UpdateForwarder::new(dest, bot.diagnostics()),
            bot,
        }
    }

    /// Set the public endpoint sent to Telegram on registration.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: WebhookEndpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Set the listen address used by hosts that bind their own socket.
    #[must_use]
    pub fn with_listen(mut self, listen: impl Into<String>) -> Self {
        self.listen = Some(listen.into());
        self
    }

    /// Listen address, if configured.
    pub fn listen(&self) -> Option<&str> {
        self.listen.as_deref()
    }

    /// Public endpoint, if configured.
    pub fn endpoint(&self) -> Option<&WebhookEndpoint> {
        self.endpoint.as_ref()
    }

    /// Registration-free handler sharing this poller's sink and diagnostics.
    pub fn handler(&self) -> WebhookHandler<U> {
        WebhookHandler::from_forwarder(self.forwarder.clone())
    }

    /// Run one invocation: register, decode `request`, forward, signal.
    ///
    /// Errors are reported to the bot's diagnostics, never returned. The
    /// order is fixed: registration, then body decode, then handoff, then
    /// `signal`. A decode failure returns without firing `signal`; dropping
    /// it releases the host with [`Completion::Abandoned`].
    ///
    /// The handoff waits for sink capacity. With a bounded sink and no
    /// consumer this call does not return.
    ///
    /// [`Completion::Abandoned`]: super::completion::Completion::Abandoned
    pub async fn poll_once(&self, request: Request, signal: CompletionSignal) -> PollOutcome {
        if let Err(e) = register(&self.bot, self.endpoint.as_ref()).await {
            self.bot.debug(&e);
            signal.fire();
            return PollOutcome::RegistrationFailed;
        }

        match self.forwarder.ingest(request.into_body()).await {
            Ok(()) => {
                debug!("update forwarded");
                signal.fire();
                PollOutcome::Forwarded
            }
            Err(IngestError::SinkClosed) => {
                info!("sink closed before the update could be handed off");
                signal.fire();
                PollOutcome::SinkClosed
            }
            Err(e) => {
                // Known issue: this path has never signalled completion.
                warn!(error = %e, "update decode failed, completion not signalled");
                drop(signal);
                PollOutcome::DecodeFailed
            }
        }
    }
}

impl<U> std::fmt::Debug for ServerlessWebhook<U> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerlessWebhook")
            .field("listen", &self.listen)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
