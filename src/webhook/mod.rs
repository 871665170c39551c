//! Webhook update ingestion.
//!
//! Two entry points share one decode-and-forward path
//! ([`forward::UpdateForwarder`]):
//! - [`serverless::ServerlessWebhook`]: one invocation per request:
//!   register, decode, forward, signal completion
//! - [`handler::WebhookHandler`]: an axum handler for long-lived hosts,
//!   no registration
//!
//! [`invoke::invoke`] drives a serverless invocation from the host side.

pub mod completion;
pub mod forward;
pub mod handler;
pub mod invoke;
pub mod register;
pub mod serverless;

pub use completion::{completion_pair, Completion, CompletionSignal, CompletionWait};
pub use forward::{IngestError, UpdateForwarder};
pub use handler::WebhookHandler;
pub use invoke::{invoke, InvocationError, InvocationReport};
pub use register::{register, RegisterResult, RegistrationError};
pub use serverless::{PollOutcome, ServerlessWebhook};

/// Where Telegram should deliver updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEndpoint {
    /// Public HTTPS URL of the webhook.
    pub public_url: String,
}

impl WebhookEndpoint {
    /// Endpoint for `public_url`. No validation; see
    /// [`crate::config::Config::endpoint`] for the checked path.
    pub fn new(public_url: impl Into<String>) -> Self {
        Self {
            public_url: public_url.into(),
        }
    }
}
