//! telehook: one-shot Telegram webhook adapter for serverless hosts.
//!
//! Each function invocation carries one webhook request. The
//! [`webhook::ServerlessWebhook`] poller registers the webhook, decodes the
//! update, forwards it to the application's channel and signals completion
//! so the host can return. Long-lived hosts mount
//! [`webhook::WebhookHandler`] on an axum router instead.
//!
//! See `DESIGN.md` for the architecture notes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bot;
pub mod config;
pub mod logging;
pub mod types;
pub mod webhook;
