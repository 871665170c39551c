//! Reusable webhook handler for long-lived HTTP hosts.
//!
//! No registration: the webhook is assumed to be registered out of band.
//! Each request is decoded into one update and forwarded. The response is
//! always `200 OK` with an empty body, so Telegram never retries a delivery
//! this handler has seen.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::Router;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use super::forward::{IngestError, UpdateForwarder};
use crate::bot::Diagnostics;
use crate::types::Update;

/// Decode-and-forward handler, callable any number of times.
pub struct WebhookHandler<U = Update> {
    forwarder: UpdateForwarder<U>,
}

impl<U> Clone for WebhookHandler<U> {
    fn clone(&self) -> Self {
        Self {
            forwarder: self.forwarder.clone(),
        }
    }
}

impl<U> WebhookHandler<U>
where
    U: DeserializeOwned + Send,
{
    /// Create a handler forwarding to `dest`.
    pub fn new(dest: mpsc::Sender<U>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self::from_forwarder(UpdateForwarder::new(dest, diagnostics))
    }

    pub(crate) fn from_forwarder(forwarder: UpdateForwarder<U>) -> Self {
        Self { forwarder }
    }

    /// Decode one update from `request` and forward it.
    ///
    /// # Errors
    ///
    /// Returns the [`IngestError`] after reporting it to diagnostics.
    pub async fn handle(&self, request: Request) -> Result<(), IngestError> {
        self.forwarder.ingest(request.into_body()).await
    }
}

impl<U> WebhookHandler<U>
where
    U: DeserializeOwned + Send + 'static,
{
    /// Router with a single `POST` route at `path` served by this handler.
    pub fn router(self, path: &str) -> Router {
        Router::new()
            .route(path, post(receive_update::<U>))
            .with_state(Arc::new(self))
    }
}

async fn receive_update<U>(
    State(handler): State<Arc<WebhookHandler<U>>>,
    request: Request,
) -> StatusCode
where
    U: DeserializeOwned + Send + 'static,
{
    // Failures are already in diagnostics; the response is the same.
    let _ = handler.handle(request).await;
    StatusCode::OK
}
