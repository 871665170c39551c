//! Decode-and-forward, shared by the serverless poller and the reusable
//! handler.

use std::sync::Arc;

use axum::body::{Body, Bytes};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

use crate::bot::Diagnostics;

/// Upper bound on an inbound update body.
pub const MAX_UPDATE_BYTES: usize = 1_048_576;

/// Why an inbound request did not reach the sink.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The request body could not be read.
    #[error("cannot read update body: {0}")]
    Body(#[source] axum::Error),
    /// The request body is not a valid update.
    #[error("cannot decode update: {0}")]
    Decode(#[from] serde_json::Error),
    /// The receiving side of the sink is gone.
    #[error("update sink closed, update dropped")]
    SinkClosed,
}

impl IngestError {
    /// True for failures of the read/decode step, as opposed to handoff.
    pub fn is_decode_stage(&self) -> bool {
        matches!(self, Self::Body(_) | Self::Decode(_))
    }
}

/// Decodes one update from a request body and hands it to the sink.
///
/// The sink is a tokio mpsc channel. `forward` waits while the channel is
/// full, so a bounded sink without a running consumer stalls the caller.
pub struct UpdateForwarder<U> {
    dest: mpsc::Sender<U>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl<U> Clone for UpdateForwarder<U> {
    fn clone(&self) -> Self {
        Self {
            dest: self.dest.clone(),
            diagnostics: Arc::clone(&self.diagnostics),
        }
    }
}

impl<U> UpdateForwarder<U>
where
    U: DeserializeOwned + Send,
{
    /// Create a forwarder writing to `dest` and reporting to `diagnostics`.
    pub fn new(dest: mpsc::Sender<U>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        Self { dest, diagnostics }
    }

    /// Decode one update from raw JSON.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::Decode`] on malformed or mistyped JSON.
    pub fn decode(bytes: &[u8]) -> Result<U, IngestError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Hand one update to the sink, waiting for capacity.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::SinkClosed`] when the receiver was dropped.
    pub async fn forward(&self, update: U) -> Result<(), IngestError> {
        self.dest
            .send(update)
            .await
            .map_err(|_| IngestError::SinkClosed)
    }

    /// Read, decode and forward exactly one update from `body`.
    ///
    /// Failures are reported to diagnostics before being returned.
    ///
    /// # Errors
    ///
    /// See [`IngestError`].
    pub async fn ingest(&self, body: Body) -> Result<(), IngestError> {
        let result = self.ingest_inner(body).await;
        if let Err(ref e) = result {
            self.diagnostics.report(e);
        }
        result
    }

    async fn ingest_inner(&self, body: Body) -> Result<(), IngestError> {
        let bytes: Bytes = axum::body::to_bytes(body, MAX_UPDATE_BYTES)
            .await
            .map_err(IngestError::Body)?;
        let update = Self::decode(&bytes)?;
        debug!(bytes = bytes.len(), "update decoded");
        self.forward(update).await
    }
}
