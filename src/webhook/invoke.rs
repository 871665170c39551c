//! Host-side driver for one serverless invocation.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::task::JoinError;
use tracing::{info, warn};

use super::completion::{completion_pair, Completion};
use super::serverless::{PollOutcome, ServerlessWebhook};

/// What the host observed for one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationReport {
    /// How the completion wait was released.
    pub completion: Completion,
    /// The exit path taken by the poller.
    pub outcome: PollOutcome,
}

/// Why an invocation could not be observed to the end.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// The completion signal did not arrive within the deadline. The poll
    /// task keeps running detached.
    #[error("invocation did not complete within {0:?}")]
    DeadlineElapsed(Duration),
    /// The poll task panicked or was cancelled.
    #[error("poll task failed: {0}")]
    Task(#[from] JoinError),
}

/// Run `poll_once` for `request` on its own task and wait for completion.
///
/// `deadline` bounds the wait on the completion signal; without one the
/// wait is unbounded.
///
/// # Errors
///
/// See [`InvocationError`].
pub async fn invoke<U>(
    webhook: Arc<ServerlessWebhook<U>>,
    request: Request,
    deadline: Option<Duration>,
) -> Result<InvocationReport, InvocationError>
where
    U: DeserializeOwned + Send + 'static,
{
    let (signal, wait) = completion_pair();
    let task = tokio::spawn(async move { webhook.poll_once(request, signal).await });

    let completion = match deadline {
        Some(limit) => match tokio::time::timeout(limit, wait.wait()).await {
            Ok(completion) => completion,
            Err(_) => {
                warn!(deadline = ?limit, "invocation deadline elapsed");
                return Err(InvocationError::DeadlineElapsed(limit));
            }
        },
        None => wait.wait().await,
    };

    let outcome = task.await?;
    info!(?completion, ?outcome, "invocation finished");
    Ok(InvocationReport {
        completion,
        outcome,
    })
}
