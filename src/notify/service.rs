// SPDX-License-Identifier: Apache-2.0 OR MIT
// Run a notifier on the tokio runtime and stop it cleanly

use super::notifier::{Notifier, State};
use super::sender::{Failure, Sender};
use super::NotifyError;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::warn;

/// A notifier whose consumer loop runs on a spawned task.
///
/// Hand out [`Sender`]/[`Failure`] handles from here, then call
/// [`shutdown`](NotifierService::shutdown) to drain and close.
pub struct NotifierService {
    notifier: Arc<Notifier>,
    consumer_handle: Option<JoinHandle<Result<(), NotifyError>>>,
}

impl NotifierService {
    /// Spawn the consumer loop and wait until it is running
    pub async fn start(notifier: Arc<Notifier>) -> Result<Self, NotifyError> {
        if notifier.state() != State::NotStarted {
            return Err(NotifyError::LoopUnavailable { id: notifier.id() });
        }

        let consumer = Arc::clone(&notifier);
        let mut consumer_handle = tokio::spawn(async move { consumer.run().await });

        tokio::select! {
            biased;
            finished = &mut consumer_handle => {
                return Err(match finished {
                    Ok(Err(e)) => e,
                    _ => NotifyError::LoopUnavailable { id: notifier.id() },
                });
            }
            _ = notifier.started() => {}
        }

        Ok(Self {
            notifier,
            consumer_handle: Some(consumer_handle),
        })
    }

    pub fn notifier(&self) -> &Arc<Notifier> {
        &self.notifier
    }

    pub fn sender(&self, name: impl Into<String>) -> Sender {
        self.notifier.sender(name)
    }

    pub fn failure(&self, name: impl Into<String>) -> Failure {
        self.notifier.failure(name)
    }

    /// Drain the queue, close the endpoints and join the consumer task
    pub async fn shutdown(mut self) -> Result<(), NotifyError> {
        self.notifier.exit().await?;

        if let Some(handle) = self.consumer_handle.take() {
            match handle.await {
                Ok(result) => result?,
                Err(e) => warn!(target: "notify", "consumer task failed: {}", e),
            }
        }
        Ok(())
    }
}
