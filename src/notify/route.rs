// SPDX-License-Identifier: Apache-2.0 OR MIT
// Notes and the path they take into the queue

use super::notification::Payload;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, RwLock};
use tracing::warn;

/// Lifecycle flags guarded by the operations lock.
///
/// Submissions hold the read side while enqueueing; `exit` holds the write
/// side while it sets `halt` and enqueues the final note, so nothing can land
/// behind that note.
#[derive(Debug, Default)]
pub(crate) struct Operations {
    pub halt: bool,
    pub running: bool,
}

/// One-shot acknowledgement that fires when the note carrying it is dropped:
/// after the consumer has written and flushed it, or when it is rejected.
pub(crate) struct Confirmation(Option<oneshot::Sender<()>>);

impl Confirmation {
    pub fn new(tx: oneshot::Sender<()>) -> Self {
        Self(Some(tx))
    }
}

impl Drop for Confirmation {
    fn drop(&mut self) {
        if let Some(tx) = self.0.take() {
            let _ = tx.send(());
        }
    }
}

/// Unit of work in the queue
pub(crate) struct Note {
    pub sender: Arc<str>,
    pub payload: Payload,
    pub confirm: Option<Confirmation>,
}

impl Note {
    pub fn new(sender: impl Into<Arc<str>>, payload: Payload) -> Self {
        Self {
            sender: sender.into(),
            payload,
            confirm: None,
        }
    }

    pub fn with_confirmation(mut self, confirm: Confirmation) -> Self {
        self.confirm = Some(confirm);
        self
    }
}

/// Producer side of a notifier, shared by every handle
#[derive(Clone)]
pub(crate) struct Router {
    pub tx: mpsc::Sender<Note>,
    pub ops: Arc<RwLock<Operations>>,
    pub async_send: bool,
}

impl Router {
    pub fn new(tx: mpsc::Sender<Note>, async_send: bool) -> Self {
        Self {
            tx,
            ops: Arc::new(RwLock::new(Operations::default())),
            async_send,
        }
    }

    /// Enqueue a note, waiting for room. A stopping notifier drops it with a
    /// warning.
    pub async fn route(&self, note: Note) {
        let ops = self.ops.read().await;
        if ops.halt {
            warn!(target: "notify", "{} cannot send to a closed channel", note.sender);
            return;
        }
        if let Err(mpsc::error::SendError(note)) = self.tx.send(note).await {
            warn!(target: "notify", "{} cannot send to a closed channel", note.sender);
        }
    }

    /// Submit according to the notifier's policy
    pub async fn submit(&self, note: Note) {
        if self.async_send {
            self.spawn_route(note);
        } else {
            self.route(note).await;
        }
    }

    /// Enqueue on a detached task; the caller never waits
    pub fn spawn_route(&self, note: Note) {
        let router = self.clone();
        tokio::spawn(async move { router.route(note).await });
    }
}
