// SPDX-License-Identifier: Apache-2.0 OR MIT
// Producer handles bound to a sender name

use super::notification::{Notification, Payload};
use super::route::{Confirmation, Note, Router};
use std::future::Future;
use std::panic::Location;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Handle that submits payloads under a fixed sender name.
///
/// Cheap to clone; every clone feeds the same notifier.
#[derive(Clone)]
pub struct Sender {
    name: Arc<str>,
    router: Router,
}

impl Sender {
    pub(crate) fn new(name: impl Into<String>, router: Router) -> Self {
        Self {
            name: Arc::from(name.into()),
            router,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Submit a payload.
    ///
    /// Error-bearing payloads are queued and then handed back as `Err`, so a
    /// caller can log and propagate with one `?`. Messages return `Ok`.
    pub async fn send(&self, value: impl Into<Payload>) -> Result<(), Notification> {
        let payload = value.into();
        let failure = payload.as_failure();
        self.router
            .submit(Note::new(Arc::clone(&self.name), payload))
            .await;
        match failure {
            Some(notification) => Err(notification),
            None => Ok(()),
        }
    }

    /// Like [`send`](Sender::send), but resolves only once the record has
    /// been written and the endpoints flushed, or dropped by a stopping
    /// notifier. Never resolves if the loop is never started.
    pub async fn send_confirmed(&self, value: impl Into<Payload>) -> Result<(), Notification> {
        let payload = value.into();
        let failure = payload.as_failure();
        let (tx, rx) = oneshot::channel();
        self.router
            .submit(
                Note::new(Arc::clone(&self.name), payload)
                    .with_confirmation(Confirmation::new(tx)),
            )
            .await;
        let _ = rx.await;
        match failure {
            Some(notification) => Err(notification),
            None => Ok(()),
        }
    }

    /// Submit plain text
    pub async fn message(&self, text: impl Into<String>) {
        self.router
            .submit(Note::new(Arc::clone(&self.name), Payload::Message(text.into())))
            .await;
    }

    /// Queue `err` as a code-1 error and give it back unchanged
    pub async fn error<E>(&self, err: E) -> E
    where
        E: std::error::Error + 'static,
    {
        self.router
            .submit(Note::new(Arc::clone(&self.name), Payload::error(&err)))
            .await;
        err
    }

    /// Submit a value that has no dedicated encoding; it is logged as a
    /// "should never happen" record
    pub async fn unrecognized(&self, value: &impl std::fmt::Debug) {
        self.router
            .submit(Note::new(Arc::clone(&self.name), Payload::unrecognized(value)))
            .await;
    }
}

/// Handle that turns `(code, message)` into a queued [`Notification`]
#[derive(Clone)]
pub struct Failure {
    name: Arc<str>,
    router: Router,
}

impl Failure {
    pub(crate) fn new(name: impl Into<String>, router: Router) -> Self {
        Self {
            name: Arc::from(name.into()),
            router,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a coded notification and return it for propagation.
    ///
    /// The message is suffixed with ` -> [file: line]` naming the call site,
    /// so a record points back at the code that raised it.
    #[track_caller]
    pub fn fail(
        &self,
        code: i32,
        message: impl Into<String>,
    ) -> impl Future<Output = Notification> + Send {
        let notification = Notification::new(
            code,
            format!("{}{}", message.into(), call_site(Location::caller())),
        );
        let router = self.router.clone();
        let name = Arc::clone(&self.name);
        async move {
            router
                .submit(Note::new(
                    name,
                    Payload::Notification(notification.clone()),
                ))
                .await;
            notification
        }
    }
}

/// ` -> [sender.rs: 42]` for a caller in `src/notify/sender.rs` line 42
fn call_site(location: &Location<'_>) -> String {
    let file = Path::new(location.file())
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(location.file());
    format!(" -> [{}: {}]", file, location.line())
}
