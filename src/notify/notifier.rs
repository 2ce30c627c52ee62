// SPDX-License-Identifier: Apache-2.0 OR MIT
// Notifier: owns the queue, the endpoints and the consumer loop

use super::codes::{
    CodeEntry, CodeTable, GENERAL_ERROR, GENERAL_MESSAGE, SHOULD_NEVER_HAPPEN, USER_ERROR,
};
use super::endpoint::{EndpointRef, EndpointRegistry, EndpointSet, SinkIdentity};
use super::entry::{Format, LogEntry};
use super::notification::{Notification, Payload};
use super::route::{Confirmation, Note, Router};
use super::sender::{Failure, Sender};
use super::NotifyError;
use std::sync::OnceLock;
use tokio::sync::{mpsc, oneshot, watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Sender name used for notes the notifier writes about itself
pub const NOTIFIER: &str = "notifier";

/// Default queue capacity
pub const DEFAULT_CAPACITY: usize = 100;

/// Message of the final note written by [`Notifier::exit`]
pub const STOPPING_MESSAGE: &str = "Notifier is stopping: queue drained, closing endpoints.";

/// Message written in place of a value that has no encoding
pub const UNKNOWN_VALUE_MESSAGE: &str = "Unknown value used in send";

/// Observable lifecycle of a notifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    /// Built; submissions are queued but nothing is written yet
    NotStarted,
    /// The consumer loop is running
    Running,
    /// `exit` is draining the queue
    Halting,
    /// Endpoints are closed; every further submission is rejected
    Stopped,
}

/// A single-consumer notification service.
///
/// Producers get [`Sender`] and [`Failure`] handles and submit concurrently;
/// [`run`](Notifier::run) consumes the queue in submission order and writes
/// one line per record to every endpoint. Share it behind an `Arc`.
pub struct Notifier {
    service: String,
    instance: String,
    log_all: bool,
    format: Format,
    router: Router,
    receiver: Mutex<Option<mpsc::Receiver<Note>>>,
    standard_codes: CodeTable,
    custom_codes: OnceLock<CodeTable>,
    endpoints: Mutex<EndpointSet>,
    closed: CancellationToken,
    state: watch::Sender<State>,
}

impl Notifier {
    pub fn builder(service: impl Into<String>, instance: impl Into<String>) -> NotifierBuilder {
        NotifierBuilder::new(service, instance)
    }

    /// `Notifier[service][instance] 0x...`; unique per live instance
    pub fn id(&self) -> String {
        format!("Notifier[{}][{}] {:p}", self.service, self.instance, self)
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn logs_all(&self) -> bool {
        self.log_all
    }

    /// The code table records are resolved against
    pub fn codes(&self) -> &CodeTable {
        self.custom_codes.get().unwrap_or(&self.standard_codes)
    }

    pub fn state(&self) -> State {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions
    pub fn subscribe(&self) -> watch::Receiver<State> {
        self.state.subscribe()
    }

    /// Whether the consumer loop is running
    pub async fn is_ready(&self) -> bool {
        self.router.ops.read().await.running
    }

    /// Resolves once the loop has left [`State::NotStarted`]
    pub async fn started(&self) {
        let mut rx = self.state.subscribe();
        let _ = rx.wait_for(|state| *state != State::NotStarted).await;
    }

    /// Identities of the endpoints currently open, in insertion order
    pub async fn endpoints(&self) -> Vec<Option<SinkIdentity>> {
        self.endpoints.lock().await.identities()
    }

    /// Producer handle that submits under `name`
    pub fn sender(&self, name: impl Into<String>) -> Sender {
        Sender::new(name, self.router.clone())
    }

    /// Producer handle for coded failures under `name`
    pub fn failure(&self, name: impl Into<String>) -> Failure {
        Failure::new(name, self.router.clone())
    }

    /// Replace part of the code table.
    ///
    /// Allowed once, and only before the loop starts. Entries outside
    /// `1 < code < 999` are skipped and reported; the valid ones still apply.
    pub async fn set_codes<I>(&self, codes: I) -> Result<(), NotifyError>
    where
        I: IntoIterator<Item = (i32, CodeEntry)>,
    {
        self.codes().assert_system_codes();

        let rejected = {
            let ops = self.router.ops.read().await;
            if ops.running || ops.halt {
                return Err(NotifyError::CodesLocked);
            }
            let mut table = self.standard_codes.clone();
            let rejected = table.merge(codes);
            if self.custom_codes.get().is_some() || self.custom_codes.set(table).is_err() {
                drop(ops);
                self.note_to_self(Notification::new(
                    SHOULD_NEVER_HAPPEN,
                    "Notification codes may only be replaced once; the replacement was ignored",
                ));
                return Err(NotifyError::CodesAlreadyReplaced);
            }
            rejected
        };

        for code in &rejected {
            self.note_to_self(Notification::new(
                USER_ERROR,
                format!(
                    "Only notification codes 1 < code < 999 are replaceable. Removing '{}'",
                    code
                ),
            ));
        }

        if rejected.is_empty() {
            Ok(())
        } else {
            Err(NotifyError::InvalidCodes {
                count: rejected.len(),
            })
        }
    }

    /// Consume the queue until [`exit`](Notifier::exit) is called.
    ///
    /// Runs at most once per notifier; a second call (or a call after exit)
    /// returns [`NotifyError::LoopUnavailable`].
    pub async fn run(&self) -> Result<(), NotifyError> {
        self.codes().assert_system_codes();

        let mut receiver = self
            .receiver
            .lock()
            .await
            .take()
            .ok_or_else(|| NotifyError::LoopUnavailable { id: self.id() })?;
        let mut endpoints = self.endpoints.lock().await;

        // Synchronous senders may be parked on a full queue while holding the
        // read side; keep draining until the write side is ours.
        let mut ops = loop {
            tokio::select! {
                biased;
                ops = self.router.ops.write() => break ops,
                Some(note) = receiver.recv() => {
                    let idle = receiver.is_empty();
                    self.consume(note, &mut endpoints, idle);
                }
            }
        };
        ops.running = true;
        self.state.send_replace(State::Running);
        drop(ops);
        debug!(target: "notify", notifier = %self.id(), "consumer loop started");

        loop {
            let note = tokio::select! {
                biased;
                note = receiver.recv() => match note {
                    Some(note) => note,
                    None => break,
                },
                _ = self.closed.cancelled() => break,
            };
            let idle = receiver.is_empty();
            self.consume(note, &mut endpoints, idle);
        }

        receiver.close();
        endpoints.flush();
        debug!(target: "notify", notifier = %self.id(), "consumer loop finished");
        Ok(())
    }

    /// Stop the loop after everything queued so far has been written, then
    /// close the endpoints. Submissions racing with or following this call
    /// are dropped with a warning.
    pub async fn exit(&self) -> Result<(), NotifyError> {
        let (confirm_tx, confirm_rx) = oneshot::channel();
        {
            let mut ops = self.router.ops.write().await;
            if ops.halt {
                return Err(NotifyError::Halting { id: self.id() });
            }
            if !ops.running {
                return Err(NotifyError::NotRunning { id: self.id() });
            }
            ops.halt = true;
            self.state.send_replace(State::Halting);

            let stop = Note::new(NOTIFIER, Payload::Message(STOPPING_MESSAGE.to_string()))
                .with_confirmation(Confirmation::new(confirm_tx));
            if self.router.tx.send(stop).await.is_err() {
                warn!(target: "notify", notifier = %self.id(), "queue closed before the stop note");
            }
        }

        confirm_rx
            .await
            .map_err(|_| NotifyError::ConsumerGone { id: self.id() })?;

        self.closed.cancel();
        self.endpoints.lock().await.close();

        self.router.ops.write().await.running = false;
        self.state.send_replace(State::Stopped);
        debug!(target: "notify", notifier = %self.id(), "stopped");
        Ok(())
    }

    fn consume(&self, note: Note, endpoints: &mut EndpointSet, idle: bool) {
        if self.log_all || !matches!(note.payload, Payload::Message(_)) {
            let entry = self.entry_for(&note);
            endpoints.write_line(&entry.render(self.format));
        }
        if idle || note.confirm.is_some() {
            endpoints.flush();
        }
        // dropping the note fires its confirmation
    }

    fn entry_for(&self, note: &Note) -> LogEntry {
        let codes = self.codes();
        let (code, message) = match &note.payload {
            Payload::Notification(n) if codes.contains(n.code()) => (n.code(), n.message().to_string()),
            Payload::Notification(n) => {
                self.note_to_self(Notification::new(
                    SHOULD_NEVER_HAPPEN,
                    format!(
                        "Unknown notification code used. Replacing '{}' with '{}'",
                        n.code(),
                        GENERAL_ERROR
                    ),
                ));
                (GENERAL_ERROR, n.message().to_string())
            }
            Payload::Error(message) => (GENERAL_ERROR, message.clone()),
            Payload::Message(text) => (GENERAL_MESSAGE, text.clone()),
            Payload::Unrecognized(value) => {
                self.note_to_self(Notification::new(
                    SHOULD_NEVER_HAPPEN,
                    format!("'{}' sent a value of unsupported type: {}", note.sender, value),
                ));
                (SHOULD_NEVER_HAPPEN, UNKNOWN_VALUE_MESSAGE.to_string())
            }
        };

        let entry = codes.lookup(code).unwrap_or_else(|| codes.system(code));
        LogEntry::new(
            &self.service,
            &self.instance,
            &note.sender,
            &entry.severity,
            code,
            &entry.label,
            &message,
        )
    }

    // Always detached: the consumer must never wait on its own queue.
    fn note_to_self(&self, notification: Notification) {
        self.router
            .spawn_route(Note::new(NOTIFIER, Payload::Notification(notification)));
    }
}

/// Configures and builds a [`Notifier`]
pub struct NotifierBuilder {
    service: String,
    instance: String,
    log_all: bool,
    async_send: bool,
    format: Format,
    capacity: usize,
    endpoints: Vec<EndpointRef>,
    registry: Option<EndpointRegistry>,
    codes: Option<Vec<(i32, CodeEntry)>>,
}

impl NotifierBuilder {
    pub fn new(service: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            instance: instance.into(),
            log_all: false,
            async_send: false,
            format: Format::Text,
            capacity: DEFAULT_CAPACITY,
            endpoints: Vec::new(),
            registry: None,
            codes: None,
        }
    }

    /// Also write plain messages (code 0); errors are always written
    pub fn log_all(mut self, log_all: bool) -> Self {
        self.log_all = log_all;
        self
    }

    /// Submit from detached tasks instead of waiting for queue space
    pub fn async_send(mut self, async_send: bool) -> Self {
        self.async_send = async_send;
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn json(self, json: bool) -> Self {
        self.format(if json { Format::Json } else { Format::Text })
    }

    /// Queue capacity; 0 is raised to 1
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<EndpointRef>) -> Self {
        self.endpoints.push(endpoint.into());
        self
    }

    pub fn endpoints<I, E>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<EndpointRef>,
    {
        self.endpoints.extend(endpoints.into_iter().map(Into::into));
        self
    }

    /// Share file ownership with other notifiers built on the same registry
    pub fn registry(mut self, registry: EndpointRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Apply the one permitted code replacement at construction
    pub fn codes<I>(mut self, codes: I) -> Self
    where
        I: IntoIterator<Item = (i32, CodeEntry)>,
    {
        self.codes = Some(codes.into_iter().collect());
        self
    }

    pub fn build(self) -> Notifier {
        let capacity = if self.capacity == 0 {
            warn!(target: "notify", "queue capacity must be at least 1; using 1");
            1
        } else {
            self.capacity
        };

        let mut endpoints = EndpointSet::new(self.registry);
        if self.endpoints.is_empty() {
            warn!(target: "notify", "no endpoints given; routing all notes to stdout");
        }
        for endpoint in self.endpoints {
            endpoints.add(endpoint);
        }
        endpoints.ensure_console();

        let standard_codes = CodeTable::standard();
        let custom_codes = OnceLock::new();
        if let Some(codes) = self.codes {
            let mut table = standard_codes.clone();
            for code in table.merge(codes) {
                warn!(
                    target: "notify",
                    "only notification codes 1 < code < 999 are replaceable; removing '{}'",
                    code
                );
            }
            let _ = custom_codes.set(table);
        }

        let (tx, rx) = mpsc::channel(capacity);
        let (state, _) = watch::channel(State::NotStarted);

        Notifier {
            service: self.service,
            instance: self.instance,
            log_all: self.log_all,
            format: self.format,
            router: Router::new(tx, self.async_send),
            receiver: Mutex::new(Some(rx)),
            standard_codes,
            custom_codes,
            endpoints: Mutex::new(endpoints),
            closed: CancellationToken::new(),
            state,
        }
    }
}
