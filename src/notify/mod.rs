// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Notification service: many concurrent producers, one consumer loop.
//!
//! Producers submit plain messages, errors and coded [`Notification`]s
//! through [`Sender`] and [`Failure`] handles. The [`Notifier`] resolves each
//! record's code against its [`CodeTable`] and writes one line per record to
//! every endpoint, in submission order.

pub mod codes;
pub mod endpoint;
pub mod entry;
mod error;
mod macros;
pub mod notification;
pub mod notifier;
mod route;
pub mod sender;
pub mod service;

pub use codes::{CodeEntry, CodeTable};
pub use endpoint::{
    ConsoleSink, EndpointRef, EndpointRegistry, EndpointSet, FileSink, LogSink, MemorySink,
    SinkIdentity,
};
pub use entry::{Format, LogEntry};
pub use error::NotifyError;
pub use notification::{is_code, Notification, Payload};
pub use notifier::{Notifier, NotifierBuilder, State, NOTIFIER};
pub use sender::{Failure, Sender};
pub use service::NotifierService;
