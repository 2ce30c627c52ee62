// SPDX-License-Identifier: Apache-2.0 OR MIT
//! In-process notification and structured logging service.
//!
//! ```ignore
//! let notifier = Arc::new(
//!     Notifier::builder("beacon", "beacon_server_01")
//!         .log_all(true)
//!         .endpoint("/var/log/beacon/beacon.log")
//!         .build(),
//! );
//! let service = NotifierService::start(notifier).await?;
//! let fail = service.failure("dispatcher");
//! return Err(fail!(fail, FAILED_ACTION, "could not dispatch job {}", id).await);
//! ```

pub mod config;
pub mod notify;

pub use config::{ConfigError, NotifierConfig};
pub use notify::codes;
pub use notify::{
    is_code, CodeEntry, CodeTable, EndpointRef, EndpointRegistry, Failure, Format, LogEntry,
    LogSink, MemorySink, Notification, Notifier, NotifierBuilder, NotifierService, NotifyError,
    Payload, Sender, SinkIdentity, State, NOTIFIER,
};
