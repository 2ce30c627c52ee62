// SPDX-License-Identifier: Apache-2.0 OR MIT
// Coded notifications and the payload carried by a note

use super::codes::{GENERAL_ERROR, GENERAL_MESSAGE};
use super::NotifyError;
use std::fmt;
use thiserror::Error;
use tracing::warn;

/// An error value that also carries a classification code.
///
/// Returned by [`Failure::fail`](super::Failure::fail) after it has been
/// queued, so a call site can both log and propagate in one step.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct Notification {
    code: i32,
    message: String,
}

impl Notification {
    /// Build a notification. Negative codes are changed to
    /// [`GENERAL_ERROR`] with a warning; code 0 is kept as a plain message.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        let code = if code < GENERAL_MESSAGE {
            warn!(
                target: "notify",
                "a notification should have a non-negative code; changing {} to {}",
                code,
                GENERAL_ERROR
            );
            GENERAL_ERROR
        } else {
            code
        };

        Self {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// What a producer submits
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// Plain text; only written when the notifier logs everything
    Message(String),
    /// An error without a code (rendered with `Display`)
    Error(String),
    /// A coded notification
    Notification(Notification),
    /// A value the notifier has no encoding for (its `Debug` rendering)
    Unrecognized(String),
}

impl Payload {
    /// Wrap any error as a generic, code-1 payload
    pub fn error(err: &(dyn std::error::Error + 'static)) -> Self {
        Payload::Error(err.to_string())
    }

    /// Wrap a value that has no dedicated encoding
    pub fn unrecognized(value: &impl fmt::Debug) -> Self {
        Payload::Unrecognized(format!("{:?}", value))
    }

    /// The error a submission hands back to its caller, if any
    pub fn as_failure(&self) -> Option<Notification> {
        match self {
            Payload::Notification(n) => Some(n.clone()),
            Payload::Error(message) => Some(Notification::new(GENERAL_ERROR, message.clone())),
            Payload::Message(_) | Payload::Unrecognized(_) => None,
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Message(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Message(text)
    }
}

impl From<Notification> for Payload {
    fn from(notification: Notification) -> Self {
        Payload::Notification(notification)
    }
}

impl From<anyhow::Error> for Payload {
    fn from(err: anyhow::Error) -> Self {
        Payload::Error(format!("{:#}", err))
    }
}

impl From<std::io::Error> for Payload {
    fn from(err: std::io::Error) -> Self {
        Payload::Error(err.to_string())
    }
}

/// Whether `err` carries notification code `code`.
///
/// Errors that are neither a [`Notification`] nor a [`NotifyError`] count as
/// [`GENERAL_ERROR`].
pub fn is_code(code: i32, err: &(dyn std::error::Error + 'static)) -> bool {
    if let Some(notification) = err.downcast_ref::<Notification>() {
        notification.code() == code
    } else if let Some(notify_err) = err.downcast_ref::<NotifyError>() {
        notify_err.code() == code
    } else {
        code == GENERAL_ERROR
    }
}
