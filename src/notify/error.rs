// SPDX-License-Identifier: Apache-2.0 OR MIT
// Errors returned by notifier operations

use super::codes::{SHOULD_NEVER_HAPPEN, USER_ERROR};
use thiserror::Error;

/// Misuse or lifecycle errors of a [`Notifier`](super::Notifier)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("{id} is not running")]
    NotRunning { id: String },

    #[error("{id} is already stopping")]
    Halting { id: String },

    #[error("cannot change codes on a running notifier")]
    CodesLocked,

    #[error("notification codes were already replaced; only one replacement is permitted")]
    CodesAlreadyReplaced,

    #[error("failed replacing {count} status codes: invalid range")]
    InvalidCodes { count: usize },

    #[error("{id} has no loop to run: it is already running or has stopped")]
    LoopUnavailable { id: String },

    #[error("{id} lost its consumer before the stop note was confirmed")]
    ConsumerGone { id: String },
}

impl NotifyError {
    /// Notification code this error is classified under
    pub fn code(&self) -> i32 {
        match self {
            NotifyError::CodesAlreadyReplaced
            | NotifyError::LoopUnavailable { .. }
            | NotifyError::ConsumerGone { .. } => SHOULD_NEVER_HAPPEN,
            _ => USER_ERROR,
        }
    }
}
