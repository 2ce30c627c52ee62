// SPDX-License-Identifier: Apache-2.0 OR MIT
// Formatting shorthands for the producer handles

/// Queue a coded failure with a formatted message.
///
/// Expands to a future yielding the [`Notification`](crate::Notification).
/// The recorded call site is the macro invocation.
///
/// # Examples
/// ```ignore
/// return Err(fail!(failure, FAILED_ACTION, "could not open {}", path).await);
/// ```
#[macro_export]
macro_rules! fail {
    ($failure:expr, $code:expr, $($arg:tt)+) => {
        $failure.fail($code, format!($($arg)+))
    };
}

/// Queue a formatted plain message.
///
/// # Examples
/// ```ignore
/// note!(sender, "listening on {}", addr).await;
/// ```
#[macro_export]
macro_rules! note {
    ($sender:expr, $($arg:tt)+) => {
        $sender.message(format!($($arg)+))
    };
}
