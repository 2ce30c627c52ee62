// SPDX-License-Identifier: Apache-2.0 OR MIT
// Notification codes (code -> severity tag + label)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Plain, non-error messages
pub const GENERAL_MESSAGE: i32 = 0;
/// Nonspecific error; also used for errors that carry no code
pub const GENERAL_ERROR: i32 = 1;
/// Inappropriate configuration value
pub const CONFIGURATION_ERROR: i32 = 2;
/// Failed attempt to do something (open or write a file, ...)
pub const FAILED_ACTION: i32 = 3;
/// Misuse by the caller
pub const USER_ERROR: i32 = 4;
/// An error that should bring the program down
pub const CATASTROPHIC_FAILURE: i32 = 10;
/// Internal "should never happen" conditions
pub const SHOULD_NEVER_HAPPEN: i32 = 999;

/// Codes that must resolve for the whole lifetime of a notifier
pub const SYSTEM_CODES: [i32; 3] = [GENERAL_MESSAGE, GENERAL_ERROR, SHOULD_NEVER_HAPPEN];

const MSG: &str = "MSG";
const ERR: &str = "ERR";

// Built-in table: (code, severity tag, label)
const STANDARD_CODES: &[(i32, &str, &str)] = &[
    (GENERAL_MESSAGE, MSG, "GeneralMessage"),
    (GENERAL_ERROR, ERR, "GeneralError"),
    (CONFIGURATION_ERROR, ERR, "ConfigurationError"),
    (FAILED_ACTION, ERR, "FailedAction"),
    (USER_ERROR, ERR, "UserError"),
    (CATASTROPHIC_FAILURE, ERR, "CatastrophicFailure"),
    (100, MSG, "HTTP-StatusContinue"),
    (101, MSG, "HTTP-StatusSwitchingProtocols"),
    (102, MSG, "HTTP-StatusProcessing"),
    (200, MSG, "HTTP-StatusOK"),
    (201, MSG, "HTTP-StatusCreated"),
    (202, MSG, "HTTP-StatusAccepted"),
    (203, MSG, "HTTP-StatusNonAuthoritativeInfo"),
    (204, MSG, "HTTP-StatusNoContent"),
    (205, MSG, "HTTP-StatusResetContent"),
    (206, MSG, "HTTP-StatusPartialContent"),
    (207, MSG, "HTTP-StatusMultiStatus"),
    (208, MSG, "HTTP-StatusAlreadyReported"),
    (226, MSG, "HTTP-StatusIMUsed"),
    (300, MSG, "HTTP-StatusMultipleChoices"),
    (301, MSG, "HTTP-StatusMovedPermanently"),
    (302, MSG, "HTTP-StatusFound"),
    (303, MSG, "HTTP-StatusSeeOther"),
    (304, MSG, "HTTP-StatusNotModified"),
    (305, MSG, "HTTP-StatusUseProxy"),
    (307, MSG, "HTTP-StatusTemporaryRedirect"),
    (308, MSG, "HTTP-StatusPermanentRedirect"),
    (400, ERR, "HTTP-StatusBadRequest"),
    (401, ERR, "HTTP-StatusUnauthorized"),
    (402, ERR, "HTTP-StatusPaymentRequired"),
    (403, ERR, "HTTP-StatusForbidden"),
    (404, ERR, "HTTP-StatusNotFound"),
    (405, ERR, "HTTP-StatusMethodNotAllowed"),
    (406, ERR, "HTTP-StatusNotAcceptable"),
    (407, ERR, "HTTP-StatusProxyAuthRequired"),
    (408, ERR, "HTTP-StatusRequestTimeout"),
    (409, ERR, "HTTP-StatusConflict"),
    (410, ERR, "HTTP-StatusGone"),
    (411, ERR, "HTTP-StatusLengthRequired"),
    (412, ERR, "HTTP-StatusPreconditionFailed"),
    (413, ERR, "HTTP-StatusRequestEntityTooLarge"),
    (414, ERR, "HTTP-StatusRequestURITooLong"),
    (415, ERR, "HTTP-StatusUnsupportedMediaType"),
    (416, ERR, "HTTP-StatusRequestedRangeNotSatisfiable"),
    (417, ERR, "HTTP-StatusExpectationFailed"),
    (418, ERR, "HTTP-StatusTeapot"),
    (422, ERR, "HTTP-StatusUnprocessableEntity"),
    (423, ERR, "HTTP-StatusLocked"),
    (424, ERR, "HTTP-StatusFailedDependency"),
    (426, ERR, "HTTP-StatusUpgradeRequired"),
    (428, ERR, "HTTP-StatusPreconditionRequired"),
    (429, ERR, "HTTP-StatusTooManyRequests"),
    (431, ERR, "HTTP-StatusRequestHeaderFieldsTooLarge"),
    (451, ERR, "HTTP-StatusUnavailableForLegalReasons"),
    (500, ERR, "HTTP-StatusInternalServerError"),
    (501, ERR, "HTTP-StatusNotImplemented"),
    (502, ERR, "HTTP-StatusBadGateway"),
    (503, ERR, "HTTP-StatusServiceUnavailable"),
    (504, ERR, "HTTP-StatusGatewayTimeout"),
    (505, ERR, "HTTP-StatusHTTPVersionNotSupported"),
    (506, ERR, "HTTP-StatusVariantAlsoNegotiates"),
    (507, ERR, "HTTP-StatusInsufficientStorage"),
    (508, ERR, "HTTP-StatusLoopDetected"),
    (510, ERR, "HTTP-StatusNotExtended"),
    (511, ERR, "HTTP-StatusNetworkAuthenticationRequired"),
    (SHOULD_NEVER_HAPPEN, ERR, "ShouldNeverHappen"),
];

/// Severity tag and human label for one notification code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    /// Free-form severity tag, e.g. "MSG", "ERR", "WRN"
    pub severity: String,
    pub label: String,
}

impl CodeEntry {
    pub fn new(severity: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            severity: severity.into(),
            label: label.into(),
        }
    }

    /// Entry tagged as a plain message
    pub fn message(label: impl Into<String>) -> Self {
        Self::new(MSG, label)
    }

    /// Entry tagged as an error
    pub fn error(label: impl Into<String>) -> Self {
        Self::new(ERR, label)
    }
}

/// Mapping from notification code to its [`CodeEntry`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeTable {
    entries: HashMap<i32, CodeEntry>,
}

impl CodeTable {
    /// The built-in table every notifier starts with
    pub fn standard() -> Self {
        let entries = STANDARD_CODES
            .iter()
            .map(|&(code, severity, label)| (code, CodeEntry::new(severity, label)))
            .collect();
        Self { entries }
    }

    /// Whether `code` may be overridden by a custom table (1 < code < 999)
    pub const fn is_replaceable(code: i32) -> bool {
        code > GENERAL_ERROR && code < SHOULD_NEVER_HAPPEN
    }

    pub fn lookup(&self, code: i32) -> Option<&CodeEntry> {
        self.entries.get(&code)
    }

    pub fn contains(&self, code: i32) -> bool {
        self.entries.contains_key(&code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Apply a partial replacement on top of this table.
    ///
    /// Entries outside the replaceable range are skipped; their codes are
    /// returned (sorted) so the caller can report them. Everything else is
    /// inserted or overwritten.
    pub fn merge<I>(&mut self, replacement: I) -> Vec<i32>
    where
        I: IntoIterator<Item = (i32, CodeEntry)>,
    {
        let mut rejected = Vec::new();
        for (code, entry) in replacement {
            if Self::is_replaceable(code) {
                self.entries.insert(code, entry);
            } else {
                rejected.push(code);
            }
        }
        rejected.sort_unstable();
        rejected
    }

    /// Resolve one of the [`SYSTEM_CODES`].
    ///
    /// # Panics
    /// Panics if the code is missing. The merge rules make that unreachable,
    /// so reaching it means the table was corrupted and the process must stop.
    pub fn system(&self, code: i32) -> &CodeEntry {
        match self.entries.get(&code) {
            Some(entry) => entry,
            None => panic!("notify: notification code {} is not available", code),
        }
    }

    /// Check that every system code resolves (panics otherwise)
    pub fn assert_system_codes(&self) {
        for code in SYSTEM_CODES {
            self.system(code);
        }
    }
}

impl Default for CodeTable {
    fn default() -> Self {
        Self::standard()
    }
}
