// SPDX-License-Identifier: Apache-2.0 OR MIT
// Log entry: one formatted record, one line per endpoint write

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Placeholder for empty fields
pub const NOT_AVAILABLE: &str = "N/A";

/// Characters that would break the one-record-per-line format
const CONTROL_CHARS: [char; 6] = ['\t', '\n', '\r', '\u{8}', '\u{c}', '\u{b}'];

/// Output encoding for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Eight tab-separated fields
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// A single record as written to the endpoints.
///
/// Text layout (8 fields):
/// `timestamp service instance sender severity code label message`, e.g.
/// `1481552049\tbeacon\tbeacon_server_01\tdispatcher\tERR\t3\tFailedAction\tCould not dispatch job`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogEntry {
    /// Unix timestamp (seconds)
    pub timestamp: i64,
    pub service: String,
    pub instance: String,
    pub sender: String,
    #[serde(rename = "Level")]
    pub severity: String,
    pub code: i32,
    #[serde(rename = "Status")]
    pub label: String,
    pub message: String,
}

impl LogEntry {
    /// Create an entry stamped with the current time. Every string field is
    /// sanitized.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        service: &str,
        instance: &str,
        sender: &str,
        severity: &str,
        code: i32,
        label: &str,
        message: &str,
    ) -> Self {
        Self {
            timestamp: chrono::Utc::now().timestamp(),
            service: sanitize(service),
            instance: sanitize(instance),
            sender: sanitize(sender),
            severity: sanitize(severity),
            code,
            label: sanitize(label),
            message: sanitize(message),
        }
    }

    /// Tab-separated line (no trailing newline)
    pub fn to_line(&self) -> String {
        format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            self.timestamp,
            self.service,
            self.instance,
            self.sender,
            self.severity,
            self.code,
            self.label,
            self.message
        )
    }

    /// JSON object (no trailing newline)
    pub fn to_json(&self) -> String {
        match serde_json::to_string(self) {
            Ok(json) => json,
            Err(e) => {
                warn!(target: "notify", "could not convert log entry to JSON: {}", e);
                r#"{"ERROR": "Could not convert log entry to JSON"}"#.to_string()
            }
        }
    }

    pub fn render(&self, format: Format) -> String {
        match format {
            Format::Text => self.to_line(),
            Format::Json => self.to_json(),
        }
    }
}

/// Replace empty strings with [`NOT_AVAILABLE`] and control characters with spaces
pub fn sanitize(field: &str) -> String {
    if field.is_empty() {
        return NOT_AVAILABLE.to_string();
    }
    field.replace(&CONTROL_CHARS[..], " ")
}
