// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Notifier configuration file types and parsing.
//!
//! JSON5 format supporting:
//! - Service and instance naming
//! - Endpoint lists (`"stdout"` or `"-"` name the console)
//! - A partial notification-code replacement
//! - Comments and trailing commas

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::notify::codes::CodeEntry;
use crate::notify::notifier::DEFAULT_CAPACITY;
use crate::notify::{CodeTable, EndpointRef, EndpointRegistry, Format, Notifier, NotifierBuilder};

/// Notifier configuration (JSON5 file format)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotifierConfig {
    /// Service name written in every record
    pub service: String,

    /// Instance name written in every record
    pub instance: String,

    /// Write plain messages too, not only errors
    #[serde(default)]
    pub log_all: bool,

    /// Submit from detached tasks instead of waiting for queue space
    #[serde(default, rename = "async")]
    pub async_send: bool,

    /// Line encoding
    #[serde(default)]
    pub format: Format,

    /// Queue capacity
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Log file paths, or "stdout"
    #[serde(default)]
    pub endpoints: Vec<String>,

    /// Code replacement, keyed by the decimal code
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub codes: BTreeMap<String, CodeEntry>,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl NotifierConfig {
    pub fn new(service: impl Into<String>, instance: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            instance: instance.into(),
            log_all: false,
            async_send: false,
            format: Format::Text,
            capacity: DEFAULT_CAPACITY,
            endpoints: Vec::new(),
            codes: BTreeMap::new(),
        }
    }

    /// Load configuration from a JSON5 file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(path.to_path_buf(), e.to_string()))?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON5 string
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Serialize configuration (plain JSON, which is valid JSON5)
    pub fn to_json5(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity);
        }

        for (index, endpoint) in self.endpoints.iter().enumerate() {
            if endpoint.trim().is_empty() {
                return Err(ConfigError::EmptyEndpoint { index });
            }
        }

        self.code_entries().map(|_| ())
    }

    /// The code replacement with parsed, range-checked keys
    pub fn code_entries(&self) -> Result<Vec<(i32, CodeEntry)>, ConfigError> {
        self.codes
            .iter()
            .map(|(key, entry)| {
                let code: i32 = key.trim().parse().map_err(|_| ConfigError::InvalidCode {
                    key: key.clone(),
                    reason: "not an integer".to_string(),
                })?;
                if !CodeTable::is_replaceable(code) {
                    return Err(ConfigError::InvalidCode {
                        key: key.clone(),
                        reason: "only codes 1 < code < 999 are replaceable".to_string(),
                    });
                }
                Ok((code, entry.clone()))
            })
            .collect()
    }

    /// A builder preloaded with this configuration
    pub fn builder(&self) -> Result<NotifierBuilder, ConfigError> {
        self.validate()?;

        let mut builder = Notifier::builder(&self.service, &self.instance)
            .log_all(self.log_all)
            .async_send(self.async_send)
            .format(self.format)
            .capacity(self.capacity)
            .endpoints(self.endpoints.iter().map(|e| EndpointRef::from_spec(e)));

        let codes = self.code_entries()?;
        if !codes.is_empty() {
            builder = builder.codes(codes);
        }
        Ok(builder)
    }

    /// Validate and build a notifier
    pub fn build(&self, registry: Option<EndpointRegistry>) -> Result<Notifier, ConfigError> {
        let mut builder = self.builder()?;
        if let Some(registry) = registry {
            builder = builder.registry(registry);
        }
        Ok(builder.build())
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    IoError(std::path::PathBuf, String),
    ParseError(String),
    InvalidCapacity,
    EmptyEndpoint { index: usize },
    InvalidCode { key: String, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(path, msg) => {
                write!(
                    f,
                    "failed to read config file '{}': {}",
                    path.display(),
                    msg
                )
            }
            ConfigError::ParseError(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::InvalidCapacity => write!(f, "queue capacity must be at least 1"),
            ConfigError::EmptyEndpoint { index } => {
                write!(f, "endpoint {} is empty", index + 1)
            }
            ConfigError::InvalidCode { key, reason } => {
                write!(f, "invalid notification code '{}': {}", key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
