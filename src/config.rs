//! Server configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::engine::seconds_to_duration;
use crate::error::SolverError;

/// Default upper bound on a request frame (16 MiB).
pub const DEFAULT_MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

/// Runtime settings for the stdio server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Log verbosity when `RUST_LOG` is unset (`error` .. `trace`).
    pub log_level: String,
    /// Emit logs as JSON lines.
    pub log_json: bool,
    /// Time limit in seconds for solves that set none. `None` = unlimited.
    pub default_timeout_secs: Option<f64>,
    /// Largest accepted request payload.
    pub max_frame_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_json: false,
            default_timeout_secs: None,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl ServerConfig {
    /// Sets the log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enables or disables JSON logs.
    pub fn with_log_json(mut self, json: bool) -> Self {
        self.log_json = json;
        self
    }

    /// Sets the default solve time limit in seconds.
    pub fn with_default_timeout(mut self, secs: Option<f64>) -> Self {
        self.default_timeout_secs = secs;
        self
    }

    /// Sets the frame size limit.
    pub fn with_max_frame_bytes(mut self, bytes: usize) -> Self {
        self.max_frame_bytes = bytes;
        self
    }

    /// The default time limit, validated.
    pub fn default_time_limit(&self) -> Result<Option<Duration>, SolverError> {
        self.default_timeout_secs
            .map(|secs| seconds_to_duration("default_timeout", secs))
            .transpose()
    }
}
