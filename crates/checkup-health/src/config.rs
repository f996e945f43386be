//! Checker configuration
//!
//! Read from the optional top-level `settings` mapping of an instruction set:
//!
//! ```yaml
//! settings:
//!   mode: sequential
//!   timeout: 5s
//!   strict: true
//! ```

use checkup_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Key holding [`CheckerConfig`] in an instruction set
pub const SETTINGS_KEY: &str = "settings";

/// How the checks of one run are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// One check at a time
    Sequential,
    /// All checks at once, joined before aggregation
    #[default]
    Concurrent,
}

/// Engine settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CheckerConfig {
    /// Scheduling mode
    pub mode: ExecutionMode,

    /// Per-check deadline; `None` waits indefinitely
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,

    /// Reject unrecognized per-check attributes instead of keeping them
    pub strict: bool,
}

impl CheckerConfig {
    /// Default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scheduling mode
    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set a per-check deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Toggle strict attribute validation
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Extract settings from an instruction set, defaulting when absent
    pub fn from_instructions(instructions: &Value) -> Result<Self> {
        match instructions.get(SETTINGS_KEY) {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(settings) => {
                let config: Self = serde_json::from_value(settings.clone())
                    .map_err(|e| Error::Config(format!("Invalid settings: {e}")))?;
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Reject nonsensical values
    pub fn validate(&self) -> Result<()> {
        if self.timeout == Some(Duration::ZERO) {
            return Err(Error::Config("timeout must be > 0".to_string()));
        }
        Ok(())
    }
}
