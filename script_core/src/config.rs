//! Configuration for a scripting context.
//!
//! Loaded from TOML; every key is optional.
//!
//! ```toml
//! name = "main"
//! repeat_policy = "fixed_rate"
//! catch_panics = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// How a repeating timer picks its next due time after firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepeatPolicy {
    /// `due_at += interval`. Late ticks do not push the schedule back.
    #[default]
    FixedRate,

    /// `due_at = now + interval`. The next firing is measured from the tick
    /// that fired.
    FixedDelay,
}

/// Settings for one [`ScriptContext`](crate::ScriptContext).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScriptConfig {
    /// Label used in log output.
    pub name: String,

    /// Drift policy for repeating timers.
    pub repeat_policy: RepeatPolicy,

    /// Turn panics inside callbacks into reported failures instead of
    /// unwinding into the host.
    pub catch_panics: bool,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            name: "main".to_string(),
            repeat_policy: RepeatPolicy::FixedRate,
            catch_panics: true,
        }
    }
}

impl ScriptConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Set the context name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the repeat policy.
    pub fn with_repeat_policy(mut self, policy: RepeatPolicy) -> Self {
        self.repeat_policy = policy;
        self
    }

    /// Enable or disable panic capture.
    pub fn with_catch_panics(mut self, catch: bool) -> Self {
        self.catch_panics = catch;
        self
    }
}
