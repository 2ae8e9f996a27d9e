//! Agent configuration
//!
//! # Example
//!
//! ```rust
//! use anyagent::engine::config::AgentConfig;
//!
//! let config = AgentConfig::new()
//!     .with_max_recursion_depth(200)
//!     .with_atomic_write(false);
//! assert_eq!(config.max_recursion_depth, 200);
//! assert!(config.keep_line_terminators);
//! ```

use serde::{Deserialize, Serialize};

/// Default maximum recursion depth of the interpreter
pub const DEFAULT_MAX_RECURSION_DEPTH: usize = 1000;

/// Locale spawned programs run under
pub const DEFAULT_PROGRAM_LOCALE: &str = "C";

/// Settings for one [`AnyAgent`](super::agent::AnyAgent)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Maximum interpreter nesting depth (0 = unlimited)
    pub max_recursion_depth: usize,

    /// Keep `\n` at the end of cached lines
    pub keep_line_terminators: bool,

    /// Write through a temporary file renamed over the target
    pub atomic_write: bool,

    /// Append `\n` to written content
    pub trailing_newline: bool,

    /// `LC_ALL` for spawned programs (`None` = inherit)
    pub program_locale: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
            keep_line_terminators: true,
            atomic_write: true,
            trailing_newline: true,
            program_locale: Some(DEFAULT_PROGRAM_LOCALE.to_string()),
        }
    }
}

impl AgentConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum recursion depth
    pub fn with_max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }

    /// Keep or trim line terminators
    pub fn with_keep_line_terminators(mut self, keep: bool) -> Self {
        self.keep_line_terminators = keep;
        self
    }

    /// Enable or disable atomic writes
    pub fn with_atomic_write(mut self, atomic: bool) -> Self {
        self.atomic_write = atomic;
        self
    }

    /// Enable or disable the trailing newline on writes
    pub fn with_trailing_newline(mut self, newline: bool) -> Self {
        self.trailing_newline = newline;
        self
    }

    /// Set the locale for spawned programs
    pub fn with_program_locale(mut self, locale: Option<&str>) -> Self {
        self.program_locale = locale.map(str::to_string);
        self
    }

    /// Read a config from JSON; missing fields take their defaults
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
