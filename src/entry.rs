//! Log entries and levels
//!
//! A [`LogEntry`] is one line of a trace: a message with a level, a timestamp
//! and the nesting depth it renders at. Entries may also carry a
//! `next_indent` override telling the *following* entries which indent to
//! inherit; see [`sink`](crate::sink) for the inheritance rule.
//!
//! # Examples
//!
//! ```
//! use tidemark::entry::{make_entry, render, Level, LogEntry};
//!
//! let logs = vec![
//!     make_entry("starting", Level::Info, 0),
//!     make_entry("loading config", Level::Debug, 4),
//! ];
//!
//! assert_eq!(render(&logs), "starting\n    loading config");
//! ```

use std::fmt;
use std::str::FromStr;

use crate::failure::ConfigError;

/// Severity of a log entry.
///
/// Levels are totally ordered: `Debug < Info < Warning < Error < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Level {
    /// Diagnostic detail.
    Debug,
    /// Normal progress.
    #[default]
    Info,
    /// Something unexpected that did not stop the computation.
    Warning,
    /// A failure.
    Error,
    /// A failure that compromises the whole run.
    Critical,
}

impl Level {
    /// Every level, lowest first.
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warning,
        Level::Error,
        Level::Critical,
    ];

    /// Lowercase name of the level.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Critical => "critical",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warning),
            "error" => Ok(Level::Error),
            "critical" => Ok(Level::Critical),
            _ => Err(ConfigError::UnknownLevel(s.to_string())),
        }
    }
}

/// One entry of a trace.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LogEntry {
    /// Nesting depth, in spaces, at which the entry renders.
    pub indent: usize,
    /// Wall-clock time of creation, in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// Severity.
    pub level: Level,
    /// The message.
    pub text: String,
    /// Indent that entries appended after this one inherit, instead of
    /// `indent`.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub next_indent: Option<usize>,
}

impl LogEntry {
    /// Create an entry stamped with the current time.
    pub fn new(text: impl Into<String>, level: Level, indent: usize) -> Self {
        LogEntry::at(now_millis(), text, level, indent)
    }

    /// Create an entry with an explicit timestamp.
    ///
    /// Useful for tests that compare traces structurally.
    pub fn at(timestamp: i64, text: impl Into<String>, level: Level, indent: usize) -> Self {
        LogEntry {
            indent,
            timestamp,
            level,
            text: text.into(),
            next_indent: None,
        }
    }

    /// Set the `next_indent` override.
    pub fn with_next_indent(mut self, next_indent: usize) -> Self {
        self.next_indent = Some(next_indent);
        self
    }

    /// The indent an entry appended after this one inherits.
    pub fn inherited_indent(&self) -> usize {
        self.next_indent.unwrap_or(self.indent)
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:width$}{}", "", self.text, width = self.indent)
    }
}

/// Create an entry stamped with the current time.
///
/// Free-function form of [`LogEntry::new`].
pub fn make_entry(text: impl Into<String>, level: Level, indent: usize) -> LogEntry {
    LogEntry::new(text, level, indent)
}

/// Render a trace as indented lines joined by `\n`.
pub fn render(logs: &[LogEntry]) -> String {
    logs.iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
