//! Filtering log sequences.
//!
//! A [`Filter`] selects entries along one of four independent axes: level,
//! indent, timestamp or text. Each axis has a default comparator and a default
//! value, so `Filter::for_mode(mode)` is always usable and the individual
//! constructors only ask for what differs.
//!
//! | Axis | Default comparator | Default value |
//! |---|---|---|
//! | level | `Ge` | `Info` |
//! | indent | `Le` | `0` |
//! | timestamp | `Ge` | `0` |
//! | text | `Matches` | everything |
//!
//! ```
//! use tidemark::entry::{Level, LogEntry};
//! use tidemark::filter::{Cmp, Filter};
//! use tidemark::sink::{LogSinkExt, Record};
//!
//! let logs = Vec::<LogEntry>::new()
//!     .debug("noise")
//!     .warning("disk almost full")
//!     .info(Record::new("nested detail").indent(4));
//!
//! let important = logs.clone().filter(&Filter::level(Level::Warning));
//! assert_eq!(important.len(), 1);
//!
//! let top_level = logs.filter(&Filter::indent(0));
//! assert_eq!(top_level.len(), 2);
//!
//! let shallow_or_deeper = Filter::indent(4).with_cmp(Cmp::Ge);
//! # let _ = shallow_or_deeper;
//! ```

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::entry::{Level, LogEntry};
use crate::failure::ConfigError;

/// How an entry's value is compared against the filter's value.
///
/// Reads as `entry <cmp> value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `>=`
    Ge,
    /// `>`
    Gt,
}

impl Cmp {
    /// Compare `lhs <cmp> rhs`.
    pub fn holds<T: Ord>(self, lhs: &T, rhs: &T) -> bool {
        match self {
            Cmp::Lt => lhs < rhs,
            Cmp::Le => lhs <= rhs,
            Cmp::Eq => lhs == rhs,
            Cmp::Ne => lhs != rhs,
            Cmp::Ge => lhs >= rhs,
            Cmp::Gt => lhs > rhs,
        }
    }
}

/// Whether text filters keep matching or non-matching entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextMatch {
    /// Keep entries whose text matches.
    Matches,
    /// Keep entries whose text does not match.
    DoesNotMatch,
}

/// The axis a filter works on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// By level order.
    Level,
    /// By indent threshold.
    Indent,
    /// By timestamp threshold.
    Timestamp,
    /// By text pattern.
    Text,
}

impl FromStr for FilterMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "level" => Ok(FilterMode::Level),
            "indent" => Ok(FilterMode::Indent),
            "timestamp" | "time" => Ok(FilterMode::Timestamp),
            "text" => Ok(FilterMode::Text),
            _ => Err(ConfigError::UnknownFilterMode(s.to_string())),
        }
    }
}

/// A predicate over log entries.
#[derive(Clone)]
pub enum Filter {
    /// Compare the entry's level.
    Level {
        /// Comparator.
        cmp: Cmp,
        /// Threshold.
        level: Level,
    },
    /// Compare the entry's indent.
    Indent {
        /// Comparator.
        cmp: Cmp,
        /// Threshold.
        indent: usize,
    },
    /// Compare the entry's timestamp (epoch milliseconds).
    Timestamp {
        /// Comparator.
        cmp: Cmp,
        /// Threshold.
        at: i64,
    },
    /// Match the entry's text. `None` matches every text.
    Text {
        /// Keep matching or non-matching entries.
        mode: TextMatch,
        /// Pattern.
        pattern: Option<Regex>,
    },
}

impl Filter {
    /// The default filter for an axis.
    pub fn for_mode(mode: FilterMode) -> Self {
        match mode {
            FilterMode::Level => Filter::level(Level::Info),
            FilterMode::Indent => Filter::indent(0),
            FilterMode::Timestamp => Filter::since(0),
            FilterMode::Text => Filter::Text {
                mode: TextMatch::Matches,
                pattern: None,
            },
        }
    }

    /// Entries at `level` or above.
    pub fn level(level: Level) -> Self {
        Filter::Level {
            cmp: Cmp::Ge,
            level,
        }
    }

    /// Entries at `indent` or shallower.
    pub fn indent(indent: usize) -> Self {
        Filter::Indent {
            cmp: Cmp::Le,
            indent,
        }
    }

    /// Entries created at `at` (epoch milliseconds) or later.
    pub fn since(at: i64) -> Self {
        Filter::Timestamp { cmp: Cmp::Ge, at }
    }

    /// Entries whose text matches `pattern`.
    pub fn matching(pattern: Regex) -> Self {
        Filter::Text {
            mode: TextMatch::Matches,
            pattern: Some(pattern),
        }
    }

    /// Entries whose text does not match `pattern`.
    pub fn not_matching(pattern: Regex) -> Self {
        Filter::Text {
            mode: TextMatch::DoesNotMatch,
            pattern: Some(pattern),
        }
    }

    /// Replace the comparator. Text filters are left as they are.
    pub fn with_cmp(self, cmp: Cmp) -> Self {
        match self {
            Filter::Level { level, .. } => Filter::Level { cmp, level },
            Filter::Indent { indent, .. } => Filter::Indent { cmp, indent },
            Filter::Timestamp { at, .. } => Filter::Timestamp { cmp, at },
            text @ Filter::Text { .. } => text,
        }
    }

    /// The axis this filter works on.
    pub fn mode(&self) -> FilterMode {
        match self {
            Filter::Level { .. } => FilterMode::Level,
            Filter::Indent { .. } => FilterMode::Indent,
            Filter::Timestamp { .. } => FilterMode::Timestamp,
            Filter::Text { .. } => FilterMode::Text,
        }
    }

    /// `true` if `entry` passes the filter.
    pub fn matches(&self, entry: &LogEntry) -> bool {
        match self {
            Filter::Level { cmp, level } => cmp.holds(&entry.level, level),
            Filter::Indent { cmp, indent } => cmp.holds(&entry.indent, indent),
            Filter::Timestamp { cmp, at } => cmp.holds(&entry.timestamp, at),
            Filter::Text { mode, pattern } => {
                let hit = pattern.as_ref().is_none_or(|p| p.is_match(&entry.text));
                match mode {
                    TextMatch::Matches => hit,
                    TextMatch::DoesNotMatch => !hit,
                }
            }
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Level { cmp, level } => f
                .debug_struct("Level")
                .field("cmp", cmp)
                .field("level", level)
                .finish(),
            Filter::Indent { cmp, indent } => f
                .debug_struct("Indent")
                .field("cmp", cmp)
                .field("indent", indent)
                .finish(),
            Filter::Timestamp { cmp, at } => f
                .debug_struct("Timestamp")
                .field("cmp", cmp)
                .field("at", at)
                .finish(),
            Filter::Text { mode, pattern } => f
                .debug_struct("Text")
                .field("mode", mode)
                .field("pattern", &pattern.as_ref().map(Regex::as_str))
                .finish(),
        }
    }
}
