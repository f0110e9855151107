//! Log sinks and the indentation-inheritance rule
//!
//! A *sink* is anything that can report its current log sequence and hand back
//! an updated copy of itself. Two sinks exist: a bare `Vec<LogEntry>` and a
//! [`Ctx`](crate::Ctx), whose `logs` field is the sequence. Every logging
//! operation in this module is written once, against [`LogSink`], and works
//! for both.
//!
//! # Indentation inheritance
//!
//! When an entry is appended without an explicit indent it inherits one:
//!
//! 1. if the last entry carries a `next_indent` override, that value
//! 2. otherwise the last entry's own `indent`
//! 3. `0` on an empty sink
//!
//! This is what lets independently written functions nest into one trace
//! without passing depth around: a caller bumps the indent once and everything
//! logged underneath follows.
//!
//! # Examples
//!
//! ```
//! use tidemark::sink::{LogSinkExt, Record};
//! use tidemark::entry::LogEntry;
//!
//! let logs = Vec::<LogEntry>::new()
//!     .info("starting")
//!     .info(Record::new("nested").indent(4))
//!     .info("still nested")
//!     .warning(Record::new("back out").next_indent(0))
//!     .info("top level");
//!
//! let indents: Vec<usize> = logs.iter().map(|e| e.indent).collect();
//! assert_eq!(indents, vec![0, 4, 4, 4, 0]);
//! ```

use crate::entry::{Level, LogEntry};
use crate::filter::Filter;
use crate::redact;

/// Something that holds a log sequence.
///
/// Implementors only provide read access and an update-in-copy operation; all
/// logging behaviour lives in [`LogSinkExt`].
pub trait LogSink: Sized {
    /// The current log sequence.
    fn logs(&self) -> &[LogEntry];

    /// Return this sink with its log sequence transformed by `f`.
    fn update_logs<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut Vec<LogEntry>);
}

impl LogSink for Vec<LogEntry> {
    fn logs(&self) -> &[LogEntry] {
        self
    }

    fn update_logs<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut Vec<LogEntry>),
    {
        f(&mut self);
        self
    }
}

/// The optional arguments of an append.
///
/// Converts from `&str` and `String`, so plain messages can be passed wherever
/// a `Record` is expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    text: String,
    level: Level,
    indent: Option<usize>,
    next_indent: Option<usize>,
    redact: bool,
}

impl Record {
    /// A record at [`Level::Info`] with an inherited indent.
    pub fn new(text: impl Into<String>) -> Self {
        Record {
            text: text.into(),
            level: Level::Info,
            indent: None,
            next_indent: None,
            redact: false,
        }
    }

    /// Set the level.
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Use an explicit indent instead of the inherited one.
    pub fn indent(mut self, indent: usize) -> Self {
        self.indent = Some(indent);
        self
    }

    /// Set the indent later entries inherit.
    pub fn next_indent(mut self, next_indent: usize) -> Self {
        self.next_indent = Some(next_indent);
        self
    }

    /// Replace the text with [`redact::REDACTED`] if it looks sensitive.
    pub fn redact(self) -> Self {
        self.redact_if(true)
    }

    /// Conditional form of [`Record::redact`].
    pub fn redact_if(mut self, redact: bool) -> Self {
        self.redact = redact;
        self
    }

    /// Resolve this record into an entry, given the indent it would inherit.
    pub fn into_entry(self, inherited: usize) -> LogEntry {
        let text = if self.redact {
            redact::redact(self.text)
        } else {
            self.text
        };
        let mut entry = LogEntry::new(text, self.level, self.indent.unwrap_or(inherited));
        entry.next_indent = self.next_indent;
        entry
    }
}

impl From<&str> for Record {
    fn from(text: &str) -> Self {
        Record::new(text)
    }
}

impl From<String> for Record {
    fn from(text: String) -> Self {
        Record::new(text)
    }
}

impl From<&String> for Record {
    fn from(text: &String) -> Self {
        Record::new(text.as_str())
    }
}

/// The indent an entry appended to `logs` inherits.
///
/// ```
/// use tidemark::entry::{Level, LogEntry};
/// use tidemark::sink::inherited_indent;
///
/// assert_eq!(inherited_indent(&[]), 0);
///
/// let logs = vec![LogEntry::at(0, "exit", Level::Info, 8).with_next_indent(4)];
/// assert_eq!(inherited_indent(&logs), 4);
/// ```
pub fn inherited_indent(logs: &[LogEntry]) -> usize {
    logs.last().map(LogEntry::inherited_indent).unwrap_or(0)
}

/// Logging operations available on every [`LogSink`].
///
/// This trait is implemented automatically; you don't implement it yourself.
pub trait LogSinkExt: LogSink {
    /// Append one entry.
    ///
    /// The record's explicit indent wins; otherwise the indent is inherited
    /// from the last entry.
    fn append(self, record: impl Into<Record>) -> Self {
        let record = record.into();
        self.update_logs(|logs| {
            let entry = record.into_entry(inherited_indent(logs));
            logs.push(entry);
        })
    }

    /// Append at [`Level::Debug`].
    fn debug(self, record: impl Into<Record>) -> Self {
        self.append(record.into().level(Level::Debug))
    }

    /// Append at [`Level::Info`].
    fn info(self, record: impl Into<Record>) -> Self {
        self.append(record.into().level(Level::Info))
    }

    /// Append at [`Level::Warning`].
    fn warning(self, record: impl Into<Record>) -> Self {
        self.append(record.into().level(Level::Warning))
    }

    /// Append at [`Level::Error`].
    fn error(self, record: impl Into<Record>) -> Self {
        self.append(record.into().level(Level::Error))
    }

    /// Append at [`Level::Critical`].
    fn critical(self, record: impl Into<Record>) -> Self {
        self.append(record.into().level(Level::Critical))
    }

    /// The indent the next appended entry would inherit.
    fn inherited_indent(&self) -> usize {
        inherited_indent(self.logs())
    }

    /// Keep only the entries matching `filter`.
    fn filter(self, filter: &Filter) -> Self {
        self.update_logs(|logs| logs.retain(|e| filter.matches(e)))
    }
}

impl<S: LogSink> LogSinkExt for S {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redact::REDACTED;

    fn indents(logs: &[LogEntry]) -> Vec<usize> {
        logs.iter().map(|e| e.indent).collect()
    }

    #[test]
    fn test_empty_sink_inherits_zero() {
        let logs = Vec::<LogEntry>::new().info("first");
        assert_eq!(indents(&logs), vec![0]);
    }

    #[test]
    fn test_inherits_previous_indent() {
        let logs = Vec::<LogEntry>::new()
            .info(Record::new("deep").indent(6))
            .info("sibling");
        assert_eq!(indents(&logs), vec![6, 6]);
    }

    #[test]
    fn test_next_indent_override_wins() {
        let logs = Vec::<LogEntry>::new()
            .info(Record::new("exit").indent(8).next_indent(2))
            .info("after");
        assert_eq!(indents(&logs), vec![8, 2]);
        assert_eq!(logs[0].next_indent, Some(2));
        assert_eq!(logs[1].next_indent, None);
    }

    #[test]
    fn test_explicit_indent_ignores_override() {
        let logs = Vec::<LogEntry>::new()
            .info(Record::new("exit").indent(8).next_indent(2))
            .info(Record::new("explicit").indent(12));
        assert_eq!(indents(&logs), vec![8, 12]);
    }

    #[test]
    fn test_level_wrappers_fix_level() {
        let logs = Vec::<LogEntry>::new()
            .debug("d")
            .info("i")
            .warning(Record::new("w").level(Level::Critical))
            .error("e")
            .critical("c");
        let levels: Vec<Level> = logs.iter().map(|e| e.level).collect();
        assert_eq!(
            levels,
            vec![
                Level::Debug,
                Level::Info,
                Level::Warning,
                Level::Error,
                Level::Critical
            ]
        );
    }

    #[test]
    fn test_redaction_requested() {
        let logs = Vec::<LogEntry>::new().info(Record::new("password=secret123").redact());
        assert_eq!(logs[0].text, REDACTED);
    }

    #[test]
    fn test_redaction_not_requested_keeps_text() {
        let logs = Vec::<LogEntry>::new().info(Record::new("password=secret123").redact_if(false));
        assert_eq!(logs[0].text, "password=secret123");
    }

    #[test]
    fn test_append_accepts_owned_and_borrowed_strings() {
        let owned = String::from("owned");
        let logs = Vec::<LogEntry>::new().append(&owned).append(owned.clone()).append("borrowed");
        assert_eq!(logs.len(), 3);
        assert_eq!(logs[0].level, Level::Info);
    }

    #[test]
    fn test_inherited_indent_method() {
        let logs = Vec::<LogEntry>::new().info(Record::new("x").indent(3).next_indent(1));
        assert_eq!(logs.inherited_indent(), 1);
    }
}
