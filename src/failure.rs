//! Failure values carried by a [`Ctx`](crate::Ctx)
//!
//! Two kinds of errors exist in tidemark:
//!
//! - **Data-flow failures** live in a container's failure slot as a
//!   [`Failure`]. They are values: `and_then`, `map` and `flatten` skip their
//!   continuation when one is present, and logs recorded before the failure are
//!   never discarded.
//! - **Programming errors** are either panics raised inside a wrapped function
//!   (turned into a [`Failure`] by [`catch_error`](crate::decorate::StepExt::catch_error))
//!   or contract violations such as flattening a non-nested result, which
//!   surface as [`UsageError`] and are never folded into the failure slot.
//!
//! # Examples
//!
//! ```
//! use tidemark::failure::{Failure, Fault};
//!
//! let failure = Failure::new(Fault::new("connection refused").with_cause(Fault::new("timeout")))
//!     .with_context("connecting to database");
//!
//! assert!(failure.is_failure());
//! assert_eq!(failure.cause().map(|f| f.message()), Some("connection refused"));
//!
//! // A context string without a cause is only a note
//! let note = Failure::note("cache was cold");
//! assert!(!note.is_failure());
//! ```

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;

/// An opaque description of something that went wrong.
///
/// A `Fault` carries a human-readable message and, optionally, the fault that
/// caused it. It can be built from any [`std::error::Error`] (the `source`
/// chain is preserved) or from a panic payload.
///
/// # Examples
///
/// ```
/// use tidemark::failure::Fault;
///
/// let io = std::io::Error::new(std::io::ErrorKind::NotFound, "config.toml missing");
/// let fault = Fault::from_error(&io);
/// assert_eq!(fault.message(), "config.toml missing");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fault {
    message: String,
    cause: Option<Box<Fault>>,
}

impl Fault {
    /// Create a fault with no cause.
    pub fn new(message: impl Into<String>) -> Self {
        Fault {
            message: message.into(),
            cause: None,
        }
    }

    /// Attach the fault that caused this one.
    ///
    /// Replaces any cause set earlier.
    pub fn with_cause(mut self, cause: Fault) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Build a fault from an error, following its `source` chain.
    pub fn from_error<E>(err: &E) -> Self
    where
        E: StdError + ?Sized,
    {
        let mut messages = vec![err.to_string()];
        let mut next = err.source();
        while let Some(source) = next {
            messages.push(source.to_string());
            next = source.source();
        }

        // Build innermost first so each outer fault owns its cause
        let mut fault: Option<Fault> = None;
        for message in messages.into_iter().rev() {
            let mut outer = Fault::new(message);
            outer.cause = fault.map(Box::new);
            fault = Some(outer);
        }
        fault.unwrap_or_else(|| Fault::new(String::new()))
    }

    /// Build a fault from a panic payload as returned by `catch_unwind`.
    ///
    /// `&str` and `String` payloads (everything `panic!` produces) become the
    /// message; other payload types get a generic message.
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        if let Some(msg) = payload.downcast_ref::<&str>() {
            Fault::new(*msg)
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            Fault::new(msg.clone())
        } else {
            Fault::new("panic with a non-string payload")
        }
    }

    /// The human-readable message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The fault that caused this one, if any.
    pub fn cause(&self) -> Option<&Fault> {
        self.cause.as_deref()
    }

    /// Iterate over this fault and every cause below it, outermost first.
    ///
    /// ```
    /// use tidemark::failure::Fault;
    ///
    /// let fault = Fault::new("a").with_cause(Fault::new("b").with_cause(Fault::new("c")));
    /// let messages: Vec<_> = fault.chain().map(|f| f.message()).collect();
    /// assert_eq!(messages, vec!["a", "b", "c"]);
    /// ```
    pub fn chain(&self) -> impl Iterator<Item = &Fault> {
        std::iter::successors(Some(self), |f| f.cause.as_deref())
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl StdError for Fault {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_deref().map(|c| c as &(dyn StdError + 'static))
    }
}

impl From<&str> for Fault {
    fn from(message: &str) -> Self {
        Fault::new(message)
    }
}

impl From<String> for Fault {
    fn from(message: String) -> Self {
        Fault::new(message)
    }
}

/// The failure slot of a container: an optional cause and an optional context.
///
/// Only the cause decides whether something failed. A `Failure` with a context
/// string but no cause is a diagnostic note and does not short-circuit anything.
///
/// # Examples
///
/// ```
/// use tidemark::failure::{Failure, Fault};
///
/// let failure = Failure::new(Fault::new("file not found")).with_context("reading config");
/// assert_eq!(
///     failure.to_string(),
///     "Error: file not found\n  -> reading config"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Failure {
    cause: Option<Fault>,
    context: Option<String>,
}

impl Failure {
    /// A failure with the given cause and no context.
    pub fn new(cause: impl Into<Fault>) -> Self {
        Failure {
            cause: Some(cause.into()),
            context: None,
        }
    }

    /// The empty slot: no cause, no context.
    pub fn none() -> Self {
        Failure::default()
    }

    /// A context-only diagnostic note. Not a failure.
    pub fn note(context: impl Into<String>) -> Self {
        Failure {
            cause: None,
            context: Some(context.into()),
        }
    }

    /// Set the context string, replacing any earlier one.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// `true` when a cause is present.
    ///
    /// The context slot is deliberately ignored.
    pub fn is_failure(&self) -> bool {
        self.cause.is_some()
    }

    /// `true` when both slots are empty.
    pub fn is_empty(&self) -> bool {
        self.cause.is_none() && self.context.is_none()
    }

    /// The cause, if any.
    pub fn cause(&self) -> Option<&Fault> {
        self.cause.as_ref()
    }

    /// The context string, if any.
    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Split into `(cause, context)`.
    pub fn into_parts(self) -> (Option<Fault>, Option<String>) {
        (self.cause, self.context)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => {
                write!(f, "Error: {}", cause)?;
                for inner in cause.chain().skip(1) {
                    write!(f, "\n  caused by: {}", inner)?;
                }
                if let Some(ctx) = &self.context {
                    write!(f, "\n  -> {}", ctx)?;
                }
                Ok(())
            }
            None => match &self.context {
                Some(ctx) => write!(f, "note: {}", ctx),
                None => f.write_str("no error"),
            },
        }
    }
}

impl StdError for Failure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause.as_ref().map(|c| c as &(dyn StdError + 'static))
    }
}

impl From<Fault> for Failure {
    fn from(cause: Fault) -> Self {
        Failure::new(cause)
    }
}

/// A caller broke a structural contract of the container API.
///
/// These are programming errors: they are returned to the caller instead of
/// being stored in a failure slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// `try_flatten` was called on a container whose result is not a nested
    /// container of the requested type.
    NotNested {
        /// Type name of the nested container that was expected.
        expected: &'static str,
    },
}

impl fmt::Display for UsageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UsageError::NotNested { expected } => {
                write!(f, "cannot flatten: result is not a nested {}", expected)
            }
        }
    }
}

impl StdError for UsageError {}

/// A configuration value could not be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The requested stdout capture mode does not exist.
    UnsupportedCaptureMode(String),
    /// The requested module-exclusion mode does not exist.
    UnknownExclusionMode(String),
    /// The requested log level does not exist.
    UnknownLevel(String),
    /// The requested filter mode does not exist.
    UnknownFilterMode(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnsupportedCaptureMode(mode) => write!(
                f,
                "unsupported capture mode '{}' (expected 'basic' or 'depth')",
                mode
            ),
            ConfigError::UnknownExclusionMode(mode) => write!(
                f,
                "unknown exclusion mode '{}' (expected 'append' or 'replace')",
                mode
            ),
            ConfigError::UnknownLevel(level) => write!(f, "unknown log level '{}'", level),
            ConfigError::UnknownFilterMode(mode) => write!(
                f,
                "unknown filter mode '{}' (expected 'level', 'indent', 'timestamp' or 'text')",
                mode
            ),
        }
    }
}

impl StdError for ConfigError {}
