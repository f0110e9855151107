//! The result/context container
//!
//! A [`Ctx<T>`] bundles everything one step of a computation produces:
//!
//! - an identifier and a human name
//! - open key/value metadata
//! - the computed value, unless the step failed
//! - an append-only trace of [`LogEntry`] values
//! - a [`Failure`] slot
//!
//! Every combinator returns a new container. Once the failure slot holds a
//! cause, `and_then`, `map` and `flatten` stop calling continuations but keep
//! every log entry recorded so far.
//!
//! # Examples
//!
//! ```
//! use tidemark::prelude::*;
//!
//! fn parse(input: &str) -> Ctx<i32> {
//!     match input.parse::<i32>() {
//!         Ok(n) => Ctx::new(n).info(format!("parsed {}", n)),
//!         Err(e) => Ctx::failed(Fault::from_error(&e)).error(format!("bad input {:?}", input)),
//!     }
//! }
//!
//! fn halve(n: i32) -> Ctx<i32> {
//!     Ctx::new(n / 2).info("halved")
//! }
//!
//! let ok = parse("42").and_then(halve);
//! assert_eq!(ok.result(), Some(&21));
//! assert_eq!(ok.logs().len(), 2);
//!
//! let bad = parse("forty-two").and_then(halve);
//! assert!(bad.is_failed());
//! assert_eq!(bad.logs().len(), 1);
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::error::Error as StdError;

use crate::entry::LogEntry;
use crate::failure::{Failure, Fault, UsageError};
use crate::id::{default_name, fresh_id};
use crate::semigroup::Semigroup;
use crate::sink::LogSink;

/// Caller metadata carried by a container. Opaque to the core.
pub type Metadata = BTreeMap<String, String>;

/// A computed value (or failure) with its trace and metadata.
///
/// Equality compares result, failure, logs and metadata. Identifiers and
/// names are excluded because every construction mints a fresh identifier.
#[derive(Debug, Clone)]
pub struct Ctx<T> {
    id: String,
    name: String,
    metadata: Metadata,
    result: Option<T>,
    logs: Vec<LogEntry>,
    failure: Failure,
}

/// Everything except the result, used when re-typing a container.
struct Shell {
    id: String,
    name: String,
    metadata: Metadata,
    logs: Vec<LogEntry>,
    failure: Failure,
}

impl Shell {
    fn into_ctx<U>(self, result: Option<U>) -> Ctx<U> {
        Ctx {
            id: self.id,
            name: self.name,
            metadata: self.metadata,
            result,
            logs: self.logs,
            failure: self.failure,
        }
    }

    /// Identity and metadata from `self`, logs concatenated, outcome from `next`.
    fn join<U>(self, next: Ctx<U>) -> Ctx<U> {
        Ctx {
            id: self.id,
            name: self.name,
            metadata: self.metadata,
            result: next.result,
            logs: self.logs.combine(next.logs),
            failure: next.failure,
        }
    }
}

impl<T> Ctx<T> {
    /// Construct a container holding `value`, with no logs and no metadata.
    ///
    /// ```
    /// use tidemark::Ctx;
    ///
    /// let ctx = Ctx::new(42);
    /// assert_eq!(ctx.result(), Some(&42));
    /// assert!(ctx.logs().is_empty());
    /// assert!(!ctx.is_failed());
    /// ```
    pub fn new(value: T) -> Self {
        let id = fresh_id();
        Ctx {
            name: default_name(&id),
            id,
            metadata: Metadata::new(),
            result: Some(value),
            logs: Vec::new(),
            failure: Failure::none(),
        }
    }

    /// Construct a container that has failed from birth.
    ///
    /// ```
    /// use tidemark::Ctx;
    ///
    /// let ctx = Ctx::<i32>::failed("not found");
    /// assert!(ctx.is_failed());
    /// assert_eq!(ctx.result(), None);
    /// ```
    pub fn failed(cause: impl Into<Fault>) -> Self {
        let id = fresh_id();
        Ctx {
            name: default_name(&id),
            id,
            metadata: Metadata::new(),
            result: None,
            logs: Vec::new(),
            failure: Failure::new(cause),
        }
    }

    /// Lift a `Result` into a container.
    ///
    /// ```
    /// use tidemark::Ctx;
    ///
    /// let ctx = Ctx::from_result("12".parse::<u8>());
    /// assert_eq!(ctx.result(), Some(&12));
    ///
    /// let ctx = Ctx::from_result("1200".parse::<u8>());
    /// assert!(ctx.is_failed());
    /// ```
    pub fn from_result<E>(result: Result<T, E>) -> Self
    where
        E: StdError,
    {
        match result {
            Ok(value) => Ctx::new(value),
            Err(err) => Ctx::failed(Fault::from_error(&err)),
        }
    }

    /// Replace the log sequence.
    pub fn with_logs(mut self, logs: Vec<LogEntry>) -> Self {
        self.logs = logs;
        self
    }

    /// Replace the metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Set one metadata key.
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Replace the human name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Replace the failure slot.
    ///
    /// Installing a failure with a cause makes the container terminal: the
    /// result is discarded. A context-only note leaves the result alone.
    pub fn with_failure(mut self, failure: Failure) -> Self {
        if failure.is_failure() {
            self.result = None;
        }
        self.failure = failure;
        self
    }

    /// Attach a context string to the failure slot, keeping any cause.
    ///
    /// On a successful container this is a diagnostic note and does not
    /// change its outcome.
    ///
    /// ```
    /// use tidemark::Ctx;
    ///
    /// let ctx = Ctx::new(1).annotate("served from cache");
    /// assert!(!ctx.is_failed());
    /// assert_eq!(ctx.failure().context(), Some("served from cache"));
    /// ```
    pub fn annotate(mut self, context: impl Into<String>) -> Self {
        self.failure = self.failure.with_context(context);
        self
    }

    /// The identifier, unique within the process.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The human name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The value, or `None` if the container failed.
    pub fn result(&self) -> Option<&T> {
        if self.is_failed() {
            None
        } else {
            self.result.as_ref()
        }
    }

    /// The trace.
    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    /// The failure slot.
    pub fn failure(&self) -> &Failure {
        &self.failure
    }

    /// `true` when the failure slot holds a cause.
    pub fn is_failed(&self) -> bool {
        self.failure.is_failure()
    }

    /// Extract the value, or the failure.
    pub fn into_result(self) -> Result<T, Failure> {
        self.into_parts().0
    }

    /// Extract the trace, dropping everything else.
    pub fn into_logs(self) -> Vec<LogEntry> {
        self.logs
    }

    /// Extract `(result, logs)`.
    pub fn into_parts(self) -> (Result<T, Failure>, Vec<LogEntry>) {
        let Ctx {
            result,
            logs,
            failure,
            ..
        } = self;
        let outcome = match result {
            Some(value) if !failure.is_failure() => Ok(value),
            _ => Err(failure),
        };
        (outcome, logs)
    }

    fn split(self) -> (Option<T>, Shell) {
        let Ctx {
            id,
            name,
            metadata,
            result,
            logs,
            failure,
        } = self;
        (
            result,
            Shell {
                id,
                name,
                metadata,
                logs,
                failure,
            },
        )
    }

    /// The same container with the result slot emptied and re-typed.
    pub(crate) fn recast<U>(self) -> Ctx<U> {
        let (_, shell) = self.split();
        shell.into_ctx(None)
    }

    /// Sequential composition (monadic bind).
    ///
    /// On a failed container `f` is never called and the container comes back
    /// with its logs, metadata and failure untouched. Otherwise the result has
    /// this container's identity, name and metadata, the logs of both
    /// containers in order, and the value or failure produced by `f`.
    ///
    /// ```
    /// use tidemark::prelude::*;
    ///
    /// let ctx = Ctx::new(2)
    ///     .info("start")
    ///     .with_meta("request", "r-1")
    ///     .and_then(|n| Ctx::new(n * 10).info("scaled"));
    ///
    /// assert_eq!(ctx.result(), Some(&20));
    /// assert_eq!(ctx.metadata().get("request").map(String::as_str), Some("r-1"));
    /// assert_eq!(ctx.logs().len(), 2);
    /// ```
    pub fn and_then<U, F>(self, f: F) -> Ctx<U>
    where
        F: FnOnce(T) -> Ctx<U>,
    {
        if self.is_failed() {
            return self.recast();
        }
        let (result, shell) = self.split();
        match result {
            Some(value) => shell.join(f(value)),
            None => shell.into_ctx(None),
        }
    }

    /// Transform the value, leaving logs, metadata and failure slot alone.
    ///
    /// ```
    /// use tidemark::Ctx;
    ///
    /// assert_eq!(Ctx::new(20).map(|n| n + 1).result(), Some(&21));
    ///
    /// let mut called = false;
    /// let failed = Ctx::<i32>::failed("boom").map(|n| { called = true; n + 1 });
    /// assert!(failed.is_failed());
    /// assert!(!called);
    /// ```
    pub fn map<U, F>(self, f: F) -> Ctx<U>
    where
        F: FnOnce(T) -> U,
    {
        if self.is_failed() {
            return self.recast();
        }
        let (result, shell) = self.split();
        shell.into_ctx(result.map(f))
    }
}

impl Ctx<()> {
    /// A successful container with no meaningful value.
    pub fn empty() -> Self {
        Ctx::new(())
    }
}

impl<T> Ctx<Ctx<T>> {
    /// Collapse a nested container.
    ///
    /// The outer container supplies identity, name and metadata; logs are the
    /// outer logs followed by the inner ones; the value or failure comes from
    /// the inner container. A failed outer container is returned as is.
    ///
    /// ```
    /// use tidemark::prelude::*;
    ///
    /// let inner = Ctx::new(7).info("inner");
    /// let outer = Ctx::new(inner).info("outer").named("outer");
    ///
    /// let flat = outer.flatten();
    /// assert_eq!(flat.name(), "outer");
    /// assert_eq!(flat.result(), Some(&7));
    /// let texts: Vec<_> = flat.logs().iter().map(|e| e.text.as_str()).collect();
    /// assert_eq!(texts, vec!["outer", "inner"]);
    /// ```
    pub fn flatten(self) -> Ctx<T> {
        if self.is_failed() {
            return self.recast();
        }
        let (result, shell) = self.split();
        match result {
            Some(inner) => shell.join(inner),
            None => shell.into_ctx(None),
        }
    }
}

impl Ctx<Box<dyn Any + Send>> {
    /// Collapse a container whose result is a type-erased nested `Ctx<T>`.
    ///
    /// Returns [`UsageError::NotNested`] when the result is not a `Ctx<T>`.
    /// That is a caller bug, so it is returned rather than stored in the
    /// failure slot. A failed outer container is returned as is, without
    /// inspecting the result.
    ///
    /// ```
    /// use std::any::Any;
    /// use tidemark::Ctx;
    ///
    /// let nested: Box<dyn Any + Send> = Box::new(Ctx::new(5_u32));
    /// let flat = Ctx::new(nested).try_flatten::<u32>().unwrap();
    /// assert_eq!(flat.result(), Some(&5));
    ///
    /// let not_nested: Box<dyn Any + Send> = Box::new(5_u32);
    /// assert!(Ctx::new(not_nested).try_flatten::<u32>().is_err());
    /// ```
    pub fn try_flatten<T: 'static>(self) -> Result<Ctx<T>, UsageError> {
        if self.is_failed() {
            return Ok(self.recast());
        }
        let (result, shell) = self.split();
        let inner = result
            .and_then(|boxed| boxed.downcast::<Ctx<T>>().ok())
            .ok_or(UsageError::NotNested {
                expected: std::any::type_name::<Ctx<T>>(),
            })?;
        Ok(shell.join(*inner))
    }
}

impl<T: PartialEq> PartialEq for Ctx<T> {
    fn eq(&self, other: &Self) -> bool {
        self.result() == other.result()
            && self.failure == other.failure
            && self.logs == other.logs
            && self.metadata == other.metadata
    }
}

impl<T: Eq> Eq for Ctx<T> {}

impl<T> LogSink for Ctx<T> {
    fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    fn update_logs<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut Vec<LogEntry>),
    {
        f(&mut self.logs);
        self
    }
}
