//! # Tidemark
//!
//! > *Every step leaves a mark*
//!
//! A result/context accumulation container for Rust.
//!
//! A [`Ctx<T>`] carries a value (or a failure) together with an indented,
//! append-only trace of [`LogEntry`] values and free-form metadata. Steps are
//! chained with [`Ctx::and_then`]: logs concatenate, the first failure stops
//! the chain, and nothing logged before it is lost.
//!
//! ## Philosophy
//!
//! **Tidemark** keeps the story of a computation next to its outcome:
//! - **Tide** = the value flowing through the chain
//! - **Mark** = the trace each step leaves behind
//!
//! ## Quick Example
//!
//! ```rust
//! use tidemark::prelude::*;
//!
//! fn parse_port(raw: &str) -> Ctx<u16> {
//!     Ctx::from_result(raw.trim().parse::<u16>()).info(format!("parsing {:?}", raw))
//! }
//!
//! fn check_port(port: u16) -> Ctx<u16> {
//!     if port < 1024 {
//!         Ctx::failed(format!("port {} is privileged", port)).warning("rejected")
//!     } else {
//!         Ctx::new(port).info(Record::new("accepted").indent(2))
//!     }
//! }
//!
//! let ok = parse_port("8080").and_then(check_port);
//! assert_eq!(ok.result(), Some(&8080));
//! assert_eq!(render(ok.logs()), "parsing \"8080\"\n  accepted");
//!
//! let bad = parse_port("80").and_then(check_port);
//! assert!(bad.is_failed());
//! assert_eq!(bad.logs().len(), 2);
//! ```
//!
//! ## Decorated calls
//!
//! The [`decorate`](mod@decorate) module wraps functions so that their calls,
//! arguments, printed output and panics all land in the trace, nested by call
//! depth. See [`decorate::decorate`].

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod capture;
pub mod config;
pub mod ctx;
pub mod decorate;
pub mod entry;
pub mod failure;
pub mod filter;
pub mod id;
pub mod redact;
pub mod semigroup;
pub mod sink;
pub mod testing;
pub mod traverse;

// Re-exports
pub use config::{CaptureMode, DecorateConfig, ExclusionMode};
pub use ctx::{Ctx, Metadata};
pub use decorate::{decorate, decorate_fn, Call, Step, StepExt};
pub use entry::{make_entry, render, Level, LogEntry};
pub use failure::{ConfigError, Failure, Fault, UsageError};
pub use filter::{Cmp, Filter, FilterMode, TextMatch};
pub use semigroup::{Monoid, Semigroup};
pub use sink::{LogSink, LogSinkExt, Record};
pub use traverse::{compose, sequence, traverse};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{CaptureMode, DecorateConfig, ExclusionMode};
    pub use crate::ctx::{Ctx, Metadata};
    pub use crate::decorate::{decorate, decorate_fn, from_fn, Call, Step, StepExt};
    pub use crate::entry::{render, Level, LogEntry};
    pub use crate::failure::{Failure, Fault};
    pub use crate::filter::{Cmp, Filter};
    pub use crate::semigroup::{Monoid, Semigroup};
    pub use crate::sink::{LogSink, LogSinkExt, Record};
    pub use crate::traverse::{compose, sequence, traverse};
}
