//! Testing utilities for code that returns containers
//!
//! - `assert_ok!` / `assert_failed!`: assert on a container's outcome and
//!   show its rendered trace when the assertion fails
//! - `assert_trace!`: compare a trace's indented text
//! - `Arbitrary` for [`Level`](crate::entry::Level) and
//!   [`LogEntry`](crate::entry::LogEntry) behind the `proptest` feature
//!
//! # Examples
//!
//! ```rust
//! use tidemark::prelude::*;
//! use tidemark::{assert_failed, assert_ok, assert_trace};
//!
//! let ok = Ctx::new(42).info("computed");
//! assert_ok!(ok, 42);
//! assert_trace!(ok, ["computed"]);
//!
//! let failed = Ctx::<i32>::failed("disk full");
//! assert_failed!(failed, "disk full");
//! ```

use crate::ctx::Ctx;
use crate::entry::{render, LogEntry};

#[cfg(feature = "proptest")]
use crate::entry::Level;

/// A structural copy of `ctx`'s trace with every timestamp zeroed.
///
/// Entries are otherwise compared field for field, so traces produced at
/// different times only compare equal after this.
pub fn untimed<T>(ctx: &Ctx<T>) -> Vec<LogEntry> {
    ctx.logs()
        .iter()
        .cloned()
        .map(|mut e| {
            e.timestamp = 0;
            e
        })
        .collect()
}

#[doc(hidden)]
pub fn describe<T>(ctx: &Ctx<T>) -> String {
    format!("{}\ntrace:\n{}", ctx.failure(), render(ctx.logs()))
}

/// Assert that a container succeeded, optionally with a given value.
///
/// # Example
///
/// ```rust
/// use tidemark::{assert_ok, Ctx};
///
/// assert_ok!(Ctx::new("ready"));
/// assert_ok!(Ctx::new(2 + 2), 4);
/// ```
#[macro_export]
macro_rules! assert_ok {
    ($ctx:expr) => {
        match &$ctx {
            ctx if ctx.is_failed() => {
                panic!("Expected success, got {}", $crate::testing::describe(ctx));
            }
            _ => {}
        }
    };
    ($ctx:expr, $expected:expr) => {
        match &$ctx {
            ctx if ctx.is_failed() => {
                panic!("Expected success, got {}", $crate::testing::describe(ctx));
            }
            ctx => assert_eq!(ctx.result(), Some(&$expected)),
        }
    };
}

/// Assert that a container failed, optionally with a given message.
///
/// # Example
///
/// ```rust
/// use tidemark::{assert_failed, Ctx};
///
/// assert_failed!(Ctx::<()>::failed("timeout"));
/// assert_failed!(Ctx::<()>::failed("timeout"), "timeout");
/// ```
#[macro_export]
macro_rules! assert_failed {
    ($ctx:expr) => {
        match &$ctx {
            ctx if !ctx.is_failed() => {
                panic!("Expected failure, got success with trace:\n{}", $crate::render(ctx.logs()));
            }
            _ => {}
        }
    };
    ($ctx:expr, $message:expr) => {
        match &$ctx {
            ctx if !ctx.is_failed() => {
                panic!("Expected failure, got success with trace:\n{}", $crate::render(ctx.logs()));
            }
            ctx => assert_eq!(
                ctx.failure().cause().map(|f| f.message()),
                Some($message),
                "Expected failure with message {:?}",
                $message
            ),
        }
    };
}

/// Assert that a container's rendered trace equals the given lines.
///
/// # Example
///
/// ```rust
/// use tidemark::prelude::*;
/// use tidemark::assert_trace;
///
/// let ctx = Ctx::new(()).info("a").info(Record::new("b").indent(2));
/// assert_trace!(ctx, ["a", "  b"]);
/// ```
#[macro_export]
macro_rules! assert_trace {
    ($ctx:expr, [$($line:expr),* $(,)?]) => {
        {
            let expected: ::std::vec::Vec<&str> = ::std::vec![$($line),*];
            assert_eq!($crate::render($ctx.logs()), expected.join("\n"));
        }
    };
}

#[cfg(feature = "proptest")]
use proptest::prelude::*;

#[cfg(feature = "proptest")]
impl Arbitrary for Level {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop::sample::select(Level::ALL.to_vec()).boxed()
    }
}

#[cfg(feature = "proptest")]
impl Arbitrary for LogEntry {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            0usize..32,
            0i64..4_102_444_800_000,
            any::<Level>(),
            "[a-z ]{0,24}",
            prop::option::of(0usize..32),
        )
            .prop_map(|(indent, timestamp, level, text, next_indent)| LogEntry {
                indent,
                timestamp,
                level,
                text,
                next_indent,
            })
            .boxed()
    }
}
