//! Decorators that trace calls into a container's log
//!
//! A decorated function is a [`Step`]: it takes a [`Call`] (its arguments
//! plus the trace accumulated so far) and returns a [`Ctx`]. Decorators wrap
//! a step in another step:
//!
//! - [`catch_error`](StepExt::catch_error): panics become failed containers
//! - [`log_args`](StepExt::log_args): log the arguments
//! - [`log_function`](StepExt::log_function): `--> name` / `<-- name` brackets
//! - [`redirect_stdout`](StepExt::redirect_stdout): fold captured output into the trace
//!
//! [`decorate`] applies all four in the order that keeps indentation nesting
//! across independently decorated functions: brackets outermost, then
//! arguments, then output capture, then the panic guard around the function.
//!
//! # Examples
//!
//! ```
//! use tidemark::prelude::*;
//!
//! let config = DecorateConfig::default().with_capture(CaptureMode::Basic);
//! let greet = decorate("greet", |call: Call<&str>| {
//!     tidemark::cprintln!("hello, {}", call.args);
//!     call.ok(())
//! }, config);
//!
//! let ctx = greet.run("ann");
//! assert_eq!(
//!     render(ctx.logs()),
//!     "    --> greet\n    \"ann\"\n    hello, ann\n    <-- greet"
//! );
//! ```

mod catch_error;
mod log_args;
mod log_function;
mod redirect_stdout;
mod step;

pub use catch_error::CatchError;
pub use log_args::LogArgs;
pub use log_function::LogFunction;
pub use redirect_stdout::RedirectStdout;
pub use step::{from_fn, name_of, Call, FromFn, Step};

use std::borrow::Cow;
use std::fmt::Debug;

use crate::config::DecorateConfig;
use crate::ctx::Ctx;

/// Decorator methods available on every [`Step`].
///
/// This trait is implemented automatically; you don't implement it yourself.
pub trait StepExt<A>: Step<A> + Sized {
    /// Convert panics into failed containers.
    fn catch_error(self) -> CatchError<Self> {
        CatchError { inner: self }
    }

    /// Log the arguments before the call.
    fn log_args(self, config: DecorateConfig) -> LogArgs<Self>
    where
        A: Debug,
    {
        LogArgs {
            inner: self,
            config,
        }
    }

    /// Bracket the call with entry and exit lines naming it.
    fn log_function(
        self,
        name: impl Into<Cow<'static, str>>,
        config: DecorateConfig,
    ) -> LogFunction<Self> {
        LogFunction {
            inner: self,
            name: name.into(),
            config,
        }
    }

    /// Capture the thread's output stream into the trace.
    fn redirect_stdout(self, config: DecorateConfig) -> RedirectStdout<Self> {
        RedirectStdout {
            inner: self,
            config,
        }
    }
}

impl<A, S: Step<A>> StepExt<A> for S {}

/// The full decorator stack around `f`.
pub type Decorated<F> = LogFunction<LogArgs<RedirectStdout<CatchError<FromFn<F>>>>>;

/// Apply every decorator to `f` in the standard order.
///
/// Equivalent to
///
/// ```text
/// from_fn(f)
///     .catch_error()
///     .redirect_stdout(config)
///     .log_args(config)
///     .log_function(name, config)
/// ```
pub fn decorate<A, T, F>(
    name: impl Into<Cow<'static, str>>,
    f: F,
    config: DecorateConfig,
) -> Decorated<F>
where
    A: Debug,
    F: Fn(Call<A>) -> Ctx<T>,
{
    from_fn(f)
        .catch_error()
        .redirect_stdout(config.clone())
        .log_args(config.clone())
        .log_function(name, config)
}

/// [`decorate`] named after the function itself.
///
/// ```
/// use tidemark::prelude::*;
///
/// fn load_user(call: Call<u32>) -> Ctx<String> {
///     let id = call.args;
///     call.ok(format!("user-{}", id))
/// }
///
/// let ctx = decorate_fn(load_user, DecorateConfig::default()).run(7);
/// assert_eq!(ctx.logs()[0].text, "--> load_user");
/// ```
pub fn decorate_fn<A, T, F>(f: F, config: DecorateConfig) -> Decorated<F>
where
    A: Debug,
    F: Fn(Call<A>) -> Ctx<T>,
{
    let name = name_of(&f);
    decorate(name, f, config)
}
