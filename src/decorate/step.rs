//! The call seam every decorator wraps.

use crate::ctx::Ctx;
use crate::entry::LogEntry;
use crate::sink::LogSink;

/// One invocation: typed arguments plus the trace threaded between steps.
///
/// `Call` is itself a [`LogSink`], so a wrapped function can log against the
/// incoming trace and then hand it back with [`Call::ok`] or [`Call::fail`].
///
/// ```
/// use tidemark::prelude::*;
///
/// let call = Call::new(3).info("received");
/// let ctx = call.ok(9);
/// assert_eq!(ctx.result(), Some(&9));
/// assert_eq!(ctx.logs().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call<A> {
    /// The wrapped function's arguments.
    pub args: A,
    /// The trace accumulated by the caller and upstream decorators.
    pub logs: Vec<LogEntry>,
}

impl<A> Call<A> {
    /// A call with an empty trace.
    pub fn new(args: A) -> Self {
        Call {
            args,
            logs: Vec::new(),
        }
    }

    /// A call continuing an existing trace.
    pub fn with_logs(args: A, logs: Vec<LogEntry>) -> Self {
        Call { args, logs }
    }

    /// A call continuing the trace of `ctx`.
    ///
    /// This is how a decorated function hands its trace to another decorated
    /// function it calls.
    pub fn continuing<T>(args: A, ctx: &Ctx<T>) -> Self {
        Call::with_logs(args, ctx.logs().to_vec())
    }

    /// Succeed with `value`, keeping this call's trace.
    pub fn ok<T>(self, value: T) -> Ctx<T> {
        Ctx::new(value).with_logs(self.logs)
    }

    /// Fail with `cause`, keeping this call's trace.
    pub fn fail<T>(self, cause: impl Into<crate::failure::Fault>) -> Ctx<T> {
        Ctx::failed(cause).with_logs(self.logs)
    }

    /// The arguments as a successful container carrying this call's trace.
    pub fn into_ctx(self) -> Ctx<A> {
        Ctx::new(self.args).with_logs(self.logs)
    }
}

impl<A> LogSink for Call<A> {
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

/// A function from a [`Call`] to a container.
///
/// Decorators are `Step`s that wrap another `Step`.
pub trait Step<A> {
    /// The value type of the produced container.
    type Output;

    /// Run the step.
    fn call(&self, call: Call<A>) -> Ctx<Self::Output>;

    /// Run the step with an empty trace.
    fn run(&self, args: A) -> Ctx<Self::Output> {
        self.call(Call::new(args))
    }
}

/// A closure lifted into a [`Step`].
///
/// Created by [`from_fn`].
#[derive(Debug, Clone, Copy)]
pub struct FromFn<F> {
    pub(crate) f: F,
}

/// Lift a closure taking a [`Call`] into a [`Step`].
///
/// ```
/// use tidemark::prelude::*;
///
/// let double = from_fn(|call: Call<i32>| {
///     let n = call.args;
///     call.ok(n * 2)
/// });
/// assert_eq!(double.run(21).result(), Some(&42));
/// ```
pub fn from_fn<A, T, F>(f: F) -> FromFn<F>
where
    F: Fn(Call<A>) -> Ctx<T>,
{
    FromFn { f }
}

impl<A, T, F> Step<A> for FromFn<F>
where
    F: Fn(Call<A>) -> Ctx<T>,
{
    type Output = T;

    fn call(&self, call: Call<A>) -> Ctx<T> {
        (self.f)(call)
    }
}

impl<A, S> Step<A> for &S
where
    S: Step<A> + ?Sized,
{
    type Output = S::Output;

    fn call(&self, call: Call<A>) -> Ctx<S::Output> {
        (**self).call(call)
    }
}

/// The last path segment of a callable's type name, closures skipped.
///
/// ```
/// use tidemark::decorate::name_of;
///
/// fn load_user(_: tidemark::decorate::Call<u32>) -> tidemark::Ctx<()> {
///     tidemark::Ctx::empty()
/// }
/// assert_eq!(name_of(&load_user), "load_user");
/// ```
pub fn name_of<F: ?Sized>(_: &F) -> &'static str {
    let mut path = std::any::type_name::<F>();
    while let Some(head) = path.strip_suffix("::{{closure}}") {
        path = head;
    }
    let path = path.split('<').next().unwrap_or(path);
    path.rsplit("::").next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::LogSinkExt;

    #[test]
    fn test_call_threads_logs_into_ctx() {
        let ctx: Ctx<i32> = Call::new(()).info("one").ok(1);
        assert_eq!(ctx.logs().len(), 1);

        let failed: Ctx<i32> = Call::new(()).info("one").fail("nope");
        assert!(failed.is_failed());
        assert_eq!(failed.logs().len(), 1);
    }

    #[test]
    fn test_continuing_copies_trace() {
        let parent = Ctx::new(()).info("parent");
        let call = Call::continuing(5, &parent);
        assert_eq!(call.logs, parent.logs());
        assert_eq!(call.into_ctx().result(), Some(&5));
    }

    #[test]
    fn test_step_by_reference() {
        let step = from_fn(|call: Call<i32>| {
            let n = call.args;
            call.ok(n + 1)
        });
        let by_ref = &step;
        assert_eq!(by_ref.run(1).result(), Some(&2));
    }

    #[test]
    fn test_name_of_closure_uses_enclosing_fn() {
        let f = |call: Call<()>| call.ok(());
        assert_eq!(name_of(&f), "test_name_of_closure_uses_enclosing_fn");
    }
}
