//! Turning panics into failed containers.

use std::backtrace::Backtrace;
use std::cell::{Cell, RefCell};
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

use crate::ctx::Ctx;
use crate::decorate::step::{Call, Step};
use crate::failure::Fault;

thread_local! {
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
    static REPORTS: RefCell<Vec<PanicReport>> = const { RefCell::new(Vec::new()) };
}

static HOOK: Once = Once::new();

/// What the hook saw of one panic on a guarded thread.
#[derive(Debug)]
struct PanicReport {
    message: String,
    location: String,
    backtrace: String,
}

impl PanicReport {
    fn context(&self) -> String {
        format!("panicked at {}\n{}", self.location, self.backtrace)
    }

    /// Print the report the way the default hook would have.
    fn emit(&self) {
        let thread = std::thread::current();
        eprintln!(
            "thread '{}' panicked at {}:\n{}",
            thread.name().unwrap_or("<unnamed>"),
            self.location,
            self.message
        );
    }
}

/// Install the process panic hook once.
///
/// Panics on threads inside a [`CatchError`] are recorded for the failure's
/// context and not printed. Every other panic goes to the previous hook.
fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let guarded = GUARD_DEPTH.try_with(Cell::get).unwrap_or(0) > 0;
            if !guarded {
                previous(info);
                return;
            }
            let report = PanicReport {
                message: Fault::from_panic(info.payload()).message().to_string(),
                location: info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
                    .unwrap_or_else(|| "<unknown location>".to_string()),
                backtrace: Backtrace::force_capture().to_string(),
            };
            let _ = REPORTS.try_with(|reports| reports.borrow_mut().push(report));
        }));
    });
}

/// Marks this thread as inside a catch for as long as it lives.
///
/// Each guard collects the reports of panics raised while it is the
/// innermost one. Reports of an enclosing guard are parked and put back when
/// this guard is left.
struct Guarded {
    parked: Option<Vec<PanicReport>>,
}

impl Guarded {
    fn enter() -> Self {
        GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
        let parked = REPORTS.with(|reports| mem::take(&mut *reports.borrow_mut()));
        Guarded {
            parked: Some(parked),
        }
    }

    /// Stop guarding and hand back the reports collected by this guard.
    fn leave(mut self) -> Vec<PanicReport> {
        let parked = self.parked.take().unwrap_or_default();
        REPORTS.with(|reports| mem::replace(&mut *reports.borrow_mut(), parked))
    }
}

impl Drop for Guarded {
    fn drop(&mut self) {
        GUARD_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
        if let Some(parked) = self.parked.take() {
            REPORTS.with(|reports| *reports.borrow_mut() = parked);
        }
    }
}

/// Take the report of the panic that escaped, if the hook saw it.
///
/// Only the last report can belong to the escaping panic, and only when the
/// messages agree; a `resume_unwind` never reaches the hook. Every other
/// report is of a panic the wrapped code caught itself and gets printed.
fn escaped_report(mut reports: Vec<PanicReport>, fault: &Fault) -> Option<PanicReport> {
    let own = reports
        .last()
        .is_some_and(|report| report.message == fault.message());
    let report = if own { reports.pop() } else { None };
    reports.iter().for_each(PanicReport::emit);
    report
}

/// Converts a panic in the inner step into a failed container.
///
/// Created by [`StepExt::catch_error`](crate::decorate::StepExt::catch_error).
/// The failed container keeps the trace the call arrived with; its failure
/// context holds the panic location and a backtrace.
#[derive(Debug, Clone)]
pub struct CatchError<S> {
    pub(crate) inner: S,
}

impl<A, S> Step<A> for CatchError<S>
where
    S: Step<A>,
{
    type Output = S::Output;

    fn call(&self, call: Call<A>) -> Ctx<S::Output> {
        install_hook();
        let arrived = call.logs.clone();

        let guard = Guarded::enter();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.inner.call(call)));
        let reports = guard.leave();

        match outcome {
            Ok(ctx) => {
                reports.iter().for_each(PanicReport::emit);
                ctx
            }
            Err(payload) => {
                let fault = Fault::from_panic(&*payload);
                let report = escaped_report(reports, &fault)
                    .map_or_else(|| "panicked".to_string(), |r| r.context());

                #[cfg(feature = "tracing")]
                tracing::warn!("Converted panic into a failure: {}", fault);

                Ctx::failed(fault).with_logs(arrived).annotate(report)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::{from_fn, StepExt};
    use crate::entry::LogEntry;
    use crate::sink::LogSinkExt;

    #[test]
    fn test_passes_through_success() {
        let step = from_fn(|call: Call<i32>| {
            let n = call.args;
            call.info("inner").ok(n)
        })
        .catch_error();

        let ctx = step.run(4);
        assert_eq!(ctx.result(), Some(&4));
        assert!(ctx.failure().is_empty());
    }

    #[test]
    fn test_passes_through_data_flow_failure() {
        let step = from_fn(|call: Call<()>| call.fail::<()>("not found")).catch_error();
        let ctx = step.run(());
        assert_eq!(ctx.failure().cause().map(Fault::message), Some("not found"));
        assert_eq!(ctx.failure().context(), None);
    }

    #[test]
    fn test_panic_becomes_failure_with_arrived_logs() {
        let step = from_fn(|call: Call<i32>| -> Ctx<i32> {
            let _dropped = call.info("logged inside, lost with the panic");
            panic!("division by zero");
        })
        .catch_error();

        let arrived = Vec::<LogEntry>::new().info("before the call");
        let ctx = step.call(Call::with_logs(7, arrived.clone()));

        assert!(ctx.is_failed());
        assert_eq!(ctx.result(), None);
        assert_eq!(ctx.logs(), arrived.as_slice());
        assert_eq!(
            ctx.failure().cause().map(Fault::message),
            Some("division by zero")
        );
        let context = ctx.failure().context().unwrap_or_default();
        assert!(context.starts_with("panicked at "), "{}", context);
        assert!(context.contains("catch_error.rs"), "{}", context);
    }

    #[test]
    fn test_formatted_panic_message() {
        let step = from_fn(|call: Call<u8>| -> Ctx<u8> { panic!("bad byte {:#04x}", call.args) })
            .catch_error();
        let ctx = step.run(0x1f);
        assert_eq!(ctx.failure().cause().map(Fault::message), Some("bad byte 0x1f"));
    }

    #[test]
    fn test_nested_catch_only_outer_guard_remaining_after() {
        let inner = from_fn(|_: Call<()>| -> Ctx<()> { panic!("inner") }).catch_error();
        let outer = from_fn(move |call: Call<()>| {
            let failed = inner.call(call);
            assert!(failed.is_failed());
            failed
        })
        .catch_error();

        let ctx = outer.run(());
        assert_eq!(ctx.failure().cause().map(Fault::message), Some("inner"));
        assert_eq!(GUARD_DEPTH.with(Cell::get), 0);
    }

    #[test]
    fn test_handled_panic_does_not_describe_resumed_one() {
        let step = from_fn(|_: Call<()>| -> Ctx<()> {
            let handled = panic::catch_unwind(|| panic!("handled internally"));
            assert!(handled.is_err());
            panic::resume_unwind(Box::new("real failure"))
        })
        .catch_error();

        let ctx = step.run(());
        assert_eq!(ctx.failure().cause().map(Fault::message), Some("real failure"));
        assert_eq!(ctx.failure().context(), Some("panicked"));
        assert!(REPORTS.with(|reports| reports.borrow().is_empty()));
    }

    #[test]
    fn test_escaping_panic_wins_over_handled_one() {
        let step = from_fn(|_: Call<()>| -> Ctx<()> {
            let _ = panic::catch_unwind(|| panic!("handled internally"));
            panic!("escaped")
        })
        .catch_error();

        let ctx = step.run(());
        assert_eq!(ctx.failure().cause().map(Fault::message), Some("escaped"));
        let context = ctx.failure().context().unwrap_or_default();
        assert!(context.starts_with("panicked at "), "{}", context);
        assert!(context.contains("catch_error.rs"), "{}", context);
    }

    #[test]
    fn test_no_report_survives_a_successful_call() {
        let step = from_fn(|call: Call<()>| {
            let _ = panic::catch_unwind(|| panic!("handled internally"));
            call.ok(())
        })
        .catch_error();

        assert!(!step.run(()).is_failed());
        assert!(REPORTS.with(|reports| reports.borrow().is_empty()));

        let resumed = from_fn(|_: Call<()>| -> Ctx<()> {
            panic::resume_unwind(Box::new("later"))
        })
        .catch_error();
        assert_eq!(resumed.run(()).failure().context(), Some("panicked"));
    }

    #[test]
    fn test_escaped_report_matches_message() {
        let report = |message: &str| PanicReport {
            message: message.to_string(),
            location: "src/lib.rs:1:1".to_string(),
            backtrace: String::new(),
        };

        let found = escaped_report(vec![report("a"), report("b")], &Fault::new("b"));
        assert_eq!(found.map(|r| r.message), Some("b".to_string()));

        let stale = escaped_report(vec![report("a")], &Fault::new("b"));
        assert!(stale.is_none());
        assert!(escaped_report(Vec::new(), &Fault::new("b")).is_none());
    }

    #[cfg(feature = "tracing")]
    #[test]
    #[tracing_test::traced_test]
    fn test_panic_conversion_is_traced() {
        let step = from_fn(|_: Call<()>| -> Ctx<()> { panic!("traced boom") }).catch_error();
        let _ = step.run(());
        assert!(logs_contain("Converted panic into a failure"));
    }
}
