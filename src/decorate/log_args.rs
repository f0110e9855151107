//! Logging a call's arguments.

use std::fmt::Debug;

use crate::config::DecorateConfig;
use crate::ctx::Ctx;
use crate::decorate::step::{Call, Step};
use crate::sink::{inherited_indent, LogSinkExt, Record};

/// Logs the call's arguments before running the inner step.
///
/// Created by [`StepExt::log_args`](crate::decorate::StepExt::log_args).
///
/// The arguments are rendered with `Debug` at the inherited indent, and that
/// same indent is set as the entry's `next_indent`, so the inner step's own
/// entries are siblings of the argument line rather than children of it.
#[derive(Debug, Clone)]
pub struct LogArgs<S> {
    pub(crate) inner: S,
    pub(crate) config: DecorateConfig,
}

impl<A, S> Step<A> for LogArgs<S>
where
    A: Debug,
    S: Step<A>,
{
    type Output = S::Output;

    fn call(&self, call: Call<A>) -> Ctx<S::Output> {
        let indent = inherited_indent(&call.logs);
        let record = Record::new(format!("{:?}", call.args))
            .level(self.config.level())
            .indent(indent)
            .next_indent(indent)
            .redact_if(self.config.redact());
        let call = call.append(record);
        let produced = call.logs.clone();

        let response = self.inner.call(call);
        // A step that returns no trace at all dropped the one it was given
        if response.logs().is_empty() {
            response.with_logs(produced)
        } else {
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorate::{from_fn, StepExt};
    use crate::entry::LogEntry;
    use crate::redact::REDACTED;

    fn config() -> DecorateConfig {
        DecorateConfig::default()
    }

    #[test]
    fn test_args_logged_at_inherited_indent() {
        let step = from_fn(|call: Call<(i32, &str)>| call.info("body").ok(())).log_args(config());

        let arrived = Vec::<LogEntry>::new().info(Record::new("caller").indent(8));
        let ctx = step.call(Call::with_logs((1, "two"), arrived));

        let logs = ctx.logs();
        assert_eq!(logs[1].text, r#"(1, "two")"#);
        assert_eq!(logs[1].indent, 8);
        assert_eq!(logs[1].next_indent, Some(8));
        assert_eq!(logs[2].text, "body");
        assert_eq!(logs[2].indent, 8);
    }

    #[test]
    fn test_args_use_configured_level() {
        let step = from_fn(|call: Call<u8>| call.ok(()))
            .log_args(config().with_level(crate::entry::Level::Debug));
        let ctx = step.run(3);
        assert_eq!(ctx.logs()[0].level, crate::entry::Level::Debug);
    }

    #[test]
    fn test_empty_response_logs_are_substituted() {
        let step = from_fn(|_: Call<u8>| Ctx::new(0_u8)).log_args(config());
        let ctx = step.run(42);
        assert_eq!(ctx.logs().len(), 1);
        assert_eq!(ctx.logs()[0].text, "42");
    }

    #[test]
    fn test_redaction() {
        let step = from_fn(|call: Call<&str>| call.ok(())).log_args(config().with_redaction(true));
        let ctx = step.run("password=hunter2");
        assert_eq!(ctx.logs()[0].text, REDACTED);

        let step = from_fn(|call: Call<&str>| call.ok(())).log_args(config());
        let ctx = step.run("password=hunter2");
        assert_eq!(ctx.logs()[0].text, r#""password=hunter2""#);
    }
}
