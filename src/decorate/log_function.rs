//! Entry and exit brackets around a call.

use std::borrow::Cow;

use crate::config::DecorateConfig;
use crate::ctx::Ctx;
use crate::decorate::step::{Call, Step};
use crate::sink::{inherited_indent, LogSinkExt, Record};

/// Brackets the inner step with `--> name` and `<-- name` entries.
///
/// Created by [`StepExt::log_function`](crate::decorate::StepExt::log_function).
///
/// Both brackets sit one spacing step right of the indent inherited when the
/// call arrived. The exit line's `next_indent` points back at that inherited
/// indent, so whatever the caller logs afterwards is at its own level again.
/// The exit line is written for failed calls too.
#[derive(Debug, Clone)]
pub struct LogFunction<S> {
    pub(crate) inner: S,
    pub(crate) name: Cow<'static, str>,
    pub(crate) config: DecorateConfig,
}

impl<S> LogFunction<S> {
    /// The name written in the brackets.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<A, S> Step<A> for LogFunction<S>
where
    S: Step<A>,
{
    type Output = S::Output;

    fn call(&self, call: Call<A>) -> Ctx<S::Output> {
        let level = self.config.level();
        let base = inherited_indent(&call.logs);
        let at = base + self.config.spacing();

        let call = call.append(
            Record::new(format!("--> {}", self.name))
                .level(level)
                .indent(at),
        );
        self.inner.call(call).append(
            Record::new(format!("<-- {}", self.name))
                .level(level)
                .indent(at)
                .next_indent(base),
        )
    }
}
