//! Folding a call's captured output into its trace.

use crate::capture::{self, CaptureGuard, DepthProbe, StackDepth};
use crate::config::{CaptureMode, DecorateConfig};
use crate::ctx::Ctx;
use crate::decorate::step::{Call, Step};
use crate::entry::{Level, LogEntry};
use crate::sink::{inherited_indent, LogSink};

/// Captures the thread's output stream while the inner step runs.
///
/// Created by [`StepExt::redirect_stdout`](crate::decorate::StepExt::redirect_stdout).
///
/// Each non-blank captured line becomes one entry. In
/// [`CaptureMode::Depth`] lines are indented by how deep the writer was
/// relative to the shallowest writer of this capture; in
/// [`CaptureMode::Basic`] they all sit at the inherited indent. The entries
/// go ahead of anything the inner step appended to the trace it was given.
///
/// The capture is undone when the inner step panics, and the panic keeps
/// unwinding. Wrap a [`CatchError`](crate::decorate::CatchError) inside this
/// decorator to turn it into a failure instead.
#[derive(Debug, Clone)]
pub struct RedirectStdout<S> {
    pub(crate) inner: S,
    pub(crate) config: DecorateConfig,
}

impl<S> RedirectStdout<S> {
    fn effective_mode(&self) -> CaptureMode {
        match self.config.capture() {
            CaptureMode::Depth if !StackDepth::is_supported() => {
                #[cfg(feature = "tracing")]
                tracing::debug!("Backtraces unavailable, capturing output in basic mode");
                CaptureMode::Basic
            }
            mode => mode,
        }
    }
}

impl<A, S> Step<A> for RedirectStdout<S>
where
    S: Step<A>,
{
    type Output = S::Output;

    fn call(&self, call: Call<A>) -> Ctx<S::Output> {
        let before = call.logs.clone();
        let base = inherited_indent(&before);
        let mode = self.effective_mode();
        let probe: Option<Box<dyn DepthProbe>> = match mode {
            CaptureMode::Depth => Some(Box::new(StackDepth::from_config(&self.config))),
            CaptureMode::Basic => None,
        };

        let guard = CaptureGuard::install(probe);
        let response = self.inner.call(call);
        let chunks = guard.finish();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            "Captured {} output chunks in {} mode at indent {}",
            chunks.len(),
            mode,
            base
        );

        let lines = capture::reconcile(&chunks, mode, base, self.config.half_step());
        merge_captured(response, &before, lines, self.config.level())
    }
}

/// Insert captured lines into `response`'s trace.
///
/// If the trace is exactly what the call arrived with, the lines become its
/// tail. Otherwise they go right after the arrived prefix, ahead of whatever
/// the inner step appended.
fn merge_captured<T>(
    response: Ctx<T>,
    before: &[LogEntry],
    lines: Vec<(usize, String)>,
    level: Level,
) -> Ctx<T> {
    if lines.is_empty() {
        return response;
    }
    let captured = lines
        .into_iter()
        .map(|(indent, text)| LogEntry::new(text, level, indent));

    response.update_logs(|logs| {
        if logs.as_slice() == before {
            logs.extend(captured);
        } else {
            let at = before.len().min(logs.len());
            logs.splice(at..at, captured);
        }
    })
}
