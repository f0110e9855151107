//! Turning captured chunks into indented lines.

use crate::capture::stream::Chunk;
use crate::config::CaptureMode;

/// A completed line and the shallowest depth that contributed to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLine {
    /// Line text without its terminator.
    pub text: String,
    /// Minimum depth, in half-steps, among the chunks that wrote this line.
    pub depth: usize,
}

/// Group chunks into lines.
///
/// A chunk contributes its depth to a line when it writes any of that line's
/// characters or its terminating newline. A trailing line without a newline
/// is kept.
///
/// ```
/// use tidemark::capture::{group_lines, CapturedLine, Chunk};
///
/// // A deeper call finishes a line a shallower call started
/// let lines = group_lines(&[
///     Chunk::new("working", 2),
///     Chunk::new("... done\nnext", 6),
/// ]);
/// assert_eq!(lines, vec![
///     CapturedLine { text: "working... done".into(), depth: 2 },
///     CapturedLine { text: "next".into(), depth: 6 },
/// ]);
/// ```
pub fn group_lines(chunks: &[Chunk]) -> Vec<CapturedLine> {
    let mut lines = Vec::new();
    let mut text = String::new();
    let mut depth: Option<usize> = None;

    for chunk in chunks {
        let mut rest = chunk.text.as_str();
        while let Some(pos) = rest.find('\n') {
            text.push_str(&rest[..pos]);
            let line_depth = depth.take().map_or(chunk.depth, |d| d.min(chunk.depth));
            lines.push(CapturedLine {
                text: finish_line(&mut text),
                depth: line_depth,
            });
            rest = &rest[pos + 1..];
        }
        if !rest.is_empty() {
            text.push_str(rest);
            depth = Some(depth.map_or(chunk.depth, |d| d.min(chunk.depth)));
        }
    }

    if let Some(depth) = depth {
        lines.push(CapturedLine {
            text: finish_line(&mut text),
            depth,
        });
    }
    lines
}

fn finish_line(text: &mut String) -> String {
    let mut line = std::mem::take(text);
    if line.ends_with('\r') {
        line.pop();
    }
    line
}

/// Place lines on an indent ladder relative to the shallowest one.
///
/// Each line's depth relative to the capture's minimum is rounded up to an
/// even number of half-steps, so captured output lines up with the brackets
/// written by [`log_function`](crate::decorate::StepExt::log_function).
/// Blank lines are dropped after the baseline is taken.
///
/// ```
/// use tidemark::capture::{ladder, CapturedLine};
///
/// let lines = vec![
///     CapturedLine { text: "Level 1".into(), depth: 10 },
///     CapturedLine { text: "Level 2".into(), depth: 11 },
///     CapturedLine { text: "Level 3".into(), depth: 14 },
/// ];
/// // base indent 4, half-step 2
/// assert_eq!(ladder(lines, 4, 2), vec![
///     (4, "Level 1".to_string()),
///     (8, "Level 2".to_string()),
///     (12, "Level 3".to_string()),
/// ]);
/// ```
pub fn ladder(lines: Vec<CapturedLine>, base: usize, half_step: usize) -> Vec<(usize, String)> {
    let baseline = lines.iter().map(|l| l.depth).min().unwrap_or(0);
    lines
        .into_iter()
        .filter(|l| !l.text.trim().is_empty())
        .map(|l| {
            let relative = (l.depth - baseline).next_multiple_of(2);
            (base + relative * half_step, l.text)
        })
        .collect()
}

/// Convert captured chunks into `(indent, text)` pairs for the given mode.
///
/// In [`CaptureMode::Basic`] every non-blank line lands at `base`.
pub fn reconcile(
    chunks: &[Chunk],
    mode: CaptureMode,
    base: usize,
    half_step: usize,
) -> Vec<(usize, String)> {
    let lines = group_lines(chunks);
    match mode {
        CaptureMode::Depth => ladder(lines, base, half_step),
        CaptureMode::Basic => lines
            .into_iter()
            .filter(|l| !l.text.trim().is_empty())
            .map(|l| (base, l.text))
            .collect(),
    }
}
