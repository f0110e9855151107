//! Call-depth sampling.

use std::backtrace::{Backtrace, BacktraceStatus};
use std::sync::OnceLock;

use crate::config::DecorateConfig;

/// Reports how deep the calling thread currently is.
///
/// Depth is measured in half-steps: one decorated call level moves the
/// bracket lines by two half-steps, so a probe that wants one of its units to
/// line up with one decorator level should report two half-steps per unit.
pub trait DepthProbe: Send + Sync {
    /// Current depth in half-steps, or `None` when it cannot be determined.
    fn depth(&self) -> Option<usize>;
}

/// Samples depth by walking the live call stack.
///
/// Counts the frames whose originating module is not excluded and reports two
/// half-steps per counted frame. Frames without a module path (C runtime
/// entry points, unresolved frames) are never counted.
///
/// The count depends on what the compiler inlined, so depths are only
/// meaningful relative to each other within a single capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackDepth {
    excluded: Vec<String>,
}

impl StackDepth {
    /// A probe ignoring frames from `excluded` modules and their submodules.
    pub fn new<I, S>(excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StackDepth {
            excluded: excluded.into_iter().map(Into::into).collect(),
        }
    }

    /// A probe using the config's exclusion set.
    pub fn from_config(config: &DecorateConfig) -> Self {
        StackDepth::new(config.excluded_modules().iter().cloned())
    }

    /// `true` when live call depths can be trusted on this build.
    ///
    /// A captured backtrace is not enough: without debug info the compiler
    /// folds frames away and the count stops following the source. This
    /// requires a known pair of nested calls to show up frame by frame, each
    /// with a resolved source location.
    pub fn is_supported() -> bool {
        static SUPPORTED: OnceLock<bool> = OnceLock::new();
        *SUPPORTED.get_or_init(|| {
            let trace = calibrate_outer();
            trace.status() == BacktraceStatus::Captured
                && locates_frames(&trace.to_string(), &CALIBRATION_FRAMES)
        })
    }

    /// Count the non-excluded frames in a rendered backtrace.
    pub fn count_frames(&self, rendered: &str) -> usize {
        rendered
            .lines()
            .filter_map(frame_symbol)
            .filter_map(originating_module)
            .filter(|module| !self.is_excluded(module))
            .count()
    }

    fn is_excluded(&self, module: &str) -> bool {
        self.excluded.iter().any(|prefix| {
            module == prefix
                || module
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with("::"))
        })
    }
}

impl DepthProbe for StackDepth {
    fn depth(&self) -> Option<usize> {
        let trace = Backtrace::force_capture();
        if trace.status() != BacktraceStatus::Captured {
            return None;
        }
        Some(self.count_frames(&trace.to_string()) * 2)
    }
}

const CALIBRATION_FRAMES: [&str; 2] = [
    "tidemark::capture::depth::calibrate_inner",
    "tidemark::capture::depth::calibrate_outer",
];

#[inline(never)]
fn calibrate_outer() -> Backtrace {
    std::hint::black_box(calibrate_inner())
}

#[inline(never)]
fn calibrate_inner() -> Backtrace {
    std::hint::black_box(Backtrace::force_capture())
}

/// `true` when every symbol in `wanted` has a frame followed by an `at` line.
fn locates_frames(rendered: &str, wanted: &[&str]) -> bool {
    let lines: Vec<&str> = rendered.lines().collect();
    wanted.iter().all(|symbol| {
        lines.windows(2).any(|pair| {
            frame_symbol(pair[0]).map(strip_hash) == Some(*symbol)
                && pair[1].trim_start().starts_with("at ")
        })
    })
}

/// The symbol of a `   N: symbol` frame line. Location lines yield `None`.
fn frame_symbol(line: &str) -> Option<&str> {
    let (index, symbol) = line.trim_start().split_once(": ")?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let symbol = symbol.trim();
    (symbol != "<unknown>").then_some(symbol)
}

/// The module path a symbol belongs to.
///
/// For `<Type as Trait>::method` the module of `Type` is used. Returns `None`
/// for symbols without any `::` path.
fn originating_module(symbol: &str) -> Option<&str> {
    let mut path = symbol.strip_prefix('<').unwrap_or(symbol);
    for prefix in ["&mut ", "&", "*const ", "*mut ", "dyn ", "["] {
        if let Some(rest) = path.strip_prefix(prefix) {
            path = rest;
        }
    }
    let end = path.find(['<', '>', ' ', '[', ']']).unwrap_or(path.len());
    let path = strip_hash(&path[..end]);
    path.contains("::").then_some(path)
}

/// Drop a trailing `::h0123456789abcdef` symbol hash.
fn strip_hash(path: &str) -> &str {
    match path.rsplit_once("::") {
        Some((head, tail))
            if tail.len() == 17
                && tail.starts_with('h')
                && tail[1..].bytes().all(|b| b.is_ascii_hexdigit()) =>
        {
            head
        }
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RENDERED: &str = "\
   0: std::backtrace_rs::backtrace::libunwind::trace
             at /rustc/abc/library/std/src/../../backtrace/src/backtrace/libunwind.rs:116:5
   1: std::backtrace::Backtrace::create
   2: <tidemark::capture::depth::StackDepth as tidemark::capture::depth::DepthProbe>::depth
             at ./src/capture/depth.rs:70:21
   3: tidemark::capture::stream::write_bytes::{{closure}}
   4: std::thread::local::LocalKey<T>::with
   5: app::report::level_three
             at ./src/report.rs:30:5
   6: app::report::level_two
   7: app::report::level_one
   8: core::ops::function::Fn::call
   9: <tidemark::decorate::FromFn<F> as tidemark::decorate::Step<A>>::call
  10: <alloc::boxed::Box<F,A> as core::ops::function::FnOnce<Args>>::call_once
  11: <unknown>
  12: __libc_start_main
  13: _start";

    fn probe() -> StackDepth {
        StackDepth::new(crate::config::DEFAULT_EXCLUDED_MODULES.iter().copied())
    }

    #[test]
    fn test_counts_only_user_frames() {
        assert_eq!(probe().count_frames(RENDERED), 3);
    }

    #[test]
    fn test_exclusion_is_by_path_segment() {
        let probe = StackDepth::new(["app::rep"]);
        assert_eq!(probe.count_frames("   0: app::report::level_one"), 1);

        let probe = StackDepth::new(["app::report"]);
        assert_eq!(probe.count_frames("   0: app::report::level_one"), 0);
    }

    #[test]
    fn test_extended_exclusions() {
        let probe = StackDepth::new(
            crate::config::DEFAULT_EXCLUDED_MODULES
                .iter()
                .copied()
                .chain(["app::report"]),
        );
        assert_eq!(probe.count_frames(RENDERED), 0);
    }

    #[test]
    fn test_frame_symbol_parsing() {
        assert_eq!(frame_symbol("   3: a::b"), Some("a::b"));
        assert_eq!(frame_symbol("             at ./src/x.rs:1:2"), None);
        assert_eq!(frame_symbol("  11: <unknown>"), None);
        assert_eq!(frame_symbol("note: something"), None);
    }

    #[test]
    fn test_originating_module_of_trait_impls() {
        let boxed = "<alloc::boxed::Box<F,A> as core::ops::function::FnOnce<Args>>::call_once";
        assert_eq!(originating_module(boxed), Some("alloc::boxed::Box"));
        assert_eq!(
            originating_module("<&mut alloc::string::String as core::fmt::Write>::write_str"),
            Some("alloc::string::String")
        );
        assert_eq!(originating_module("main"), None);
    }

    #[test]
    fn test_strips_symbol_hash() {
        assert_eq!(
            originating_module("app::report::level_one::h0123456789abcdef"),
            Some("app::report::level_one")
        );
    }

    #[test]
    fn test_calibration_needs_source_locations() {
        let wanted = ["app::outer", "app::inner"];
        let resolved = "\
   0: app::inner
             at ./src/app.rs:4:5
   1: app::outer::h0123456789abcdef
             at ./src/app.rs:9:5
   2: main";
        assert!(locates_frames(resolved, &wanted));

        let stripped = "\
   0: app::inner
   1: app::outer
   2: main";
        assert!(!locates_frames(stripped, &wanted));

        let folded = "\
   0: app::outer
             at ./src/app.rs:9:5
   1: main";
        assert!(!locates_frames(folded, &wanted));
    }

    #[test]
    fn test_live_depth_is_even() {
        if !StackDepth::is_supported() {
            return;
        }
        let depth = StackDepth::new(Vec::<String>::new()).depth();
        assert!(depth.is_some_and(|d| d % 2 == 0 && d > 0));
    }
}
