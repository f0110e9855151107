//! Depth-aware capture of a thread's output stream
//!
//! Code that wants its output to land in a trace writes through this crate's
//! thread-local stream: [`cprint!`](crate::cprint), [`cprintln!`](crate::cprintln)
//! or any `io::Write` call on [`stdout()`]. Outside a capture the text goes to
//! the process stdout unchanged.
//!
//! While a [`CaptureGuard`] is alive, every write becomes a [`Chunk`] tagged
//! with the call depth a [`DepthProbe`] reported at that moment. When the
//! capture ends, [`reconcile`] groups chunks into lines and places each line
//! on an indent ladder relative to the shallowest writer, so a helper's output
//! sits below the output of the function that called it.
//!
//! ```
//! use tidemark::capture::{self, CaptureGuard, Chunk};
//! use tidemark::config::CaptureMode;
//! use tidemark::cprintln;
//!
//! let guard = CaptureGuard::install(None);
//! cprintln!("checking {} files", 3);
//! let chunks = guard.finish();
//!
//! let lines = capture::reconcile(&chunks, CaptureMode::Basic, 4, 2);
//! assert_eq!(lines, vec![(4, "checking 3 files".to_string())]);
//! ```
//!
//! The [`redirect_stdout`](crate::decorate::StepExt::redirect_stdout)
//! decorator drives all of this for a single call.

mod depth;
mod lines;
mod stream;

pub use depth::{DepthProbe, StackDepth};
pub use lines::{group_lines, ladder, reconcile, CapturedLine};
pub use stream::{is_capturing, stdout, CaptureGuard, Chunk, Stdout};

#[doc(hidden)]
pub use stream::print;

/// Print to this thread's stream, which may be captured.
///
/// Same syntax as [`print!`].
#[macro_export]
macro_rules! cprint {
    ($($arg:tt)*) => {
        $crate::capture::print(::std::format_args!($($arg)*))
    };
}

/// Print a line to this thread's stream, which may be captured.
///
/// Same syntax as [`println!`]. The text and its newline are written as a
/// single chunk.
#[macro_export]
macro_rules! cprintln {
    () => {
        $crate::capture::print(::std::format_args!("\n"))
    };
    ($($arg:tt)*) => {
        $crate::capture::print(::std::format_args!("{}\n", ::std::format_args!($($arg)*)))
    };
}
