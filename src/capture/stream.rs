//! The thread-local output stream and its capture slot.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::io::{self, Write};
use std::marker::PhantomData;

use crate::capture::depth::DepthProbe;

thread_local! {
    static ACTIVE: RefCell<Option<CaptureBuffer>> = const { RefCell::new(None) };
    static NESTING: Cell<usize> = const { Cell::new(0) };
}

/// One write to the stream, tagged with the depth it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// The text written.
    pub text: String,
    /// Depth in half-steps at the time of the write; `0` without a probe.
    pub depth: usize,
}

impl Chunk {
    /// Build a chunk.
    pub fn new(text: impl Into<String>, depth: usize) -> Self {
        Chunk {
            text: text.into(),
            depth,
        }
    }
}

struct CaptureBuffer {
    probe: Option<Box<dyn DepthProbe>>,
    chunks: Vec<Chunk>,
    // Trailing bytes of a character split across writes
    pending: Vec<u8>,
}

impl CaptureBuffer {
    fn record(&mut self, bytes: &[u8]) {
        self.pending.extend_from_slice(bytes);
        let text = take_complete(&mut self.pending);
        if !text.is_empty() {
            let depth = self.probe.as_ref().and_then(|p| p.depth()).unwrap_or(0);
            self.chunks.push(Chunk::new(text, depth));
        }
    }

    fn into_chunks(mut self) -> Vec<Chunk> {
        if !self.pending.is_empty() {
            let depth = self.chunks.last().map_or(0, |c| c.depth);
            let text = String::from_utf8_lossy(&self.pending).into_owned();
            self.chunks.push(Chunk::new(text, depth));
        }
        self.chunks
    }
}

/// Drain the decodable prefix of `pending`.
///
/// An incomplete sequence at the end stays behind for the next write. Invalid
/// bytes anywhere else are replaced with U+FFFD.
fn take_complete(pending: &mut Vec<u8>) -> String {
    let complete = match std::str::from_utf8(pending) {
        Ok(_) => pending.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => pending.len(),
    };
    let rest = pending.split_off(complete);
    let text = String::from_utf8_lossy(pending).into_owned();
    *pending = rest;
    text
}

/// Redirects this thread's stream into a buffer until finished or dropped.
///
/// Guards nest: installing a guard while another is active parks the outer
/// buffer, and finishing or dropping the inner guard puts it back. Guards must
/// be finished innermost first; debug builds assert it. Dropping a guard
/// during unwinding restores the previous state as well; captured text is
/// then discarded.
///
/// ```
/// use tidemark::capture::{CaptureGuard, Chunk};
/// use tidemark::cprintln;
///
/// let guard = CaptureGuard::install(None);
/// cprintln!("hidden from the terminal");
/// let chunks = guard.finish();
///
/// assert_eq!(chunks, vec![Chunk::new("hidden from the terminal\n", 0)]);
/// ```
#[must_use = "output is only captured while the guard is alive"]
pub struct CaptureGuard {
    previous: Option<CaptureBuffer>,
    level: usize,
    restored: bool,
    // Bound to the installing thread
    _not_send: PhantomData<*const ()>,
}

impl CaptureGuard {
    /// Start capturing, tagging writes with depths from `probe` if given.
    pub fn install(probe: Option<Box<dyn DepthProbe>>) -> Self {
        let buffer = CaptureBuffer {
            probe,
            chunks: Vec::new(),
            pending: Vec::new(),
        };
        let previous = ACTIVE.with(|slot| slot.replace(Some(buffer)));
        let level = NESTING.with(|n| {
            n.set(n.get() + 1);
            n.get()
        });
        CaptureGuard {
            previous,
            level,
            restored: false,
            _not_send: PhantomData,
        }
    }

    /// Stop capturing and return what was written, in order.
    pub fn finish(mut self) -> Vec<Chunk> {
        self.restore()
    }

    fn restore(&mut self) -> Vec<Chunk> {
        let current = NESTING.with(Cell::get);
        if !std::thread::panicking() {
            debug_assert_eq!(
                current, self.level,
                "capture guards must be finished innermost first"
            );
        }
        NESTING.with(|n| n.set(self.level - 1));
        self.restored = true;
        let previous = self.previous.take();
        ACTIVE
            .with(|slot| slot.replace(previous))
            .map(CaptureBuffer::into_chunks)
            .unwrap_or_default()
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        if !self.restored {
            self.restore();
        }
    }
}

impl fmt::Debug for CaptureGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureGuard")
            .field("level", &self.level)
            .field("restored", &self.restored)
            .finish()
    }
}

/// `true` when this thread's stream is currently captured.
pub fn is_capturing() -> bool {
    ACTIVE.with(|slot| slot.borrow().is_some())
}

/// Write `bytes` to this thread's stream.
///
/// Returns `false` when no capture is active and the caller should forward
/// the text to the process stdout.
fn write_bytes(bytes: &[u8]) -> bool {
    ACTIVE.with(|slot| match slot.borrow_mut().as_mut() {
        Some(buffer) => {
            if !bytes.is_empty() {
                buffer.record(bytes);
            }
            true
        }
        None => false,
    })
}

/// Handle to this thread's output stream.
///
/// Writes go to the active capture, or straight to the process stdout when
/// nothing is capturing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stdout {
    _private: (),
}

/// This thread's output stream.
///
/// ```
/// use std::io::Write;
/// use tidemark::capture::{self, CaptureGuard};
///
/// let guard = CaptureGuard::install(None);
/// write!(capture::stdout(), "partial").unwrap();
/// writeln!(capture::stdout(), " line").unwrap();
/// let text: String = guard.finish().into_iter().map(|c| c.text).collect();
/// assert_eq!(text, "partial line\n");
/// ```
pub fn stdout() -> Stdout {
    Stdout { _private: () }
}

impl Write for Stdout {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if write_bytes(buf) {
            Ok(buf.len())
        } else {
            io::stdout().write(buf)
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if is_capturing() {
            Ok(())
        } else {
            io::stdout().flush()
        }
    }
}

/// Backs [`cprint!`](crate::cprint) and [`cprintln!`](crate::cprintln).
///
/// Formats first so one macro call is one chunk.
#[doc(hidden)]
pub fn print(args: fmt::Arguments<'_>) {
    let text = args.to_string();
    if !write_bytes(text.as_bytes()) {
        if let Err(e) = io::stdout().write_all(text.as_bytes()) {
            panic!("failed printing to stdout: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(usize);

    impl DepthProbe for Fixed {
        fn depth(&self) -> Option<usize> {
            Some(self.0)
        }
    }

    fn texts(chunks: &[Chunk]) -> Vec<&str> {
        chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn test_capture_records_in_order() {
        let guard = CaptureGuard::install(None);
        print(format_args!("a"));
        print(format_args!("b\n"));
        let chunks = guard.finish();

        assert_eq!(texts(&chunks), vec!["a", "b\n"]);
        assert!(!is_capturing());
    }

    #[test]
    fn test_probe_tags_chunks() {
        let guard = CaptureGuard::install(Some(Box::new(Fixed(6))));
        print(format_args!("deep"));
        let chunks = guard.finish();
        assert_eq!(chunks, vec![Chunk::new("deep", 6)]);
    }

    #[test]
    fn test_nested_guards_restore_outer() {
        let outer = CaptureGuard::install(None);
        print(format_args!("outer before\n"));

        let inner = CaptureGuard::install(None);
        print(format_args!("inner\n"));
        assert_eq!(texts(&inner.finish()), vec!["inner\n"]);

        print(format_args!("outer after\n"));
        assert_eq!(
            texts(&outer.finish()),
            vec!["outer before\n", "outer after\n"]
        );
    }

    #[test]
    fn test_drop_restores_on_unwind() {
        let outer = CaptureGuard::install(None);

        let result = std::panic::catch_unwind(|| {
            let _inner = CaptureGuard::install(None);
            print(format_args!("lost\n"));
            panic!("boom");
        });
        assert!(result.is_err());

        print(format_args!("kept\n"));
        assert_eq!(texts(&outer.finish()), vec!["kept\n"]);
    }

    #[test]
    fn test_capture_is_thread_local() {
        let guard = CaptureGuard::install(None);
        print(format_args!("main thread\n"));

        let other = std::thread::spawn(|| {
            let guard = CaptureGuard::install(None);
            print(format_args!("worker\n"));
            guard.finish()
        })
        .join()
        .unwrap();

        assert_eq!(texts(&other), vec!["worker\n"]);
        assert_eq!(texts(&guard.finish()), vec!["main thread\n"]);
    }

    #[test]
    fn test_character_split_across_writes() {
        let guard = CaptureGuard::install(None);
        let mut out = stdout();
        out.write_all(&[b'c', b'a', b'f', 0xC3]).unwrap();
        out.write_all(&[0xA9, b'\n']).unwrap();
        let text: String = guard.finish().into_iter().map(|c| c.text).collect();
        assert_eq!(text, "caf\u{e9}\n");
    }

    #[test]
    fn test_dangling_bytes_are_replaced_on_finish() {
        let guard = CaptureGuard::install(None);
        stdout().write_all(&[b'x', 0xE2, 0x82]).unwrap();
        let chunks = guard.finish();
        assert_eq!(texts(&chunks), vec!["x", "\u{fffd}"]);
    }

    #[test]
    fn test_invalid_bytes_do_not_stall() {
        let mut pending = vec![b'a', 0xFF, b'b'];
        assert_eq!(take_complete(&mut pending), "a\u{fffd}b");
        assert!(pending.is_empty());
    }

    #[cfg(debug_assertions)]
    #[test]
    #[should_panic(expected = "innermost first")]
    fn test_out_of_order_finish_is_caught() {
        let outer = CaptureGuard::install(None);
        let _inner = CaptureGuard::install(None);
        let _ = outer.finish();
    }

    #[test]
    fn test_nesting_level_returns_to_zero() {
        let outer = CaptureGuard::install(None);
        let inner = CaptureGuard::install(None);
        inner.finish();
        outer.finish();
        assert_eq!(NESTING.with(Cell::get), 0);
    }

    #[test]
    fn test_empty_writes_are_skipped() {
        let guard = CaptureGuard::install(None);
        print(format_args!(""));
        assert!(guard.finish().is_empty());
    }
}
