//! Container identifiers.
//!
//! Identifiers are UUIDv7 strings. Their lexicographic order matches the order
//! in which they were minted within a process, which is what tests and debug
//! output rely on. The core logic never inspects them.

use uuid::Uuid;

/// Mint a fresh, process-unique identifier.
///
/// # Examples
///
/// ```
/// use tidemark::id::fresh_id;
///
/// let first = fresh_id();
/// let second = fresh_id();
/// assert!(first < second);
/// ```
pub fn fresh_id() -> String {
    Uuid::now_v7().hyphenated().to_string()
}

/// The default human label for an identifier.
pub(crate) fn default_name(id: &str) -> String {
    // The tail of a v7 uuid is random, the head is the timestamp
    let tail = id.rsplit('-').next().unwrap_or(id);
    format!("ctx-{}", tail)
}
