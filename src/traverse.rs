//! Sequencing and composing container-producing steps
//!
//! - **`sequence`**: turn a list of containers into a container of a list
//!   - `Vec<Ctx<T>>` → `Ctx<Vec<T>>`
//! - **`traverse`**: map a function over values, then sequence
//! - **`compose`**: left-to-right (Kleisli) composition of two steps
//!
//! # Metadata
//!
//! `sequence` starts from `Ctx::new(Vec::new())` and chains each input into
//! it, so the result carries the accumulator's *empty* metadata. Metadata on
//! the inputs is not merged. Merge it yourself if you need it:
//!
//! ```
//! use tidemark::prelude::*;
//! use tidemark::traverse::sequence;
//!
//! let parts = vec![Ctx::new(1).with_meta("a", "1"), Ctx::new(2).with_meta("b", "2")];
//! let merged = parts
//!     .iter()
//!     .fold(Metadata::new(), |acc, c| acc.combine(c.metadata().clone()));
//!
//! let all = sequence(parts).with_metadata(merged);
//! assert_eq!(all.metadata().len(), 2);
//! ```

use crate::ctx::Ctx;

/// Collect a sequence of containers into one container of their values.
///
/// Fails fast: the first failed input becomes the result. Its logs, and the
/// logs of every input before it, are kept; inputs after it contribute
/// nothing.
///
/// # Examples
///
/// ```
/// use tidemark::prelude::*;
/// use tidemark::traverse::sequence;
///
/// let ok = sequence(vec![Ctx::new(1).info("one"), Ctx::new(2).info("two")]);
/// assert_eq!(ok.result(), Some(&vec![1, 2]));
/// assert_eq!(ok.logs().len(), 2);
///
/// let failed = sequence(vec![
///     Ctx::new(1).info("a"),
///     Ctx::failed("b broke").info("b"),
///     Ctx::new(3).info("c"),
/// ]);
/// assert!(failed.is_failed());
/// let texts: Vec<_> = failed.logs().iter().map(|e| e.text.as_str()).collect();
/// assert_eq!(texts, vec!["a", "b"]);
/// ```
pub fn sequence<T, I>(iter: I) -> Ctx<Vec<T>>
where
    I: IntoIterator<Item = Ctx<T>>,
{
    iter.into_iter().fold(Ctx::new(Vec::new()), |acc, next| {
        acc.and_then(|mut values| {
            next.map(|value| {
                values.push(value);
                values
            })
        })
    })
}

/// Map `f` over `values` and sequence the containers it produces.
///
/// Equivalent to `sequence(values.into_iter().map(f))`: `f` runs for every
/// value, even after a failure, but only the logs up to the first failure are
/// kept.
///
/// # Examples
///
/// ```
/// use tidemark::prelude::*;
/// use tidemark::traverse::traverse;
///
/// let doubled = traverse(vec![1, 2, 3], |n| Ctx::new(n * 2).debug(format!("doubled {}", n)));
/// assert_eq!(doubled.result(), Some(&vec![2, 4, 6]));
/// ```
pub fn traverse<A, T, F, I>(values: I, f: F) -> Ctx<Vec<T>>
where
    I: IntoIterator<Item = A>,
    F: FnMut(A) -> Ctx<T>,
{
    sequence(values.into_iter().map(f))
}

/// Left-to-right composition: `compose(f, g)(x) == f(x).and_then(g)`.
///
/// # Examples
///
/// ```
/// use tidemark::prelude::*;
/// use tidemark::traverse::compose;
///
/// let parse = |s: &str| Ctx::from_result(s.parse::<i32>()).info("parsed");
/// let square = |n: i32| Ctx::new(n * n).info("squared");
///
/// let both = compose(parse, square);
/// let out = both("7");
/// assert_eq!(out.result(), Some(&49));
/// assert_eq!(out.logs().len(), 2);
/// ```
pub fn compose<A, B, C, F, G>(f: F, g: G) -> impl Fn(A) -> Ctx<C>
where
    F: Fn(A) -> Ctx<B>,
    G: Fn(B) -> Ctx<C>,
{
    move |x| f(x).and_then(&g)
}
