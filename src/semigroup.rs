//! Semigroup and Monoid for the pieces a container accumulates
//!
//! Combining two containers never needs anything fancier than these two
//! traits: logs concatenate in order and metadata maps merge with the right
//! side winning on key clashes.
//!
//! # Laws
//!
//! ```text
//! a.combine(b).combine(c) == a.combine(b.combine(c))   (associativity)
//! a.combine(M::empty()) == a                            (right identity)
//! M::empty().combine(a) == a                            (left identity)
//! ```
//!
//! # Examples
//!
//! ```
//! use tidemark::semigroup::{Monoid, Semigroup};
//! use std::collections::BTreeMap;
//!
//! assert_eq!(vec![1, 2].combine(vec![3]), vec![1, 2, 3]);
//!
//! let left = BTreeMap::from([("user", "ann"), ("step", "load")]);
//! let right = BTreeMap::from([("step", "save")]);
//! assert_eq!(left.combine(right), BTreeMap::from([("user", "ann"), ("step", "save")]));
//!
//! let empty: Vec<i32> = Monoid::empty();
//! assert!(empty.is_empty());
//! ```

use std::collections::BTreeMap;

/// A type with an associative binary operation.
///
/// `combine` takes both sides by value; clone first if you need to keep them.
pub trait Semigroup: Sized {
    /// Combine this value with another value associatively.
    fn combine(self, other: Self) -> Self;
}

/// A [`Semigroup`] with an identity element.
pub trait Monoid: Semigroup {
    /// The identity element.
    fn empty() -> Self;

    /// Combine every item, starting from [`Monoid::empty`].
    fn concat<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        items.into_iter().fold(Self::empty(), Semigroup::combine)
    }
}

impl<T> Semigroup for Vec<T> {
    #[inline]
    fn combine(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}

impl<T> Monoid for Vec<T> {
    fn empty() -> Self {
        Vec::new()
    }
}

// Right-biased union
impl<K: Ord, V> Semigroup for BTreeMap<K, V> {
    fn combine(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }
}

impl<K: Ord, V> Monoid for BTreeMap<K, V> {
    fn empty() -> Self {
        BTreeMap::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_vec_combine_preserves_order() {
        let combined = vec!["a", "b"].combine(vec!["c"]);
        assert_eq!(combined, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_map_combine_is_right_biased() {
        let left = BTreeMap::from([("k", 1), ("only_left", 2)]);
        let right = BTreeMap::from([("k", 10)]);
        let merged = left.combine(right);
        assert_eq!(merged.get("k"), Some(&10));
        assert_eq!(merged.get("only_left"), Some(&2));
    }

    #[test]
    fn test_concat() {
        let all = <Vec<i32> as Monoid>::concat(vec![vec![1], vec![], vec![2, 3]]);
        assert_eq!(all, vec![1, 2, 3]);

        let none: Vec<i32> = Monoid::concat(Vec::<Vec<i32>>::new());
        assert!(none.is_empty());
    }

    proptest! {
        #[test]
        fn prop_vec_associative(
            a in prop::collection::vec(any::<u8>(), 0..8),
            b in prop::collection::vec(any::<u8>(), 0..8),
            c in prop::collection::vec(any::<u8>(), 0..8),
        ) {
            let left = a.clone().combine(b.clone()).combine(c.clone());
            let right = a.combine(b.combine(c));
            prop_assert_eq!(left, right);
        }

        #[test]
        fn prop_map_identity(
            entries in prop::collection::btree_map(any::<u8>(), any::<u8>(), 0..8),
        ) {
            prop_assert_eq!(entries.clone().combine(BTreeMap::empty()), entries.clone());
            prop_assert_eq!(BTreeMap::empty().combine(entries.clone()), entries);
        }
    }
}
