use std::cmp::Ordering;
use std::fmt;

/// Total order over keys.
///
/// Implementations must be consistent for the lifetime of the container, changing the
/// order of keys already stored breaks every lookup.
pub trait Comparator<K: ?Sized> {
    fn compare(&self, a: &K, b: &K) -> Ordering;

    #[inline]
    fn less(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

/// Orders keys by their `Ord` impl. This is the default.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NaturalOrder;

impl<K: Ord + ?Sized> Comparator<K> for NaturalOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        a.cmp(b)
    }
}

/// Orders keys descending by their `Ord` impl.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReverseOrder;

impl<K: Ord + ?Sized> Comparator<K> for ReverseOrder {
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        b.cmp(a)
    }
}

/// Adapts a closure into a `Comparator`.
///
/// # Examples
/// ```rust
/// use assoc_vector::{AssocVector, CompareFn};
///
/// // order by absolute value
/// let mut map = AssocVector::with_comparator(CompareFn::new(|a: &i32, b: &i32| a.abs().cmp(&b.abs())));
/// map.insert(-3, "a");
/// map.insert(1, "b");
/// map.insert(-2, "c");
///
/// let keys = map.keys().copied().collect::<Vec<_>>();
/// assert_eq!(keys, vec![1, -2, -3]);
/// ```
#[derive(Clone, Copy)]
pub struct CompareFn<F>(F);

impl<F> CompareFn<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

impl<K: ?Sized, F> Comparator<K> for CompareFn<F>
where
    F: Fn(&K, &K) -> Ordering,
{
    #[inline]
    fn compare(&self, a: &K, b: &K) -> Ordering {
        (self.0)(a, b)
    }
}

impl<F> fmt::Debug for CompareFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompareFn")
    }
}
