use std::iter::FusedIterator;

use crate::vector::{AssocVector, Comparator, Keys, NaturalOrder};

/// A sorted set on top of `AssocVector`.
#[derive(Clone)]
pub struct AssocSet<K, C = NaturalOrder> {
    inner: AssocVector<K, (), C>,
}

impl<K> AssocSet<K> {
    /// Create a new AssocSet
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocSet;
    ///
    /// let set = AssocSet::<i32>::new();
    /// assert!(set.is_empty());
    /// ```
    pub fn new() -> Self {
        Self {
            inner: AssocVector::new(),
        }
    }
}

impl<K, C> AssocSet<K, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self {
            inner: AssocVector::with_comparator(cmp),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn clear(&mut self) {
        self.inner.clear()
    }
}

impl<K, C: Comparator<K>> AssocSet<K, C> {
    /// Insert a key into the set
    /// Returns true if the key was inserted, false if it already existed
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocSet;
    ///
    /// let mut set = AssocSet::<i32>::new();
    /// assert!(set.insert(1));
    /// assert!(!set.insert(1));
    /// ```
    pub fn insert(&mut self, k: K) -> bool {
        self.inner.insert(k, ())
    }

    /// Remove a key from the set
    /// Returns true if the key was removed, false if it didn't exist
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocSet;
    ///
    /// let mut set = AssocSet::<i32>::new();
    /// set.insert(1);
    /// assert!(set.remove(&1));
    /// assert!(!set.remove(&2));
    /// ```
    pub fn remove(&mut self, k: &K) -> bool {
        self.inner.erase(k)
    }

    pub fn contains(&self, k: &K) -> bool {
        self.inner.contains_key(k)
    }

    pub fn first(&self) -> Option<&K> {
        self.inner.first().map(|(k, _)| k)
    }

    pub fn last(&self) -> Option<&K> {
        self.inner.last().map(|(k, _)| k)
    }

    /// Fold pending inserts and erases into the sorted storage.
    pub fn merge(&mut self) {
        self.inner.merge()
    }

    /// Iterate keys in order
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocSet;
    ///
    /// let set = [3, 1, 2, 1].into_iter().collect::<AssocSet<_>>();
    /// let keys = set.iter().copied().collect::<Vec<_>>();
    /// assert_eq!(keys, vec![1, 2, 3]);
    /// ```
    pub fn iter(&self) -> Keys<'_, K, (), C> {
        self.inner.keys()
    }
}

impl<K> Default for AssocSet<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PartialEq, C: Comparator<K>> PartialEq for AssocSet<K, C> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<K: Eq, C: Comparator<K>> Eq for AssocSet<K, C> {}

impl<K: std::fmt::Debug, C: Comparator<K>> std::fmt::Debug for AssocSet<K, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, C: Comparator<K>> Extend<K> for AssocSet<K, C> {
    fn extend<T: IntoIterator<Item = K>>(&mut self, iter: T) {
        self.inner.insert_iter(iter.into_iter().map(|k| (k, ())));
    }
}

impl<K: Ord> FromIterator<K> for AssocSet<K> {
    fn from_iter<T: IntoIterator<Item = K>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl<K, C: Comparator<K>> IntoIterator for AssocSet<K, C> {
    type Item = K;
    type IntoIter = IntoIter<K>;

    fn into_iter(self) -> IntoIter<K> {
        IntoIter {
            inner: self.inner.into_iter(),
        }
    }
}

/// Owning iterator over the keys of an `AssocSet`.
pub struct IntoIter<K> {
    inner: crate::vector::IntoIter<K, ()>,
}

impl<K> Iterator for IntoIter<K> {
    type Item = K;

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    fn next(&mut self) -> Option<K> {
        self.inner.next().map(|(k, _)| k)
    }
}

impl<K> DoubleEndedIterator for IntoIter<K> {
    fn next_back(&mut self) -> Option<K> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<K> ExactSizeIterator for IntoIter<K> {}
impl<K> FusedIterator for IntoIter<K> {}
