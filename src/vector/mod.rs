mod compare;
mod consts;
mod cursor;
mod iterator;
mod owned_buffer;
mod sorted;
mod utils;

use std::fmt;
use std::mem;
use std::ops::Index;

use tracing::{debug, trace};

pub use allocator_api2::alloc::{Allocator, Global};
pub use compare::{Comparator, CompareFn, NaturalOrder, ReverseOrder};
pub use cursor::Cursor;
pub use iterator::{IntoIter, Iter, Keys, Values};
pub use owned_buffer::{IntoIter as BufferIntoIter, OwnedBuffer};

use crate::error::Result;
use cursor::Slot;
use sorted::Tombstones;

/// A sorted associative container backed by arrays.
///
/// Entries live in three buffers:
/// * `storage`, sorted, holds most entries and grows by doubling
/// * `buffer`, sorted and small (`√capacity` of storage), absorbs inserts that don't append
///   to storage, and is merged into storage when full
/// * `erased`, sorted storage positions of lazily deleted entries, compacted away when full
///
/// Appending keys in increasing order is amortized O(1), random inserts and erases are
/// amortized O(√n), and lookups are O(log n).
///
/// # Examples
/// ```rust
/// use assoc_vector::AssocVector;
///
/// let mut map = AssocVector::new();
/// map.insert(3, "c");
/// map.insert(1, "a");
/// map.insert(2, "b");
///
/// assert_eq!(map.len(), 3);
/// assert_eq!(map.get(&1), Some(&"a"));
///
/// let keys = map.keys().copied().collect::<Vec<_>>();
/// assert_eq!(keys, vec![1, 2, 3]);
///
/// map.erase(&2);
/// assert!(!map.contains_key(&2));
/// ```
///
/// All three buffers are allocated from `A`, see `with_capacity_comparator_and_allocator`.
#[derive(Clone)]
pub struct AssocVector<K, V, C = NaturalOrder, A: Allocator = Global> {
    storage: OwnedBuffer<(K, V), A>,
    buffer: OwnedBuffer<(K, V), A>,
    erased: OwnedBuffer<usize, A>,
    cmp: C,
    st: Statistic,
}

/// Statistic data used to guide the perf tuning
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Statistic {
    /// buffer merged into storage without reallocating
    pub merges: u64,
    /// erased entries removed from storage without reallocating
    pub compactions: u64,
    /// storage moved to a new allocation
    pub reallocations: u64,
}

/// Lengths and capacities of the three internal buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segments {
    pub storage_len: usize,
    pub storage_capacity: usize,
    pub buffer_len: usize,
    pub buffer_capacity: usize,
    pub erased_len: usize,
    pub erased_capacity: usize,
}

impl<K, V> AssocVector<K, V> {
    /// Create an empty `AssocVector` ordered by `K`'s `Ord`, with room for 16 entries.
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocVector;
    ///
    /// let map = AssocVector::<i32, i32>::new();
    ///
    /// assert!(map.is_empty());
    /// assert_eq!(map.segments().storage_capacity, 16);
    /// ```
    pub fn new() -> Self {
        Self::with_comparator(NaturalOrder)
    }

    /// Create an empty `AssocVector` with room for `capacity` entries in storage.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_comparator(capacity, NaturalOrder)
    }
}

impl<K, V, C> AssocVector<K, V, C> {
    pub fn with_comparator(cmp: C) -> Self {
        Self::with_capacity_and_comparator(consts::DEFAULT_CAPACITY, cmp)
    }

    pub fn with_capacity_and_comparator(capacity: usize, cmp: C) -> Self {
        Self::with_capacity_comparator_and_allocator(capacity, cmp, Global)
    }
}

impl<K, V, C, A: Allocator + Clone> AssocVector<K, V, C, A> {
    /// Create an empty `AssocVector` whose storage, buffer and erased list are all allocated
    /// from `alloc`, including every later reallocation.
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::{AssocVector, Global, NaturalOrder};
    ///
    /// let mut map = AssocVector::with_capacity_comparator_and_allocator(4, NaturalOrder, Global);
    /// for k in 0..10 {
    ///     map.insert(k, k);
    /// }
    /// assert_eq!(map.len(), 10);
    /// ```
    pub fn with_capacity_comparator_and_allocator(capacity: usize, cmp: C, alloc: A) -> Self {
        let side = consts::side_capacity(capacity);
        Self {
            storage: OwnedBuffer::with_capacity_in(capacity, alloc.clone()),
            buffer: OwnedBuffer::with_capacity_in(side, alloc.clone()),
            erased: OwnedBuffer::with_capacity_in(side, alloc),
            cmp,
            st: Statistic::default(),
        }
    }
}

impl<K, V, C, A: Allocator> AssocVector<K, V, C, A> {
    /// Returns the number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.storage.len() - self.erased.len() + self.buffer.len()
    }

    /// Returns true if the container holds no entry
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn comparator(&self) -> &C {
        &self.cmp
    }

    pub fn allocator(&self) -> &A {
        self.storage.allocator()
    }

    pub fn statistic(&self) -> &Statistic {
        &self.st
    }

    /// Current lengths and capacities of storage, buffer and erased list.
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocVector;
    ///
    /// let mut map = AssocVector::with_capacity(100);
    /// map.insert(2, ());
    /// map.insert(1, ());
    ///
    /// let segments = map.segments();
    /// assert_eq!(segments.storage_len, 1);
    /// assert_eq!(segments.buffer_len, 1);
    /// assert_eq!(segments.buffer_capacity, 10);
    /// assert_eq!(segments.erased_capacity, 10);
    /// ```
    pub fn segments(&self) -> Segments {
        Segments {
            storage_len: self.storage.len(),
            storage_capacity: self.storage.capacity(),
            buffer_len: self.buffer.len(),
            buffer_capacity: self.buffer.capacity(),
            erased_len: self.erased.len(),
            erased_capacity: self.erased.capacity(),
        }
    }

    /// Remove every entry, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.erased.clear();
        self.buffer.clear();
        self.storage.clear();
    }

    pub fn swap(&mut self, other: &mut Self) {
        mem::swap(self, other);
    }

    /// Cursor past the last entry.
    pub fn cursor_end(&self) -> Cursor {
        Cursor::end(self)
    }

    fn is_erased(&self, idx: usize) -> bool {
        self.erased.binary_search(&idx).is_ok()
    }

    fn entry_at(&self, slot: Slot) -> &(K, V) {
        match slot {
            Slot::Storage(s) => &self.storage[s],
            Slot::Buffer(b) => &self.buffer[b],
        }
    }

    fn entry_at_mut(&mut self, slot: Slot) -> &mut (K, V) {
        match slot {
            Slot::Storage(s) => &mut self.storage[s],
            Slot::Buffer(b) => &mut self.buffer[b],
        }
    }
}

impl<K, V, C: Comparator<K>, A: Allocator + Clone> AssocVector<K, V, C, A> {
    /// Insert a key-value pair. Returns false if the key is already present, in which case
    /// nothing changes.
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocVector;
    ///
    /// let mut map = AssocVector::new();
    /// assert!(map.insert(1, "a"));
    /// assert!(!map.insert(1, "b"));
    ///
    /// assert_eq!(map[&1], "a");
    /// ```
    pub fn insert(&mut self, k: K, v: V) -> bool {
        let inserted = match self.search(&k) {
            Ok(_) => false,
            Err(vacant) => {
                self.insert_vacant(vacant, k, v);
                true
            }
        };

        #[cfg(test)]
        self.validate();

        inserted
    }

    /// Insert every pair in order, returns how many were inserted. Later duplicates of a key
    /// are ignored.
    pub fn insert_iter(&mut self, iter: impl IntoIterator<Item = (K, V)>) -> usize {
        iter.into_iter()
            .map(|(k, v)| self.insert(k, v))
            .filter(|inserted| *inserted)
            .count()
    }

    /// Cursor on the entry for `k`, or the end cursor when absent.
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocVector;
    ///
    /// let map = AssocVector::from([(1, 10), (2, 20)]);
    ///
    /// assert_eq!(map.find(&2).value(&map), Some(&20));
    /// assert_eq!(map.find(&3), map.cursor_end());
    /// ```
    pub fn find(&self, k: &K) -> Cursor {
        match self.locate(k) {
            Some(Slot::Storage(s)) => Cursor::at_storage(self, s),
            Some(Slot::Buffer(b)) => Cursor::at_buffer(self, b),
            None => Cursor::end(self),
        }
    }

    /// Returns a reference to the value for `k`.
    pub fn get(&self, k: &K) -> Option<&V> {
        self.get_key_value(k).map(|(_, v)| v)
    }

    /// Returns a mut reference to the value for `k`.
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocVector;
    ///
    /// let mut map = AssocVector::new();
    /// map.insert(1, 2);
    /// *map.get_mut(&1).unwrap() += 1;
    /// assert_eq!(map.get(&1), Some(&3));
    /// ```
    pub fn get_mut(&mut self, k: &K) -> Option<&mut V> {
        let slot = self.locate(k)?;
        Some(&mut self.entry_at_mut(slot).1)
    }

    pub fn get_key_value(&self, k: &K) -> Option<(&K, &V)> {
        let (k, v) = self.entry_at(self.locate(k)?);
        Some((k, v))
    }

    pub fn contains_key(&self, k: &K) -> bool {
        self.locate(k).is_some()
    }

    /// Returns 1 if `k` is present, 0 otherwise.
    pub fn count(&self, k: &K) -> usize {
        usize::from(self.contains_key(k))
    }

    /// Remove the entry for `k`. Returns false if there was none.
    ///
    /// Entries in the middle of storage are only marked as erased, their values are dropped
    /// by the next compaction.
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocVector;
    ///
    /// let mut map = AssocVector::from([(1, "a"), (2, "b"), (3, "c")]);
    /// assert!(map.erase(&2));
    /// assert!(!map.erase(&2));
    ///
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.count(&2), 0);
    /// ```
    pub fn erase(&mut self, k: &K) -> bool {
        let erased = match self.locate(k) {
            Some(slot) => {
                self.erase_slot(slot);
                true
            }
            None => false,
        };

        #[cfg(test)]
        self.validate();

        erased
    }

    /// Remove the entry `cursor` points to.
    ///
    /// # Panics
    /// If the cursor is the end cursor, or doesn't point to a live entry of this container.
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocVector;
    ///
    /// let mut map = AssocVector::from([(1, "a"), (2, "b")]);
    ///
    /// let cursor = map.cursor_first();
    /// map.erase_at(cursor);
    ///
    /// assert_eq!(map.first(), Some((&2, &"b")));
    /// ```
    pub fn erase_at(&mut self, cursor: Cursor) {
        let slot = match cursor.slot() {
            Some(slot) => slot,
            None => panic!("erase_at with the end cursor"),
        };

        match slot {
            Slot::Storage(s) => {
                assert!(
                    s < self.storage.len(),
                    "cursor storage index {s} out of {}",
                    self.storage.len()
                );
                assert!(!self.is_erased(s), "cursor points to an erased entry");
            }
            Slot::Buffer(b) => {
                assert!(
                    b < self.buffer.len(),
                    "cursor buffer index {b} out of {}",
                    self.buffer.len()
                );
            }
        }
        self.erase_slot(slot);

        #[cfg(test)]
        self.validate();
    }

    /// Returns a mut reference to the value for `k`, inserting `f()` first if absent.
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocVector;
    ///
    /// let mut map = AssocVector::new();
    /// *map.get_or_insert_with("a", || 0) += 1;
    /// *map.get_or_insert_with("a", || 0) += 1;
    ///
    /// assert_eq!(map[&"a"], 2);
    /// ```
    pub fn get_or_insert_with(&mut self, k: K, f: impl FnOnce() -> V) -> &mut V {
        let slot = match self.search(&k) {
            Ok(slot) => slot,
            Err(vacant) => self.insert_vacant(vacant, k, f()),
        };

        #[cfg(test)]
        self.validate();

        &mut self.entry_at_mut(slot).1
    }

    /// Returns a mut reference to the value for `k`, inserting `V::default()` first if absent.
    pub fn get_or_default(&mut self, k: K) -> &mut V
    where
        V: Default,
    {
        self.get_or_insert_with(k, V::default)
    }

    /// Overwrite the value for `k`. Returns false, and inserts nothing, if `k` is absent.
    pub fn update(&mut self, k: &K, v: V) -> bool {
        match self.get_mut(k) {
            Some(value) => {
                *value = v;
                true
            }
            None => false,
        }
    }

    /// Fold the buffer and the erased entries into storage.
    ///
    /// Reallocates storage when the live entries no longer fit.
    pub fn merge(&mut self) {
        let required = self.storage.len() - self.erased.len() + self.buffer.len();

        if required > self.storage.capacity() {
            let capacity = consts::grown_capacity(self.storage.capacity())
                .unwrap_or_else(|| capacity_overflow())
                .max(required);
            self.reallocate_merged(capacity);
        } else {
            if !self.erased.is_empty() {
                self.compact();
            }

            if !self.buffer.is_empty() {
                trace!(
                    storage_len = self.storage.len(),
                    buffer_len = self.buffer.len(),
                    capacity = self.storage.capacity(),
                    "merge buffer into storage"
                );
                let cmp = &self.cmp;
                sorted::merge_in_place(&mut self.storage, &mut self.buffer, |a, b| {
                    cmp.compare(&a.0, &b.0)
                });
                self.st.merges += 1;
            }
        }

        #[cfg(test)]
        self.validate();
    }

    /// Grow storage to hold at least `capacity` entries. Does nothing if it already can.
    ///
    /// # Panics
    /// If the allocation fails.
    pub fn reserve(&mut self, capacity: usize) {
        if let Err(err) = self.try_reserve(capacity) {
            panic!("{err}");
        }
    }

    /// Grow storage to hold at least `capacity` entries.
    ///
    /// Whichever of buffer and erased list holds more entries is folded into the new
    /// storage, the other one carries over, and both get the capacity matching the new
    /// storage. Every allocation happens before anything moves, on error the container is
    /// unchanged.
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::{AssocVector, Error};
    ///
    /// let mut map = AssocVector::<u64, u64>::new();
    /// map.try_reserve(1000).unwrap();
    /// assert_eq!(map.segments().storage_capacity, 1000);
    ///
    /// let err = map.try_reserve(usize::MAX).unwrap_err();
    /// assert!(matches!(err, Error::CapacityOverflow { .. }));
    /// assert_eq!(map.segments().storage_capacity, 1000);
    /// ```
    pub fn try_reserve(&mut self, capacity: usize) -> Result<()> {
        if self.storage.capacity() >= capacity {
            return Ok(());
        }

        let fold_buffer = self.buffer.len() > self.erased.len();
        let required = if fold_buffer {
            self.storage.len() + self.buffer.len()
        } else {
            self.storage.len() - self.erased.len()
        };
        let capacity = capacity.max(required);
        let side = consts::side_capacity(capacity);

        let alloc = self.allocator();
        let mut storage = OwnedBuffer::try_with_capacity_in(capacity, alloc.clone())?;
        let mut buffer = OwnedBuffer::try_with_capacity_in(side, alloc.clone())?;
        let mut erased = OwnedBuffer::try_with_capacity_in(side, alloc.clone())?;

        debug!(
            from = self.storage.capacity(),
            to = capacity,
            fold_buffer,
            "reserve storage"
        );

        if fold_buffer {
            let cmp = &self.cmp;
            sorted::merge_into(
                &mut self.storage,
                &mut self.buffer,
                &mut self.erased,
                &mut storage,
                Tombstones::Remap,
                |a, b| cmp.compare(&a.0, &b.0),
            );
            self.erased.move_into_empty(&mut erased);
        } else {
            sorted::compact_into(&mut self.storage, &mut self.erased, &mut storage);
            self.buffer.move_into_empty(&mut buffer);
        }

        self.storage = storage;
        self.buffer = buffer;
        self.erased = erased;
        self.st.reallocations += 1;

        #[cfg(test)]
        self.validate();

        Ok(())
    }

    /// Cursor on the smallest entry, the end cursor if empty.
    pub fn cursor_first(&self) -> Cursor {
        Cursor::first(self)
    }

    /// Cursor on the largest entry, the end cursor if empty.
    pub fn cursor_last(&self) -> Cursor {
        Cursor::last(self)
    }

    /// Iterate entries in key order. Use `rev` for descending order.
    ///
    /// # Examples
    /// ```rust
    /// use assoc_vector::AssocVector;
    ///
    /// let map = AssocVector::from([(2, 'b'), (1, 'a'), (3, 'c')]);
    ///
    /// let values = map.iter().rev().map(|(_, v)| *v).collect::<String>();
    /// assert_eq!(values, "cba");
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V, C, A> {
        Iter::new(self)
    }

    pub fn keys(&self) -> Keys<'_, K, V, C, A> {
        Keys::new(self.iter())
    }

    pub fn values(&self) -> Values<'_, K, V, C, A> {
        Values::new(self.iter())
    }

    /// The entry with the smallest key.
    pub fn first(&self) -> Option<(&K, &V)> {
        self.cursor_first().entry(self)
    }

    /// The entry with the largest key.
    pub fn last(&self) -> Option<(&K, &V)> {
        self.cursor_last().entry(self)
    }

    /// Where `k` lives, or where it goes when absent. Storage is searched once.
    fn search(&self, k: &K) -> Result<Slot, Vacant> {
        if self.is_append(k) {
            return Err(Vacant::Append);
        }

        let cmp = &self.cmp;
        if let Some(s) = sorted::find_in_sorted(&self.storage, |(probe, _)| cmp.compare(probe, k)) {
            // a key lives in one segment only, an erased storage slot means absent
            return match self.erased.binary_search(&s) {
                Ok(erased) => Err(Vacant::Erased { slot: s, erased }),
                Err(_) => Ok(Slot::Storage(s)),
            };
        }

        self.buffer
            .binary_search_by(|(probe, _)| cmp.compare(probe, k))
            .map(Slot::Buffer)
            .map_err(Vacant::Buffer)
    }

    #[inline]
    fn locate(&self, k: &K) -> Option<Slot> {
        self.search(k).ok()
    }

    /// Whether `k` is above every key, so it can be pushed to storage directly.
    fn is_append(&self, k: &K) -> bool {
        let above = |last: Option<&(K, V)>| last.map_or(true, |(last, _)| self.cmp.less(last, k));
        above(self.storage.last()) && above(self.buffer.last())
    }

    /// Insert an entry at the place `search` found for it.
    fn insert_vacant(&mut self, vacant: Vacant, k: K, v: V) -> Slot {
        match vacant {
            Vacant::Append => {
                if self.storage.is_full() {
                    let capacity = consts::grown_capacity(self.storage.capacity())
                        .unwrap_or_else(|| capacity_overflow());
                    self.reserve(capacity);
                }
                self.storage.push((k, v));
                Slot::Storage(self.storage.len() - 1)
            }
            Vacant::Erased { slot, erased } => {
                // the key is still in place, bring it back
                self.erased.remove(erased);
                self.storage[slot].1 = v;
                Slot::Storage(slot)
            }
            Vacant::Buffer(idx) => {
                let idx = if self.buffer.is_full() {
                    self.merge();
                    debug_assert!(self.buffer.is_empty());
                    0
                } else {
                    idx
                };
                self.buffer.insert(idx, (k, v));
                Slot::Buffer(idx)
            }
        }
    }

    fn erase_slot(&mut self, slot: Slot) {
        match slot {
            Slot::Storage(s) => self.erase_storage_at(s),
            Slot::Buffer(b) => drop(self.buffer.remove(b)),
        }
    }

    fn erase_storage_at(&mut self, idx: usize) {
        if idx + 1 == self.storage.len() {
            self.storage.pop();
            // keep the last storage slot live
            while self.erased.last().is_some_and(|&e| e + 1 == self.storage.len()) {
                self.erased.pop();
                self.storage.pop();
            }
            return;
        }

        let inserted = sorted::insert_sorted(&mut self.erased, idx, usize::cmp);
        debug_assert!(inserted.is_ok(), "storage slot {idx} erased twice");

        if self.erased.is_full() {
            self.compact();
        }
    }

    fn compact(&mut self) {
        trace!(
            storage_len = self.storage.len(),
            erased_len = self.erased.len(),
            "compact storage"
        );
        sorted::compact_in_place(&mut self.storage, &mut self.erased);
        self.st.compactions += 1;
    }

    /// Merge storage and buffer into a new storage of `capacity`, dropping erased entries.
    fn reallocate_merged(&mut self, capacity: usize) {
        debug!(
            from = self.storage.capacity(),
            to = capacity,
            "reallocate storage"
        );

        let side = consts::side_capacity(capacity);
        let alloc = self.allocator().clone();
        let mut storage = OwnedBuffer::with_capacity_in(capacity, alloc.clone());

        let cmp = &self.cmp;
        sorted::merge_into(
            &mut self.storage,
            &mut self.buffer,
            &mut self.erased,
            &mut storage,
            Tombstones::Drop,
            |a, b| cmp.compare(&a.0, &b.0),
        );

        self.storage = storage;
        self.buffer = OwnedBuffer::with_capacity_in(side, alloc.clone());
        self.erased = OwnedBuffer::with_capacity_in(side, alloc);
        self.st.reallocations += 1;
    }

    #[cfg(test)]
    fn validate(&self) {
        let cmp = &self.cmp;
        let strictly_sorted =
            |entries: &[(K, V)]| entries.windows(2).all(|w| cmp.less(&w[0].0, &w[1].0));

        assert!(strictly_sorted(self.storage.as_slice()), "storage is not sorted");
        assert!(strictly_sorted(self.buffer.as_slice()), "buffer is not sorted");

        assert!(self.erased.windows(2).all(|w| w[0] < w[1]));
        assert!(self.erased.len() <= self.storage.len());
        assert!(self.erased.iter().all(|&e| e < self.storage.len()));
        assert!(!self.erased.is_full(), "erased list left full");
        assert!(self.buffer.capacity() >= 1);

        if let Some(&last) = self.erased.last() {
            assert!(last + 1 < self.storage.len(), "trailing erased slot");
        }

        for (k, _) in self.buffer.iter() {
            assert!(
                sorted::find_in_sorted(&self.storage, |(probe, _)| cmp.compare(probe, k)).is_none(),
                "key in both storage and buffer"
            );
        }
    }
}

/// Where an absent key goes on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Vacant {
    /// above every key, pushed to storage
    Append,
    /// erased storage slot still holding the key, and its index in the erased list
    Erased { slot: usize, erased: usize },
    /// insertion index in the buffer
    Buffer(usize),
}

#[cold]
fn capacity_overflow() -> ! {
    panic!("capacity overflow");
}

impl<K, V, C: Default> Default for AssocVector<K, V, C> {
    fn default() -> Self {
        Self::with_comparator(C::default())
    }
}

impl<K, V, C: Comparator<K>, A: Allocator + Clone> Index<&K> for AssocVector<K, V, C, A> {
    type Output = V;

    /// # Panics
    /// If `k` is absent.
    fn index(&self, k: &K) -> &V {
        match self.get(k) {
            Some(v) => v,
            None => panic!("no entry found for key"),
        }
    }
}

impl<K, V, C, A> PartialEq for AssocVector<K, V, C, A>
where
    K: PartialEq,
    V: PartialEq,
    C: Comparator<K>,
    A: Allocator + Clone,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Eq, V: Eq, C: Comparator<K>, A: Allocator + Clone> Eq for AssocVector<K, V, C, A> {}

impl<K, V, C, A> fmt::Debug for AssocVector<K, V, C, A>
where
    K: fmt::Debug,
    V: fmt::Debug,
    C: Comparator<K>,
    A: Allocator + Clone,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, C: Comparator<K>, A: Allocator + Clone> Extend<(K, V)> for AssocVector<K, V, C, A> {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        self.insert_iter(iter);
    }
}

impl<K, V, C: Comparator<K> + Default> FromIterator<(K, V)> for AssocVector<K, V, C> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        map.insert_iter(iter);
        map
    }
}

impl<K: Ord, V, const N: usize> From<[(K, V); N]> for AssocVector<K, V> {
    fn from(entries: [(K, V); N]) -> Self {
        Self::from_iter(entries)
    }
}

impl<K, V, C: Comparator<K>, A: Allocator + Clone> IntoIterator for AssocVector<K, V, C, A> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V, A>;

    fn into_iter(self) -> IntoIter<K, V, A> {
        IntoIter::new(self)
    }
}

impl<'a, K, V, C, A> IntoIterator for &'a AssocVector<K, V, C, A>
where
    C: Comparator<K>,
    A: Allocator + Clone,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V, C, A>;

    fn into_iter(self) -> Iter<'a, K, V, C, A> {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::alloc::Layout;
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use std::ptr::NonNull;
    use std::rc::Rc;

    use allocator_api2::alloc::AllocError;
    use rand::seq::SliceRandom;
    use rand::Rng;

    use super::*;
    use crate::Error;

    /// Counts live allocations, and refuses new ones once `max_live` are out.
    #[derive(Clone)]
    struct CountingAlloc {
        live: Rc<Cell<usize>>,
        max_live: Rc<Cell<usize>>,
    }

    impl CountingAlloc {
        fn new() -> Self {
            Self {
                live: Rc::new(Cell::new(0)),
                max_live: Rc::new(Cell::new(usize::MAX)),
            }
        }
    }

    unsafe impl Allocator for CountingAlloc {
        fn allocate(&self, layout: Layout) -> Result<NonNull<[u8]>, AllocError> {
            if self.live.get() >= self.max_live.get() {
                return Err(AllocError);
            }
            let ptr = Global.allocate(layout)?;
            self.live.set(self.live.get() + 1);
            Ok(ptr)
        }

        unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
            self.live.set(self.live.get() - 1);
            unsafe { Global.deallocate(ptr, layout) }
        }
    }

    fn keys_of<V, C: Comparator<i32>>(map: &AssocVector<i32, V, C>) -> Vec<i32> {
        map.keys().copied().collect()
    }

    #[test]
    fn test_insert_out_of_order() {
        let mut map = AssocVector::new();
        for k in [
            10, 9, 8, 16, 17, 18, 7, 6, 5, 4, 11, 12, 13, 3, 2, 1, 0, 14, 15, 19,
        ] {
            assert!(map.insert(k, k.to_string()));
        }

        assert_eq!(map.len(), 20);
        assert_eq!(keys_of(&map), (0..20).collect::<Vec<_>>());
        assert!(map.iter().all(|(k, v)| k.to_string() == *v));
    }

    #[test]
    fn test_erase_after_merge() {
        let mut map = AssocVector::new();
        map.insert(1, 11);
        map.insert(2, 22);
        map.insert(3, 33);
        map.insert(4, 44);
        map.merge();

        assert!(!map.erase(&5));
        assert_eq!(keys_of(&map), vec![1, 2, 3, 4]);

        assert!(map.erase(&4));
        assert_eq!(keys_of(&map), vec![1, 2, 3]);

        assert!(map.erase(&1));
        assert_eq!(keys_of(&map), vec![2, 3]);

        assert!(map.erase(&2));
        assert_eq!(keys_of(&map), vec![3]);

        assert!(map.erase(&3));
        assert!(keys_of(&map).is_empty());
        assert_eq!(map.cursor_first(), map.cursor_end());
        assert!(map.is_empty());
    }

    #[test]
    fn test_find_insert_duality() {
        let mut map = AssocVector::new();
        for k in (0..64).rev() {
            assert!(map.find(&k).is_end());
            assert!(map.insert(k, k));
            assert_eq!(map.find(&k).value(&map), Some(&k));

            assert!(!map.insert(k, -1));
            assert_eq!(map[&k], k);

            *map.get_or_default(k) = k * 2;
            assert_eq!(map.get(&k), Some(&(k * 2)));
        }

        for k in 32..96 {
            assert_eq!(map.contains_key(&k), k < 64);
        }
    }

    #[test]
    fn test_erase_from_every_segment() {
        let mut map = AssocVector::with_capacity(16);
        for k in 0..8 {
            map.insert(k * 10, k);
        }
        // in the buffer
        map.insert(15, 100);
        map.insert(25, 100);
        assert_eq!(map.segments().buffer_len, 2);

        // buffer
        assert!(map.erase(&15));
        // middle of storage, marked
        assert!(map.erase(&30));
        assert_eq!(map.segments().erased_len, 1);
        // last of storage, popped
        assert!(map.erase(&70));
        assert_eq!(map.segments().storage_len, 7);

        for k in [15, 30, 70] {
            assert!(map.find(&k).is_end());
            assert_eq!(map.count(&k), 0);
            assert!(!map.update(&k, 0));
        }
        assert_eq!(keys_of(&map), vec![0, 10, 20, 25, 40, 50, 60]);
        assert_eq!(map.len(), 7);
    }

    #[test]
    fn test_trailing_erased_slots_are_popped() {
        let mut map = AssocVector::with_capacity(16);
        for k in 0..5 {
            map.insert(k, ());
        }
        map.erase(&2);
        map.erase(&3);
        assert_eq!(map.segments().erased_len, 2);

        // 4 is popped, then 3 and 2 become trailing
        map.erase(&4);
        let segments = map.segments();
        assert_eq!(segments.storage_len, 2);
        assert_eq!(segments.erased_len, 0);
        assert_eq!(keys_of(&map), vec![0, 1]);
    }

    #[test]
    fn test_insert_revives_erased_slot() {
        let value = Rc::new(());
        let mut map = AssocVector::with_capacity(16);
        for k in 0..5 {
            map.insert(k, value.clone());
        }
        map.erase(&2);
        assert_eq!(Rc::strong_count(&value), 6);

        assert!(map.insert(2, value.clone()));
        // the erased value is replaced in place
        assert_eq!(Rc::strong_count(&value), 6);
        let segments = map.segments();
        assert_eq!(segments.erased_len, 0);
        assert_eq!(segments.buffer_len, 0);
        assert_eq!(keys_of(&map), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_append_checks_buffer_too() {
        let mut map = AssocVector::with_capacity(16);
        map.insert(1, ());
        map.insert(3, ());
        map.insert(2, ());
        map.erase(&3);
        // storage is [1], the buffer holds 2
        assert!(!map.insert(2, ()));

        map.insert(4, ());
        map.insert(3, ());
        assert_eq!(map.segments().storage_len, 2);
        assert_eq!(keys_of(&map), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_buffer_full_triggers_merge() {
        let mut map = AssocVector::with_capacity(16);
        for k in (0..40).step_by(4) {
            map.insert(k, ());
        }
        let merges = map.statistic().merges;

        // buffer holds 4
        for k in [1, 5, 9, 13, 17] {
            map.insert(k, ());
        }
        assert_eq!(map.statistic().merges, merges + 1);
        assert_eq!(map.segments().buffer_len, 1);
        assert_eq!(map.len(), 15);
    }

    #[test]
    fn test_merge_reallocates_when_full() {
        let mut map = AssocVector::with_capacity(16);
        for k in 0..16 {
            map.insert(k * 2, ());
        }
        map.insert(1, ());
        map.insert(3, ());

        map.merge();
        let segments = map.segments();
        assert_eq!(segments.storage_capacity, 32);
        assert_eq!(segments.storage_len, 18);
        assert_eq!(segments.buffer_capacity, 5);
        assert_eq!(segments.erased_capacity, 5);
        assert_eq!(map.statistic().reallocations, 1);
    }

    #[test]
    fn test_merge_compacts_first() {
        let mut map = AssocVector::with_capacity(16);
        for k in 0..16 {
            map.insert(k * 2, ());
        }
        map.erase(&0);
        map.erase(&2);
        map.insert(1, ());
        map.insert(3, ());

        map.merge();
        let segments = map.segments();
        assert_eq!(segments.storage_capacity, 16);
        assert_eq!(segments.storage_len, 16);
        assert_eq!(segments.erased_len, 0);
        assert_eq!(map.statistic().compactions, 1);
        assert_eq!(map.statistic().reallocations, 0);
        assert_eq!(map.first(), Some((&1, &())));
    }

    #[test]
    fn test_reserve_folds_buffer_and_keeps_erased() {
        let mut map = AssocVector::with_capacity(16);
        for k in 0..10 {
            map.insert(k * 10, k);
        }
        map.erase(&20);
        map.insert(5, 100);
        map.insert(15, 100);

        map.reserve(64);

        let segments = map.segments();
        assert_eq!(segments.storage_capacity, 64);
        assert_eq!(segments.storage_len, 12);
        assert_eq!(segments.buffer_len, 0);
        assert_eq!(segments.buffer_capacity, 8);
        assert_eq!(segments.erased_len, 1);
        assert_eq!(segments.erased_capacity, 8);

        assert!(!map.contains_key(&20));
        assert_eq!(keys_of(&map), vec![0, 5, 10, 15, 30, 40, 50, 60, 70, 80, 90]);
    }

    #[test]
    fn test_reserve_compacts_and_keeps_buffer() {
        let mut map = AssocVector::with_capacity(16);
        for k in 0..10 {
            map.insert(k * 10, k);
        }
        map.erase(&20);
        map.erase(&30);
        map.insert(5, 100);

        map.reserve(64);

        let segments = map.segments();
        assert_eq!(segments.storage_len, 8);
        assert_eq!(segments.erased_len, 0);
        assert_eq!(segments.buffer_len, 1);
        assert_eq!(segments.buffer_capacity, 8);
        assert_eq!(keys_of(&map), vec![0, 5, 10, 40, 50, 60, 70, 80, 90]);

        // already large enough
        map.reserve(10);
        assert_eq!(map.segments(), segments);
    }

    #[test]
    fn test_try_reserve_failure_leaves_map_unchanged() {
        let mut map = AssocVector::new();
        for k in [5, 1, 3] {
            map.insert(k, k);
        }
        let before = map.segments();

        let err = map.try_reserve(usize::MAX).unwrap_err();
        assert!(matches!(err, Error::CapacityOverflow { .. }));
        assert_eq!(map.segments(), before);
        assert_eq!(keys_of(&map), vec![1, 3, 5]);
    }

    #[test]
    fn test_allocator_serves_every_buffer() {
        let alloc = CountingAlloc::new();
        {
            let mut map = AssocVector::with_capacity_comparator_and_allocator(
                16,
                NaturalOrder,
                alloc.clone(),
            );
            // storage, buffer and erased list
            assert_eq!(alloc.live.get(), 3);

            let mut keys = (0..200u64).collect::<Vec<_>>();
            keys.shuffle(&mut rand::thread_rng());
            for k in keys.iter() {
                map.insert(*k, *k);
            }
            for k in keys.iter().take(50) {
                map.erase(k);
            }
            assert!(map.statistic().reallocations > 0);
            // replaced blocks go back to the same allocator
            assert_eq!(alloc.live.get(), 3);

            let cloned = map.clone();
            assert_eq!(alloc.live.get(), 6);
            drop(cloned);

            map.reserve(1000);
            assert_eq!(alloc.live.get(), 3);
            assert_eq!(map.len(), 150);
        }
        assert_eq!(alloc.live.get(), 0);
    }

    #[test]
    fn test_try_reserve_refused_allocation_leaves_map_unchanged() {
        let alloc = CountingAlloc::new();
        let mut map =
            AssocVector::with_capacity_comparator_and_allocator(16, NaturalOrder, alloc.clone());
        for k in 0..10u64 {
            map.insert(k * 10, k);
        }
        map.erase(&20);
        map.insert(5, 100);
        let segments = map.segments();
        let entries = map.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>();

        // the new storage is granted, the new buffer is not
        alloc.max_live.set(4);
        let err = map.try_reserve(1000).unwrap_err();
        assert!(matches!(err, Error::AllocFailed { .. }));
        assert_eq!(alloc.live.get(), 3);
        assert_eq!(map.segments(), segments);
        assert_eq!(map.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(), entries);

        alloc.max_live.set(usize::MAX);
        map.try_reserve(1000).unwrap();
        assert_eq!(map.segments().storage_capacity, 1000);
        assert_eq!(alloc.live.get(), 3);
        assert_eq!(map.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>(), entries);
    }

    #[test]
    fn test_insert_searches_storage_once() {
        let comparisons = Rc::new(Cell::new(0usize));
        let counter = comparisons.clone();
        let mut map = AssocVector::with_capacity_and_comparator(
            1024,
            CompareFn::new(move |a: &u32, b: &u32| {
                counter.set(counter.get() + 1);
                a.cmp(b)
            }),
        );
        for k in 0..1024 {
            map.insert(k * 2, ());
        }
        assert_eq!(map.segments().storage_len, 1024);

        comparisons.set(0);
        let vacant = map.search(&1001).unwrap_err();
        assert_eq!(vacant, Vacant::Buffer(0));
        // one against the storage max, then a single binary search over 1024 keys
        let searched = comparisons.get();
        assert!(searched <= 12, "{searched} comparisons");

        comparisons.set(0);
        map.insert_vacant(vacant, 1001, ());
        assert_eq!(comparisons.get(), 0);
        assert!(map.contains_key(&1001));
    }

    #[test]
    fn test_erase_fills_erased_list_and_compacts() {
        let mut map = AssocVector::with_capacity(16);
        for k in 0..16 {
            map.insert(k * 10, k);
        }
        assert_eq!(map.segments().erased_capacity, 4);

        for k in [10, 30, 50] {
            assert!(map.erase(&k));
        }
        assert_eq!(map.segments().erased_len, 3);
        assert_eq!(map.statistic().compactions, 0);

        // the fourth mark fills the erased list
        assert!(map.erase(&70));
        assert_eq!(map.statistic().compactions, 1);
        let segments = map.segments();
        assert_eq!(segments.erased_len, 0);
        assert_eq!(segments.storage_len, 12);

        let mut expected = (0..16)
            .map(|k| k * 10)
            .filter(|k| ![10, 30, 50, 70].contains(k))
            .collect::<Vec<_>>();
        for k in expected.iter() {
            assert_eq!(map.find(k).value(&map), Some(&(k / 10)));
        }
        for k in [10, 30, 50, 70] {
            assert!(map.find(&k).is_end());
        }

        // positions found after the compaction point at the right slots
        let cursor = map.find(&90);
        map.erase_at(cursor);
        expected.retain(|k| *k != 90);
        assert_eq!(map.segments().erased_len, 1);
        assert!(map.find(&90).is_end());
        assert_eq!(map.find(&100).value(&map), Some(&10));

        assert_eq!(keys_of(&map), expected);
        let mut backward = map.keys().rev().copied().collect::<Vec<_>>();
        backward.reverse();
        assert_eq!(backward, expected);
    }

    #[test]
    fn test_degenerate_capacities() {
        for capacity in [0, 1, 2, 3] {
            let mut map = AssocVector::with_capacity(capacity);
            assert!(map.segments().buffer_capacity >= 1);
            assert!(map.segments().erased_capacity >= 1);

            let mut keys = (0..100).collect::<Vec<_>>();
            keys.shuffle(&mut rand::thread_rng());
            for k in keys.iter() {
                map.insert(*k, ());
            }
            for k in keys.iter().take(50) {
                map.erase(k);
            }
            assert_eq!(map.len(), 50);

            let mut expected = keys[50..].to_vec();
            expected.sort();
            assert_eq!(keys_of(&map), expected);
        }
    }

    #[test]
    fn test_clone_is_independent() {
        let mut map = AssocVector::new();
        for k in [3, 1, 4, 15, 9, 2, 6] {
            map.insert(k, k.to_string());
        }
        map.erase(&4);

        let mut cloned = map.clone();
        assert_eq!(cloned, map);
        assert_eq!(cloned.segments(), map.segments());

        cloned.insert(100, "x".to_string());
        cloned.erase(&1);
        *cloned.get_mut(&3).unwrap() = "y".to_string();

        assert_ne!(cloned, map);
        assert_eq!(keys_of(&map), vec![1, 2, 3, 6, 9, 15]);
        assert_eq!(map[&3], "3");

        let mut assigned = AssocVector::new();
        assigned.clone_from(&map);
        assert_eq!(assigned, map);
    }

    #[test]
    fn test_equality_ignores_layout() {
        let mut a = AssocVector::new();
        let mut b = AssocVector::new();
        for k in 0..20 {
            a.insert(k, ());
        }
        for k in (0..20).rev() {
            b.insert(k, ());
        }
        a.insert(99, ());
        a.erase(&99);

        assert_ne!(a.segments(), b.segments());
        assert_eq!(a, b);
    }

    #[test]
    fn test_clear_and_swap() {
        let mut a = AssocVector::from([(1, 'a'), (2, 'b')]);
        let mut b = AssocVector::from([(3, 'c')]);

        a.swap(&mut b);
        assert_eq!(keys_of(&a), vec![3]);
        assert_eq!(keys_of(&b), vec![1, 2]);

        let capacity = b.segments().storage_capacity;
        b.clear();
        assert!(b.is_empty());
        assert_eq!(b.segments().storage_capacity, capacity);
        assert!(b.first().is_none());
    }

    #[test]
    fn test_reverse_comparator() {
        let mut map = AssocVector::with_comparator(ReverseOrder);
        for k in [4, 8, 1, 6] {
            map.insert(k, ());
        }
        assert_eq!(keys_of(&map), vec![8, 6, 4, 1]);
        assert_eq!(map.last(), Some((&1, &())));
    }

    #[test]
    fn test_reverse_iteration() {
        let mut map = AssocVector::new();
        let mut keys = (0..300).collect::<Vec<_>>();
        keys.shuffle(&mut rand::thread_rng());
        for k in keys.iter() {
            map.insert(*k, ());
        }
        for k in keys.iter().take(100) {
            map.erase(k);
        }

        let forward = keys_of(&map);
        let mut backward = map.keys().rev().copied().collect::<Vec<_>>();
        backward.reverse();
        assert_eq!(forward, backward);

        // walk back with a cursor
        let mut cursor = map.cursor_last();
        let mut walked = vec![];
        while let Some(k) = cursor.key(&map) {
            walked.push(*k);
            if cursor == map.cursor_first() {
                break;
            }
            cursor.move_prev(&map);
        }
        walked.reverse();
        assert_eq!(walked, forward);
    }

    #[test]
    #[should_panic(expected = "no entry found")]
    fn test_index_missing_key_panics() {
        let map = AssocVector::<i32, i32>::new();
        let _ = map[&1];
    }

    #[test]
    #[should_panic(expected = "end cursor")]
    fn test_erase_at_end_panics() {
        let mut map = AssocVector::from([(1, 1)]);
        let end = map.cursor_end();
        map.erase_at(end);
    }

    #[test]
    fn test_drop_counts() {
        let value = Rc::new(());
        {
            let mut map = AssocVector::new();
            let mut keys = (0..500).collect::<Vec<_>>();
            keys.shuffle(&mut rand::thread_rng());
            for k in keys.iter() {
                map.insert(*k, value.clone());
            }
            assert_eq!(Rc::strong_count(&value), 501);

            for k in keys.iter().take(250) {
                map.erase(k);
            }
            map.merge();
            assert_eq!(Rc::strong_count(&value), 251);

            let cloned = map.clone();
            assert_eq!(Rc::strong_count(&value), 501);
            drop(cloned);
        }
        assert_eq!(Rc::strong_count(&value), 1);
    }

    #[test]
    fn test_debug() {
        let map = AssocVector::from([(2, "b"), (1, "a")]);
        assert_eq!(format!("{map:?}"), r#"{1: "a", 2: "b"}"#);
    }

    #[test]
    fn test_against_btree_map() {
        let mut rng = rand::thread_rng();
        let mut map = AssocVector::new();
        let mut expected = BTreeMap::new();

        for _ in 0..2000 {
            let k = rng.gen_range(0..256);
            let v = rng.gen::<u32>();

            match rng.gen_range(0..7) {
                0 | 1 => {
                    let inserted = map.insert(k, v);
                    assert_eq!(inserted, !expected.contains_key(&k));
                    expected.entry(k).or_insert(v);
                }
                2 => {
                    assert_eq!(map.find(&k).value(&map), expected.get(&k));
                }
                3 => {
                    assert_eq!(map.erase(&k), expected.remove(&k).is_some());
                }
                4 => {
                    let cursor = map.find(&k);
                    if !cursor.is_end() {
                        map.erase_at(cursor);
                        expected.remove(&k);
                    }
                }
                5 => {
                    *map.get_or_default(k) = v;
                    expected.insert(k, v);
                }
                _ => {
                    assert_eq!(map.update(&k, v), expected.contains_key(&k));
                    if let Some(e) = expected.get_mut(&k) {
                        *e = v;
                    }
                }
            }

            assert_eq!(map.len(), expected.len());
            assert!(map.iter().eq(expected.iter()));
            assert!(map.iter().rev().eq(expected.iter().rev()));
        }
    }
}
