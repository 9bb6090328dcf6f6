use allocator_api2::alloc::Allocator;

use super::{AssocVector, Comparator};

/// Which segment the cursor's current entry lives in, with its index there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Storage(usize),
    Buffer(usize),
}

/// `Cursor` points to an entry of an `AssocVector`, or to the end. Unlike `Iter`, it doesn't
/// borrow the container, every method takes the container as an argument, and it can move in
/// both directions.
///
/// A cursor stays valid until the container is mutated. The only exception is
/// `AssocVector::erase_at`, which consumes the cursor. Using a cursor with a container it
/// wasn't created from, or after a mutation, yields unspecified entries or panics, but never
/// undefined behavior.
///
/// Two cursors compare equal when they point to the same entry, or both to the end.
///
/// # Examples
/// ```rust
/// use assoc_vector::AssocVector;
///
/// let map = AssocVector::from([(1, "a"), (2, "b"), (3, "c")]);
///
/// let mut cursor = map.find(&2);
/// assert_eq!(cursor.key(&map), Some(&2));
///
/// cursor.move_next(&map);
/// assert_eq!(cursor.entry(&map), Some((&3, &"c")));
///
/// cursor.move_next(&map);
/// assert!(cursor.is_end());
/// assert_eq!(cursor, map.cursor_end());
///
/// cursor.move_prev(&map);
/// cursor.move_prev(&map);
/// assert_eq!(cursor.value(&map), Some(&"b"));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Cursor {
    /// Next storage index to consider. When `current` is a storage slot, this is it.
    storage: usize,
    /// Next buffer index to consider. When `current` is a buffer slot, this is it.
    buffer: usize,
    /// Number of erased positions below `storage`.
    erased: usize,
    current: Option<Slot>,
}

impl Cursor {
    /// Cursor on the smallest entry, or the end when the container is empty.
    pub(crate) fn first<K, V, C: Comparator<K>, A: Allocator>(
        map: &AssocVector<K, V, C, A>,
    ) -> Self {
        Self::resolve_forward(map, 0, 0, 0)
    }

    /// Cursor past the largest entry.
    pub(crate) fn end<K, V, C, A: Allocator>(map: &AssocVector<K, V, C, A>) -> Self {
        Self {
            storage: map.storage.len(),
            buffer: map.buffer.len(),
            erased: map.erased.len(),
            current: None,
        }
    }

    /// Cursor on the largest entry, or the end when the container is empty.
    pub(crate) fn last<K, V, C: Comparator<K>, A: Allocator>(
        map: &AssocVector<K, V, C, A>,
    ) -> Self {
        let mut cursor = Self::end(map);
        cursor.move_prev(map);
        cursor
    }

    /// Cursor on a live storage entry.
    pub(crate) fn at_storage<K, V, C: Comparator<K>, A: Allocator>(
        map: &AssocVector<K, V, C, A>,
        idx: usize,
    ) -> Self {
        let k = &map.storage[idx].0;
        Self {
            storage: idx,
            buffer: map
                .buffer
                .partition_point(|(probe, _)| map.cmp.less(probe, k)),
            erased: map.erased.partition_point(|&p| p < idx),
            current: Some(Slot::Storage(idx)),
        }
    }

    /// Cursor on a buffer entry.
    pub(crate) fn at_buffer<K, V, C: Comparator<K>, A: Allocator>(
        map: &AssocVector<K, V, C, A>,
        idx: usize,
    ) -> Self {
        let k = &map.buffer[idx].0;
        let storage = map
            .storage
            .partition_point(|(probe, _)| map.cmp.less(probe, k));
        Self {
            storage,
            buffer: idx,
            erased: map.erased.partition_point(|&p| p < storage),
            current: Some(Slot::Buffer(idx)),
        }
    }

    /// Skip erased storage slots from `storage` on, then pick the smaller of the two heads.
    fn resolve_forward<K, V, C: Comparator<K>, A: Allocator>(
        map: &AssocVector<K, V, C, A>,
        mut storage: usize,
        buffer: usize,
        mut erased: usize,
    ) -> Self {
        let positions = map.erased.as_slice();
        while storage < map.storage.len() && positions.get(erased) == Some(&storage) {
            storage += 1;
            erased += 1;
        }

        let current = match (map.storage.get(storage), map.buffer.get(buffer)) {
            (None, None) => None,
            (Some(_), None) => Some(Slot::Storage(storage)),
            (None, Some(_)) => Some(Slot::Buffer(buffer)),
            (Some(s), Some(b)) => {
                if map.cmp.less(&s.0, &b.0) {
                    Some(Slot::Storage(storage))
                } else {
                    Some(Slot::Buffer(buffer))
                }
            }
        };

        Self {
            storage,
            buffer,
            erased,
            current,
        }
    }

    /// Move to the next entry. At the end, the cursor stays at the end.
    pub fn move_next<K, V, C: Comparator<K>, A: Allocator>(
        &mut self,
        map: &AssocVector<K, V, C, A>,
    ) {
        *self = match self.current {
            None => return,
            Some(Slot::Storage(s)) => Self::resolve_forward(map, s + 1, self.buffer, self.erased),
            Some(Slot::Buffer(b)) => Self::resolve_forward(map, self.storage, b + 1, self.erased),
        };
    }

    /// Move to the previous entry. On the first entry, the cursor stays where it is.
    pub fn move_prev<K, V, C: Comparator<K>, A: Allocator>(
        &mut self,
        map: &AssocVector<K, V, C, A>,
    ) {
        let positions = map.erased.as_slice();

        // last live storage slot below `self.storage`
        let mut storage = self.storage;
        let mut erased = self.erased;
        while storage > 0 && erased > 0 && positions[erased - 1] == storage - 1 {
            storage -= 1;
            erased -= 1;
        }

        let from_storage = storage.checked_sub(1).map(|s| (s, &map.storage[s]));
        let from_buffer = self.buffer.checked_sub(1).map(|b| (b, &map.buffer[b]));

        let take_storage = match (from_storage, from_buffer) {
            (None, None) => return,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (Some((_, s)), Some((_, b))) => !map.cmp.less(&s.0, &b.0),
        };

        *self = if take_storage {
            let s = storage - 1;
            Self {
                storage: s,
                buffer: self.buffer,
                erased,
                current: Some(Slot::Storage(s)),
            }
        } else {
            let b = self.buffer - 1;
            Self {
                storage,
                buffer: b,
                erased,
                current: Some(Slot::Buffer(b)),
            }
        };
    }

    /// Whether the cursor points past the last entry.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    #[inline]
    pub(crate) fn slot(&self) -> Option<Slot> {
        self.current
    }

    pub fn entry<'a, K, V, C, A: Allocator>(
        &self,
        map: &'a AssocVector<K, V, C, A>,
    ) -> Option<(&'a K, &'a V)> {
        let (k, v) = match self.current? {
            Slot::Storage(s) => map.storage.get(s)?,
            Slot::Buffer(b) => map.buffer.get(b)?,
        };
        Some((k, v))
    }

    pub fn key<'a, K, V, C, A: Allocator>(
        &self,
        map: &'a AssocVector<K, V, C, A>,
    ) -> Option<&'a K> {
        self.entry(map).map(|(k, _)| k)
    }

    pub fn value<'a, K, V, C, A: Allocator>(
        &self,
        map: &'a AssocVector<K, V, C, A>,
    ) -> Option<&'a V> {
        self.entry(map).map(|(_, v)| v)
    }

    /// Mutable access to the value the cursor points to.
    pub fn value_mut<'a, K, V, C, A: Allocator>(
        &self,
        map: &'a mut AssocVector<K, V, C, A>,
    ) -> Option<&'a mut V> {
        let entry = match self.current? {
            Slot::Storage(s) => map.storage.get_mut(s)?,
            Slot::Buffer(b) => map.buffer.get_mut(b)?,
        };
        Some(&mut entry.1)
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl Eq for Cursor {}
