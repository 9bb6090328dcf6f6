use std::iter::FusedIterator;

use allocator_api2::alloc::{Allocator, Global};

use super::cursor::Cursor;
use super::owned_buffer;
use super::{AssocVector, Comparator};

/// A borrowed iterator over the entries of an `AssocVector`, in key order.
///
/// Walks storage and buffer side by side, skipping erased storage slots. Iterating from
/// the back gives descending order.
pub struct Iter<'a, K, V, C, A: Allocator = Global> {
    map: &'a AssocVector<K, V, C, A>,
    front: Cursor,
    /// the entry `back` points to has been yielded already, or is the end
    back: Cursor,
    len: usize,
}

impl<'a, K, V, C: Comparator<K>, A: Allocator> Iter<'a, K, V, C, A> {
    pub(crate) fn new(map: &'a AssocVector<K, V, C, A>) -> Self {
        Self {
            map,
            front: Cursor::first(map),
            back: Cursor::end(map),
            len: map.len(),
        }
    }
}

impl<'a, K, V, C, A: Allocator> Clone for Iter<'a, K, V, C, A> {
    fn clone(&self) -> Self {
        Self {
            map: self.map,
            front: self.front,
            back: self.back,
            len: self.len,
        }
    }
}

impl<'a, K, V, C: Comparator<K>, A: Allocator> Iterator for Iter<'a, K, V, C, A> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.len, Some(self.len))
    }

    fn next(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        let entry = self.front.entry(self.map)?;
        self.front.move_next(self.map);
        self.len -= 1;
        Some(entry)
    }
}

impl<'a, K, V, C: Comparator<K>, A: Allocator> DoubleEndedIterator for Iter<'a, K, V, C, A> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.len == 0 {
            return None;
        }

        self.back.move_prev(self.map);
        self.len -= 1;
        self.back.entry(self.map)
    }
}

impl<'a, K, V, C: Comparator<K>, A: Allocator> ExactSizeIterator for Iter<'a, K, V, C, A> {}
impl<'a, K, V, C: Comparator<K>, A: Allocator> FusedIterator for Iter<'a, K, V, C, A> {}

/// Iterator over the keys of an `AssocVector`, in order.
pub struct Keys<'a, K, V, C, A: Allocator = Global> {
    inner: Iter<'a, K, V, C, A>,
}

impl<'a, K, V, C, A: Allocator> Keys<'a, K, V, C, A> {
    pub(crate) fn new(inner: Iter<'a, K, V, C, A>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V, C: Comparator<K>, A: Allocator> Iterator for Keys<'a, K, V, C, A> {
    type Item = &'a K;

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    fn next(&mut self) -> Option<&'a K> {
        self.inner.next().map(|(k, _)| k)
    }
}

impl<'a, K, V, C: Comparator<K>, A: Allocator> DoubleEndedIterator for Keys<'a, K, V, C, A> {
    fn next_back(&mut self) -> Option<&'a K> {
        self.inner.next_back().map(|(k, _)| k)
    }
}

impl<'a, K, V, C: Comparator<K>, A: Allocator> ExactSizeIterator for Keys<'a, K, V, C, A> {}
impl<'a, K, V, C: Comparator<K>, A: Allocator> FusedIterator for Keys<'a, K, V, C, A> {}

/// Iterator over the values of an `AssocVector`, in key order.
pub struct Values<'a, K, V, C, A: Allocator = Global> {
    inner: Iter<'a, K, V, C, A>,
}

impl<'a, K, V, C, A: Allocator> Values<'a, K, V, C, A> {
    pub(crate) fn new(inner: Iter<'a, K, V, C, A>) -> Self {
        Self { inner }
    }
}

impl<'a, K, V, C: Comparator<K>, A: Allocator> Iterator for Values<'a, K, V, C, A> {
    type Item = &'a V;

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    fn next(&mut self) -> Option<&'a V> {
        self.inner.next().map(|(_, v)| v)
    }
}

impl<'a, K, V, C: Comparator<K>, A: Allocator> DoubleEndedIterator for Values<'a, K, V, C, A> {
    fn next_back(&mut self) -> Option<&'a V> {
        self.inner.next_back().map(|(_, v)| v)
    }
}

impl<'a, K, V, C: Comparator<K>, A: Allocator> ExactSizeIterator for Values<'a, K, V, C, A> {}
impl<'a, K, V, C: Comparator<K>, A: Allocator> FusedIterator for Values<'a, K, V, C, A> {}

/// Owning iterator, created by `AssocVector::into_iter`.
///
/// The container is merged first, so this is a plain walk over storage.
pub struct IntoIter<K, V, A: Allocator = Global> {
    inner: owned_buffer::IntoIter<(K, V), A>,
}

impl<K, V, A: Allocator + Clone> IntoIter<K, V, A> {
    pub(crate) fn new<C: Comparator<K>>(mut map: AssocVector<K, V, C, A>) -> Self {
        map.merge();
        debug_assert!(map.buffer.is_empty() && map.erased.is_empty());
        Self {
            inner: map.storage.into_iter(),
        }
    }
}

impl<K, V, A: Allocator> Iterator for IntoIter<K, V, A> {
    type Item = (K, V);

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }

    fn next(&mut self) -> Option<(K, V)> {
        self.inner.next()
    }
}

impl<K, V, A: Allocator> DoubleEndedIterator for IntoIter<K, V, A> {
    fn next_back(&mut self) -> Option<(K, V)> {
        self.inner.next_back()
    }
}

impl<K, V, A: Allocator> ExactSizeIterator for IntoIter<K, V, A> {}
impl<K, V, A: Allocator> FusedIterator for IntoIter<K, V, A> {}
