use std::fmt;
use std::iter::FusedIterator;
use std::mem::{ManuallyDrop, MaybeUninit};
use std::ops::{Deref, DerefMut};
use std::ptr;
use std::slice;

use allocator_api2::alloc::{Allocator, Global};
use allocator_api2::vec::Vec;

use super::utils;
use crate::error::{Error, Result};

/// A contiguous, fixed capacity sequence.
///
/// Unlike `Vec`, the buffer never grows on its own. `push`/`insert` on a full buffer
/// panics, growth is an explicit `regrow` which allocates a new block from the same
/// allocator, moves the elements over and frees the old one. Slots in `len..capacity` are
/// allocated but hold no value, the algorithms in `sorted` write into them directly.
pub struct OwnedBuffer<T, A: Allocator = Global> {
    /// always `capacity` long, only `slots[..len]` are initialized
    slots: Vec<MaybeUninit<T>, A>,
    len: usize,
}

impl<T> OwnedBuffer<T> {
    /// Allocate a buffer with exactly `capacity` slots.
    ///
    /// # Panics
    /// If the allocation fails or `capacity` overflows.
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_in(capacity, Global)
    }

    /// Allocate a buffer with exactly `capacity` slots, reporting allocation failure.
    pub fn try_with_capacity(capacity: usize) -> Result<Self> {
        Self::try_with_capacity_in(capacity, Global)
    }
}

impl<T, A: Allocator> OwnedBuffer<T, A> {
    /// Allocate a buffer with exactly `capacity` slots from `alloc`.
    ///
    /// # Panics
    /// If the allocation fails or `capacity` overflows.
    pub fn with_capacity_in(capacity: usize, alloc: A) -> Self {
        let mut slots = Vec::with_capacity_in(capacity, alloc);
        slots.resize_with(capacity, MaybeUninit::uninit);
        Self { slots, len: 0 }
    }

    /// Same as `with_capacity_in`, but reports allocation failure.
    pub fn try_with_capacity_in(capacity: usize, alloc: A) -> Result<Self> {
        let mut slots = Vec::new_in(alloc);
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| Error::from_try_reserve::<T>(capacity))?;
        slots.resize_with(capacity, MaybeUninit::uninit);
        Ok(Self { slots, len: 0 })
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        self.slots.allocator()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: slots[..len] are initialized
        unsafe { slice::from_raw_parts(self.slots.as_ptr() as *const T, self.len) }
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        // SAFETY: slots[..len] are initialized
        unsafe { slice::from_raw_parts_mut(self.slots.as_mut_ptr() as *mut T, self.len) }
    }

    /// Append to the end.
    ///
    /// # Panics
    /// If the buffer is full.
    pub fn push(&mut self, value: T) {
        assert!(!self.is_full(), "push into a full buffer of {}", self.capacity());
        self.slots[self.len].write(value);
        self.len += 1;
    }

    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        // SAFETY: the slot was initialized and is now outside of len
        Some(unsafe { self.slots[self.len].assume_init_read() })
    }

    /// Insert at `idx`, shifting the tail right by one.
    ///
    /// # Panics
    /// If the buffer is full or `idx > len`.
    pub fn insert(&mut self, idx: usize, value: T) {
        assert!(!self.is_full(), "insert into a full buffer of {}", self.capacity());
        assert!(idx <= self.len, "insert index {idx} out of {}", self.len);
        let new_len = self.len + 1;
        unsafe { utils::slice_insert(&mut self.slots[..new_len], idx, value) };
        self.len = new_len;
    }

    /// Remove at `idx`, shifting the tail left by one.
    ///
    /// # Panics
    /// If `idx >= len`.
    pub fn remove(&mut self, idx: usize) -> T {
        assert!(idx < self.len, "remove index {idx} out of {}", self.len);
        let value = unsafe { utils::slice_remove(&mut self.slots[..self.len], idx) };
        self.len -= 1;
        value
    }

    pub fn truncate(&mut self, len: usize) {
        if len >= self.len {
            return;
        }
        let old_len = self.len;
        // shrink first, a panicking drop then leaks the rest instead of double dropping
        self.len = len;
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(
                self.slots.as_mut_ptr().add(len) as *mut T,
                old_len - len,
            ));
        }
    }

    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Move every element into the empty `dst`, which must be large enough.
    pub(crate) fn move_into_empty(&mut self, dst: &mut Self) {
        assert!(dst.is_empty() && dst.capacity() >= self.len);
        let len = self.len;
        utils::move_to_slice(&mut self.slots[..len], &mut dst.slots[..len]);
        self.len = 0;
        dst.len = len;
    }

    /// All slots, initialized or not.
    #[inline]
    pub(crate) fn slots_mut(&mut self) -> &mut [MaybeUninit<T>] {
        &mut self.slots[..]
    }

    /// # Safety
    /// `slots[..len]` must be initialized and `len <= capacity`.
    #[inline]
    pub(crate) unsafe fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.len = len;
    }
}

impl<T, A: Allocator + Clone> OwnedBuffer<T, A> {
    /// Move the elements into a new block of `capacity` slots.
    ///
    /// # Panics
    /// If `capacity < len` or the allocation fails.
    pub fn regrow(&mut self, capacity: usize) {
        assert!(capacity >= self.len, "regrow below len");
        let mut new_buffer = Self::with_capacity_in(capacity, self.allocator().clone());
        self.move_into_empty(&mut new_buffer);
        *self = new_buffer;
    }

    /// Same as `regrow`, but reports allocation failure. On error `self` is unchanged.
    pub fn try_regrow(&mut self, capacity: usize) -> Result<()> {
        assert!(capacity >= self.len, "regrow below len");
        let mut new_buffer = Self::try_with_capacity_in(capacity, self.allocator().clone())?;
        self.move_into_empty(&mut new_buffer);
        *self = new_buffer;
        Ok(())
    }
}

impl<T, A: Allocator> Drop for OwnedBuffer<T, A> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Clone, A: Allocator + Clone> Clone for OwnedBuffer<T, A> {
    /// Deep copy with the same capacity, from the same allocator.
    fn clone(&self) -> Self {
        let mut new_buffer = Self::with_capacity_in(self.capacity(), self.allocator().clone());
        for item in self.iter() {
            new_buffer.push(item.clone());
        }
        new_buffer
    }
}

impl<T> Default for OwnedBuffer<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T: fmt::Debug, A: Allocator> fmt::Debug for OwnedBuffer<T, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T, A: Allocator> Deref for OwnedBuffer<T, A> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &[T] {
        self.as_slice()
    }
}

impl<T, A: Allocator> DerefMut for OwnedBuffer<T, A> {
    #[inline]
    fn deref_mut(&mut self) -> &mut [T] {
        self.as_mut_slice()
    }
}

impl<T, A: Allocator> IntoIterator for OwnedBuffer<T, A> {
    type Item = T;
    type IntoIter = IntoIter<T, A>;

    fn into_iter(self) -> IntoIter<T, A> {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never dropped, the slots are moved out exactly once
        let slots = unsafe { ptr::read(&this.slots) };
        IntoIter {
            slots,
            front: 0,
            back: this.len,
        }
    }
}

/// Owning iterator over an `OwnedBuffer`.
pub struct IntoIter<T, A: Allocator = Global> {
    slots: Vec<MaybeUninit<T>, A>,
    /// slots[front..back] are still initialized
    front: usize,
    back: usize,
}

impl<T, A: Allocator> Iterator for IntoIter<T, A> {
    type Item = T;

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }

    fn next(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        let idx = self.front;
        self.front += 1;
        Some(unsafe { self.slots[idx].assume_init_read() })
    }
}

impl<T, A: Allocator> DoubleEndedIterator for IntoIter<T, A> {
    fn next_back(&mut self) -> Option<T> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(unsafe { self.slots[self.back].assume_init_read() })
    }
}

impl<T, A: Allocator> ExactSizeIterator for IntoIter<T, A> {}
impl<T, A: Allocator> FusedIterator for IntoIter<T, A> {}

impl<T, A: Allocator> Drop for IntoIter<T, A> {
    fn drop(&mut self) {
        // drop all the remaining items
        while self.next().is_some() {}
    }
}
