//! Algorithms over sorted `OwnedBuffer`s.
//!
//! Every function takes the comparator as a closure over whole elements, the container
//! passes one that compares entry keys.

use std::cmp::Ordering;

use allocator_api2::alloc::Allocator;

use super::owned_buffer::OwnedBuffer;
use super::utils;

/// What `merge_into` does with storage slots listed in the erased positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Tombstones {
    /// Drop the erased slots, the erased list ends up empty.
    Drop,
    /// Carry the erased slots over and rewrite the erased list with their new positions.
    Remap,
}

/// Binary search, returns the index of the element `f` reports as `Equal`.
#[inline]
pub(crate) fn find_in_sorted<T>(items: &[T], f: impl FnMut(&T) -> Ordering) -> Option<usize> {
    items.binary_search_by(f).ok()
}

/// Insert `value` at its sorted position.
///
/// Returns `Ok(idx)` when inserted, `Err((idx, value))` when an equal element already
/// sits at `idx`, in which case the buffer is untouched.
///
/// # Panics
/// If the buffer is full.
pub(crate) fn insert_sorted<T, A: Allocator>(
    buffer: &mut OwnedBuffer<T, A>,
    value: T,
    mut cmp: impl FnMut(&T, &T) -> Ordering,
) -> Result<usize, (usize, T)> {
    match buffer.binary_search_by(|probe| cmp(probe, &value)) {
        Ok(idx) => Err((idx, value)),
        Err(idx) => {
            buffer.insert(idx, value);
            Ok(idx)
        }
    }
}

/// Merge `buffer` into `storage`'s trailing free slots, walking both from the back so
/// an element is always written at or after the slot it is read from.
///
/// `buffer` ends up empty with its capacity kept.
///
/// # Panics
/// If `storage.len() + buffer.len() > storage.capacity()`.
pub(crate) fn merge_in_place<T, A: Allocator>(
    storage: &mut OwnedBuffer<T, A>,
    buffer: &mut OwnedBuffer<T, A>,
    mut cmp: impl FnMut(&T, &T) -> Ordering,
) {
    let storage_len = storage.len();
    let buffer_len = buffer.len();
    assert!(
        storage_len + buffer_len <= storage.capacity(),
        "merge of {buffer_len} into {storage_len} overflows capacity {}",
        storage.capacity()
    );

    if buffer_len == 0 {
        return;
    }

    // lengths are restored after the merge, a panicking comparator leaks instead of double dropping
    unsafe {
        storage.set_len(0);
        buffer.set_len(0);
    }

    let dst = storage.slots_mut();
    let src = buffer.slots_mut();

    // invariant: write == from_storage + from_buffer
    let mut from_storage = storage_len;
    let mut from_buffer = buffer_len;
    let mut write = storage_len + buffer_len;

    while from_buffer > 0 {
        write -= 1;

        let storage_is_greater = from_storage > 0
            && unsafe {
                cmp(
                    dst[from_storage - 1].assume_init_ref(),
                    src[from_buffer - 1].assume_init_ref(),
                )
            } == Ordering::Greater;

        if storage_is_greater {
            from_storage -= 1;
            unsafe { utils::slot_move(dst, from_storage, write) };
        } else {
            from_buffer -= 1;
            dst[write].write(unsafe { src[from_buffer].assume_init_read() });
        }
    }

    // the storage prefix is already in place
    debug_assert_eq!(from_storage, write);

    unsafe { storage.set_len(storage_len + buffer_len) };
}

/// Physically remove the slots listed in `erased` (sorted ascending) in one left to right
/// pass, dropping them. `erased` ends up empty.
pub(crate) fn compact_in_place<T, A: Allocator>(
    storage: &mut OwnedBuffer<T, A>,
    erased: &mut OwnedBuffer<usize, A>,
) {
    let len = storage.len();
    assert!(erased.len() <= len, "more erased positions than elements");

    if erased.is_empty() {
        return;
    }

    unsafe { storage.set_len(0) };

    let slots = storage.slots_mut();
    let mut write = 0;
    let mut next_erased = 0;

    for read in 0..len {
        if next_erased < erased.len() && erased[next_erased] == read {
            next_erased += 1;
            unsafe { slots[read].assume_init_drop() };
        } else {
            unsafe { utils::slot_move(slots, read, write) };
            write += 1;
        }
    }

    unsafe { storage.set_len(write) };

    assert_eq!(
        next_erased,
        erased.len(),
        "erased positions must be sorted, unique and inside storage"
    );
    erased.clear();
}

/// Same as `compact_in_place`, but moves the survivors into the empty `dst`.
/// `storage` and `erased` end up empty.
pub(crate) fn compact_into<T, A: Allocator>(
    storage: &mut OwnedBuffer<T, A>,
    erased: &mut OwnedBuffer<usize, A>,
    dst: &mut OwnedBuffer<T, A>,
) {
    let len = storage.len();
    assert!(erased.len() <= len, "more erased positions than elements");
    assert!(dst.is_empty() && dst.capacity() >= len - erased.len());

    unsafe { storage.set_len(0) };

    let src = storage.slots_mut();
    let mut next_erased = 0;

    for read in 0..len {
        let item = unsafe { src[read].assume_init_read() };
        if next_erased < erased.len() && erased[next_erased] == read {
            next_erased += 1;
            drop(item);
        } else {
            dst.push(item);
        }
    }

    assert_eq!(
        next_erased,
        erased.len(),
        "erased positions must be sorted, unique and inside storage"
    );
    erased.clear();
}

/// Forward merge of `storage` and `buffer` into the empty `dst`. Erased storage slots are
/// handled according to `tombstones`. `storage` and `buffer` end up empty.
///
/// # Panics
/// If `dst` is not empty or too small for the result.
pub(crate) fn merge_into<T, A: Allocator>(
    storage: &mut OwnedBuffer<T, A>,
    buffer: &mut OwnedBuffer<T, A>,
    erased: &mut OwnedBuffer<usize, A>,
    dst: &mut OwnedBuffer<T, A>,
    tombstones: Tombstones,
    mut cmp: impl FnMut(&T, &T) -> Ordering,
) {
    let storage_len = storage.len();
    let buffer_len = buffer.len();
    assert!(erased.len() <= storage_len, "more erased positions than elements");

    let kept = match tombstones {
        Tombstones::Drop => storage_len - erased.len(),
        Tombstones::Remap => storage_len,
    } + buffer_len;
    assert!(
        dst.is_empty() && dst.capacity() >= kept,
        "merge destination can't hold {kept} elements"
    );

    unsafe {
        storage.set_len(0);
        buffer.set_len(0);
    }

    let s = storage.slots_mut();
    let b = buffer.slots_mut();

    let mut from_storage = 0;
    let mut from_buffer = 0;
    let mut next_erased = 0;

    while from_storage < storage_len || from_buffer < buffer_len {
        let take_storage = from_buffer == buffer_len
            || (from_storage < storage_len
                && unsafe {
                    cmp(
                        s[from_storage].assume_init_ref(),
                        b[from_buffer].assume_init_ref(),
                    )
                } == Ordering::Less);

        if !take_storage {
            dst.push(unsafe { b[from_buffer].assume_init_read() });
            from_buffer += 1;
            continue;
        }

        let item = unsafe { s[from_storage].assume_init_read() };
        if next_erased < erased.len() && erased[next_erased] == from_storage {
            match tombstones {
                Tombstones::Drop => drop(item),
                Tombstones::Remap => {
                    erased[next_erased] = dst.len();
                    dst.push(item);
                }
            }
            next_erased += 1;
        } else {
            dst.push(item);
        }
        from_storage += 1;
    }

    assert_eq!(
        next_erased,
        erased.len(),
        "erased positions must be sorted, unique and inside storage"
    );
    if tombstones == Tombstones::Drop {
        erased.clear();
    }
}
