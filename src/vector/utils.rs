use std::mem::MaybeUninit;
use std::ptr;

/// Copied from std btree node.rs
///
/// Inserts a value into a slice of initialized elements followed by one uninitialized element.
///
/// # Safety
/// The slice has more than `idx` elements, and all but the last one are initialized.
pub(crate) unsafe fn slice_insert<T>(slots: &mut [MaybeUninit<T>], idx: usize, val: T) {
    unsafe {
        let len = slots.len();
        debug_assert!(len > idx);
        let slots_ptr = slots.as_mut_ptr();
        if len > idx + 1 {
            ptr::copy(slots_ptr.add(idx), slots_ptr.add(idx + 1), len - idx - 1);
        }
        (*slots_ptr.add(idx)).write(val);
    }
}

/// Copied from std btree node.rs
///
/// Removes and returns a value from a slice of all initialized elements, leaving behind one
/// trailing uninitialized element.
///
/// # Safety
/// The slice has more than `idx` elements, all initialized.
pub(crate) unsafe fn slice_remove<T>(slots: &mut [MaybeUninit<T>], idx: usize) -> T {
    unsafe {
        let len = slots.len();
        debug_assert!(idx < len);
        let slots_ptr = slots.as_mut_ptr();
        let ret = (*slots_ptr.add(idx)).assume_init_read();
        ptr::copy(slots_ptr.add(idx + 1), slots_ptr.add(idx), len - idx - 1);
        ret
    }
}

/// Moves the value in slot `from` to slot `to`, leaving `from` logically uninitialized.
/// Moving a slot onto itself is a no-op.
///
/// # Safety
/// Both indices are in bounds and `from` is initialized. If `to` holds a value it is
/// overwritten without being dropped.
#[inline]
pub(crate) unsafe fn slot_move<T>(slots: &mut [MaybeUninit<T>], from: usize, to: usize) {
    debug_assert!(from < slots.len() && to < slots.len());
    if from != to {
        unsafe {
            let slots_ptr = slots.as_mut_ptr();
            ptr::copy_nonoverlapping(slots_ptr.add(from), slots_ptr.add(to), 1);
        }
    }
}

/// Copied from std btree node.rs
///
/// Moves all values from a slice of initialized elements to a slice
/// of uninitialized elements, leaving behind `src` as all uninitialized.
/// Works like `dst.copy_from_slice(src)` but does not require `T` to be `Copy`.
pub(crate) fn move_to_slice<T>(src: &mut [MaybeUninit<T>], dst: &mut [MaybeUninit<T>]) {
    assert!(src.len() == dst.len());
    unsafe {
        ptr::copy_nonoverlapping(src.as_ptr(), dst.as_mut_ptr(), src.len());
    }
}
