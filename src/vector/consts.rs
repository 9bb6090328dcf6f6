/// Storage capacity reserved by `AssocVector::new`
pub(crate) const DEFAULT_CAPACITY: usize = 16;

/// Storage grows by this factor when it runs out of slots.
pub(crate) const GROWTH_FACTOR: usize = 2;

/// Buffer and erased list never go below this, a zero capacity side buffer would
/// make every insert and erase pay a full merge.
pub(crate) const MIN_SIDE_CAPACITY: usize = 1;

/// Capacity for buffer and erased list given storage's capacity, `isqrt(capacity)`.
pub(crate) fn side_capacity(storage_capacity: usize) -> usize {
    isqrt(storage_capacity).max(MIN_SIDE_CAPACITY)
}

/// Next storage capacity, `None` when doubling overflows.
pub(crate) fn grown_capacity(storage_capacity: usize) -> Option<usize> {
    storage_capacity
        .max(1)
        .checked_mul(GROWTH_FACTOR)
        .map(|c| c.max(DEFAULT_CAPACITY))
}

/// Integer square root, truncating.
fn isqrt(n: usize) -> usize {
    if n < 2 {
        return n;
    }

    // float estimate, then fix the rounding for large inputs
    let mut r = (n as f64).sqrt() as usize;
    while r.checked_mul(r).map_or(true, |sq| sq > n) {
        r -= 1;
    }
    while (r + 1).checked_mul(r + 1).map_or(false, |sq| sq <= n) {
        r += 1;
    }
    r
}
