//! A sorted associative container backed by arrays.
//!
//! `AssocVector` keeps its entries in a sorted array, plus a small sorted insertion buffer and
//! a list of lazily erased positions. Both side buffers hold at most `√capacity` entries and
//! are folded into the main array when full. This makes ordered iteration and increasing
//! inserts as cheap as on a `Vec`, while random inserts and erases stay amortized O(√n).
//!
//! # Examples
//! ```rust
//! use assoc_vector::AssocVector;
//!
//! let mut map = AssocVector::new();
//! for k in [5, 3, 8, 1] {
//!     map.insert(k, k * 10);
//! }
//! map.erase(&3);
//!
//! let entries = map.iter().map(|(k, v)| (*k, *v)).collect::<Vec<_>>();
//! assert_eq!(entries, vec![(1, 10), (5, 50), (8, 80)]);
//!
//! *map.get_or_default(2) += 1;
//! assert_eq!(map[&2], 1);
//! ```

mod error;
pub use error::*;

mod set;
pub use set::*;

// core container impl
pub mod vector;
pub use vector::{
    Allocator, AssocVector, Comparator, CompareFn, Cursor, Global, NaturalOrder, OwnedBuffer,
    ReverseOrder, Segments, Statistic,
};
