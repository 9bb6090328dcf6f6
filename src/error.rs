use thiserror::Error;

/// Errors returned by the fallible growth operations.
///
/// Everything else in the crate either succeeds or panics on a broken precondition.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The requested slot count does not fit in the address space.
    #[error("capacity overflow while requesting {requested} slots")]
    CapacityOverflow {
        /// Number of slots requested
        requested: usize,
    },

    /// The allocator refused the request.
    #[error("allocation of {requested} slots failed")]
    AllocFailed {
        /// Number of slots requested
        requested: usize,
    },
}

impl Error {
    pub(crate) fn from_try_reserve<T>(requested: usize) -> Self {
        let fits = std::mem::size_of::<T>()
            .checked_mul(requested)
            .map_or(false, |bytes| bytes <= isize::MAX as usize);

        if fits {
            Error::AllocFailed { requested }
        } else {
            Error::CapacityOverflow { requested }
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
