use core::fmt;

/// Errors reported when constructing or resizing a [`HashTable`].
///
/// Lookups never fail: a missing key is reported as `None`.
///
/// [`HashTable`]: crate::HashTable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The requested bucket count was zero or not a power of two, or did not
    /// fit a 32-bit bucket mask.
    InvalidCapacity {
        /// The bucket count that was asked for.
        requested: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidCapacity { requested } => {
                write!(
                    f,
                    "bucket count must be a non-zero power of two, got {}",
                    requested
                )
            }
        }
    }
}

impl core::error::Error for Error {}
