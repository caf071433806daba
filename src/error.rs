//! Errors returned by [`Hasher`](crate::Hasher) and friends.
//!
//! Only invalid arguments and sequencing mistakes are reported as errors.
//! Broken internal invariants (overfilling a chunk, overflowing the merge
//! stack, updating a finalized hasher) are bugs in the caller or in this
//! crate, and they panic instead.

use core::fmt;

/// An error from constructing or finalizing a hasher, or from decoding a
/// [`Hash`](crate::Hash).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    /// A key for the keyed hash function had the wrong length. Keys are never
    /// padded or truncated.
    InvalidKeyLength { expected: usize, actual: usize },
    /// An output length of zero was requested.
    InvalidOutputLength,
    /// The hasher was already finalized. Call
    /// [`reset`](crate::Hasher::reset) before reusing it.
    AlreadyFinalized,
    /// The output buffer could not be allocated.
    OutOfMemory { requested: usize },
    /// A hex string had the wrong length.
    InvalidHexLength { expected: usize, actual: usize },
    /// A hex string contained a byte that isn't a hex digit.
    InvalidHexCharacter { character: char, index: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Error::InvalidKeyLength { expected, actual } => {
                write!(f, "invalid key length: expected {expected} bytes, found {actual}")
            }
            Error::InvalidOutputLength => f.write_str("output length must be at least 1 byte"),
            Error::AlreadyFinalized => f.write_str("hasher already finalized; reset it first"),
            Error::OutOfMemory { requested } => {
                write!(f, "failed to allocate {requested} bytes of output")
            }
            Error::InvalidHexLength { expected, actual } => {
                write!(f, "expected {expected} hex characters, found {actual}")
            }
            Error::InvalidHexCharacter { character, index } => {
                write!(f, "invalid hex character {character:?} at index {index}")
            }
        }
    }
}

impl core::error::Error for Error {}
