//! An incremental, tree-structured hash function with extendable output.
//!
//! Input is split into 1024-byte chunks. Each chunk is compressed block by
//! block into a chaining value, and chaining values are merged pairwise into
//! parent nodes, forming a binary Merkle tree whose shape depends only on the
//! total input length. The root node can produce any number of output bytes.
//! The construction and its constants are those of BLAKE3, and outputs match
//! the BLAKE3 test vectors in all three modes.
//!
//! # Examples
//!
//! ```
//! # fn main() -> Result<(), treehash::Error> {
//! // Hash an input all at once.
//! let hash1 = treehash::hash(b"foobarbaz");
//!
//! // Hash an input incrementally.
//! let mut hasher = treehash::Hasher::new();
//! hasher.update(b"foo");
//! hasher.update(b"bar");
//! hasher.update(b"baz");
//! let hash2 = hasher.finalize_hash()?;
//! assert_eq!(hash1, hash2);
//!
//! // Extended output. finalize() returns any number of bytes.
//! let mut hasher = treehash::Hasher::new();
//! hasher.update(b"foobarbaz");
//! let output = hasher.finalize(1000)?;
//! assert_eq!(hash1.as_bytes(), &output[..32]);
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod chunk;
mod error;
#[doc(hidden)]
pub mod guts;
#[cfg(feature = "std")]
mod io;
mod mode;
mod output;
mod portable;
#[cfg(test)]
mod test;
#[cfg(feature = "traits-preview")]
pub mod traits;
mod tree;

use arrayvec::ArrayString;
use chunk::ChunkState;
use core::cmp;
use core::fmt;
use core::str::FromStr;
use output::Output;
use tracing::{debug, trace};
use tree::MergeStack;

pub use error::Error;
pub use mode::{Domain, Mode};
pub use output::OutputReader;

/// The default number of bytes in a hash, 32.
pub const OUT_LEN: usize = 32;

/// The number of bytes in a key, 32.
pub const KEY_LEN: usize = 32;

/// The number of bytes in a compression block, 64.
pub const BLOCK_LEN: usize = 64;

/// The number of bytes in a chunk, 1024. A chunk is 16 blocks.
pub const CHUNK_LEN: usize = 1024;

// A message of at most 2^64 - 1 bytes has fewer than 2^54 complete chunks, so
// the merge stack never holds more than 54 subtrees.
pub(crate) const MAX_DEPTH: usize = 54;

pub(crate) type CVWords = [u32; 8];
pub(crate) type CVBytes = [u8; 32];

const IV: &CVWords = &[
    0x6A09E667, 0xBB67AE85, 0x3C6EF372, 0xA54FF53A, 0x510E527F, 0x9B05688C, 0x1F83D9AB, 0x5BE0CD19,
];

const MSG_SCHEDULE: [[usize; 16]; 7] = [
    [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15],
    [2, 6, 3, 10, 7, 0, 4, 13, 1, 11, 12, 5, 9, 14, 15, 8],
    [3, 4, 10, 12, 13, 2, 7, 14, 6, 5, 9, 0, 11, 15, 8, 1],
    [10, 7, 12, 9, 14, 3, 13, 15, 4, 0, 11, 2, 5, 8, 1, 6],
    [12, 13, 9, 11, 15, 10, 14, 8, 7, 2, 5, 3, 0, 1, 6, 4],
    [9, 14, 11, 5, 8, 12, 15, 1, 13, 3, 0, 10, 2, 6, 4, 7],
    [11, 15, 5, 0, 1, 9, 8, 6, 14, 10, 2, 12, 3, 4, 7, 13],
];

// These are the internal flags that we use to domain separate root/non-root,
// chunk/parent, and chunk beginning/middle/end. They go in the last word of
// the compression state.
bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub(crate) struct Flags: u8 {
        const CHUNK_START = 1 << 0;
        const CHUNK_END = 1 << 1;
        const PARENT = 1 << 2;
        const ROOT = 1 << 3;
        const KEYED_HASH = 1 << 4;
        const DERIVE_KEY_CONTEXT = 1 << 5;
        const DERIVE_KEY_MATERIAL = 1 << 6;
    }
}

#[inline(always)]
fn counter_low(counter: u64) -> u32 {
    counter as u32
}

#[inline(always)]
fn counter_high(counter: u64) -> u32 {
    (counter >> 32) as u32
}

/// An output of the default size, 32 bytes, which implements constant-time
/// equality.
///
/// `Hash` implements [`From`] and [`Into`] for `[u8; 32]`, and it provides
/// [`from_hex`](Hash::from_hex) and [`to_hex`](Hash::to_hex) for hexadecimal
/// encoding.
#[derive(Clone, Copy, Hash)]
pub struct Hash(CVBytes);

impl Hash {
    /// The raw bytes of the `Hash`.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; OUT_LEN] {
        &self.0
    }

    /// Create a `Hash` from its raw bytes representation.
    pub const fn from_bytes(bytes: [u8; OUT_LEN]) -> Self {
        Self(bytes)
    }

    /// Encode a `Hash` in lowercase hexadecimal.
    ///
    /// The returned [`ArrayString`] is a fixed size and doesn't allocate
    /// memory on the heap.
    pub fn to_hex(&self) -> ArrayString<{ 2 * OUT_LEN }> {
        let mut s = ArrayString::new();
        let table = b"0123456789abcdef";
        for &b in self.0.iter() {
            s.push(table[(b >> 4) as usize] as char);
            s.push(table[(b & 0xf) as usize] as char);
        }
        s
    }

    /// Decode a `Hash` from hexadecimal. Both uppercase and lowercase ASCII
    /// bytes are supported.
    ///
    /// Any byte outside the ranges `'0'...'9'`, `'a'...'f'`, and `'A'...'F'`
    /// results in an error. An input length other than 64 also results in an
    /// error.
    pub fn from_hex(hex: impl AsRef<[u8]>) -> Result<Self, Error> {
        fn hex_val(byte: u8, index: usize) -> Result<u8, Error> {
            match byte {
                b'A'..=b'F' => Ok(byte - b'A' + 10),
                b'a'..=b'f' => Ok(byte - b'a' + 10),
                b'0'..=b'9' => Ok(byte - b'0'),
                _ => Err(Error::InvalidHexCharacter {
                    character: byte as char,
                    index,
                }),
            }
        }
        let hex_bytes: &[u8] = hex.as_ref();
        if hex_bytes.len() != OUT_LEN * 2 {
            return Err(Error::InvalidHexLength {
                expected: OUT_LEN * 2,
                actual: hex_bytes.len(),
            });
        }
        let mut hash_bytes: [u8; OUT_LEN] = [0; OUT_LEN];
        for (i, byte) in hash_bytes.iter_mut().enumerate() {
            *byte = 16 * hex_val(hex_bytes[2 * i], 2 * i)? + hex_val(hex_bytes[2 * i + 1], 2 * i + 1)?;
        }
        Ok(Hash::from(hash_bytes))
    }
}

impl From<[u8; OUT_LEN]> for Hash {
    #[inline]
    fn from(bytes: [u8; OUT_LEN]) -> Self {
        Self::from_bytes(bytes)
    }
}

impl From<Hash> for [u8; OUT_LEN] {
    #[inline]
    fn from(hash: Hash) -> Self {
        hash.0
    }
}

impl FromStr for Hash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Hash::from_hex(s)
    }
}

/// This implementation is constant-time.
impl PartialEq for Hash {
    #[inline]
    fn eq(&self, other: &Hash) -> bool {
        constant_time_eq::constant_time_eq_32(&self.0, &other.0)
    }
}

/// This implementation is constant-time.
impl PartialEq<[u8; OUT_LEN]> for Hash {
    #[inline]
    fn eq(&self, other: &[u8; OUT_LEN]) -> bool {
        constant_time_eq::constant_time_eq_32(&self.0, other)
    }
}

/// This implementation is constant-time if the target is 32 bytes long.
impl PartialEq<[u8]> for Hash {
    #[inline]
    fn eq(&self, other: &[u8]) -> bool {
        constant_time_eq::constant_time_eq(&self.0, other)
    }
}

impl Eq for Hash {}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_tuple("Hash").field(&self.to_hex()).finish()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Accepting,
    Finalized,
}

/// An incremental hash state that can accept any number of writes.
///
/// A `Hasher` starts out accepting input. One of the `finalize` methods moves
/// it to the finalized state, after which it only accepts [`reset`]. Calling
/// [`update`] on a finalized hasher panics, and finalizing twice returns
/// [`Error::AlreadyFinalized`].
///
/// When the `traits-preview` Cargo feature is enabled, this type implements
/// several commonly used traits from the
/// [`digest`](https://crates.io/crates/digest) and
/// [`crypto_mac`](https://crates.io/crates/crypto-mac) crates.
///
/// When the `std` Cargo feature is enabled, this type implements the
/// [`std::io::Write`] trait.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // Hash an input incrementally.
/// let mut hasher = treehash::Hasher::new();
/// hasher.update(b"foo");
/// hasher.update(b"bar");
/// hasher.update(b"baz");
/// assert_eq!(hasher.finalize_hash()?, treehash::hash(b"foobarbaz"));
///
/// // Extended output. OutputReader also implements Read and Seek.
/// hasher.reset();
/// hasher.update(b"foobarbaz");
/// let mut output = [0; 1000];
/// let mut output_reader = hasher.finalize_xof()?;
/// output_reader.fill(&mut output);
/// assert_eq!(&output[..32], treehash::hash(b"foobarbaz").as_bytes());
/// # Ok(())
/// # }
/// ```
///
/// [`reset`]: Hasher::reset
/// [`update`]: Hasher::update
#[derive(Clone)]
pub struct Hasher {
    key: CVWords,
    domain: Domain,
    chunk_state: ChunkState,
    stack: MergeStack,
    state: State,
}

impl Hasher {
    pub(crate) fn new_internal(key: &CVWords, domain: Domain) -> Self {
        trace!(?domain, "new hasher");
        Self {
            key: *key,
            domain,
            chunk_state: ChunkState::new(key, 0, domain.flags()),
            stack: MergeStack::new(),
            state: State::Accepting,
        }
    }

    /// Construct a new `Hasher` for the regular hash function.
    pub fn new() -> Self {
        Self::new_internal(IV, Domain::Hash)
    }

    /// Construct a new `Hasher` for the keyed hash function. See
    /// [`keyed_hash`].
    pub fn new_keyed(key: &[u8; KEY_LEN]) -> Self {
        let key_words = portable::words_from_le_bytes_32(key);
        Self::new_internal(&key_words, Domain::KeyedHash)
    }

    /// Construct a new `Hasher` for the keyed hash function from a key of
    /// unchecked length.
    ///
    /// Keys are never padded or truncated. A key that isn't exactly
    /// [`KEY_LEN`] bytes returns [`Error::InvalidKeyLength`].
    pub fn new_keyed_from_slice(key: &[u8]) -> Result<Self, Error> {
        Self::with_mode(Mode::KeyedHash(key))
    }

    /// Construct a new `Hasher` for the key derivation function. See
    /// [`derive_key`].
    pub fn new_derive_key(context: &str) -> Self {
        let context_key = mode::context_key_words(context);
        Self::new_internal(&context_key, Domain::DeriveKeyMaterial)
    }

    /// Construct a new `Hasher` for any [`Mode`].
    ///
    /// The mode and its key are fixed for the lifetime of the hasher,
    /// including across [`reset`](Hasher::reset).
    pub fn with_mode(mode: Mode<'_>) -> Result<Self, Error> {
        let (key, domain) = mode.key_words()?;
        Ok(Self::new_internal(&key, domain))
    }

    /// The domain this hasher was constructed for.
    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Whether one of the `finalize` methods has been called since the hasher
    /// was created or last reset.
    pub fn is_finalized(&self) -> bool {
        self.state == State::Finalized
    }

    /// Reset the `Hasher` to its initial state, keeping its key and mode.
    ///
    /// This is functionally the same as overwriting the `Hasher` with a new
    /// one, using the same key or context string if any.
    pub fn reset(&mut self) -> &mut Self {
        self.chunk_state = ChunkState::new(&self.key, 0, self.domain.flags());
        self.stack.clear();
        self.state = State::Accepting;
        trace!(domain = ?self.domain, "hasher reset");
        self
    }

    /// The total number of input bytes so far.
    pub fn count(&self) -> u64 {
        self.chunk_state.chunk_counter * CHUNK_LEN as u64 + self.chunk_state.len() as u64
    }

    /// Add input bytes to the hash state. You can call this any number of
    /// times, and the result doesn't depend on how the input is split up.
    ///
    /// # Panics
    ///
    /// Panics if the hasher has been finalized and not reset since.
    pub fn update(&mut self, mut input: &[u8]) -> &mut Self {
        assert_eq!(
            self.state,
            State::Accepting,
            "update() called on a finalized Hasher without reset()",
        );
        while !input.is_empty() {
            // A full chunk stays open until more input shows that it isn't
            // the last one, because the last chunk might be the root.
            if self.chunk_state.len() == CHUNK_LEN {
                let chunk_cv = self.chunk_state.output().chaining_value();
                let total_chunks = self.chunk_state.chunk_counter + 1;
                self.stack
                    .push_chunk_cv(&chunk_cv, total_chunks, &self.key, self.domain.flags());
                self.chunk_state = ChunkState::new(&self.key, total_chunks, self.domain.flags());
            }

            let want = CHUNK_LEN - self.chunk_state.len();
            let take = cmp::min(want, input.len());
            self.chunk_state.update(&input[..take]);
            input = &input[take..];
        }
        self
    }

    // Drain the merge stack into the root node. This consumes the stack, so
    // callers must only do it once per reset.
    pub(crate) fn final_output(&mut self) -> Output {
        debug!(
            count = self.count(),
            stack_depth = self.stack.len(),
            domain = ?self.domain,
            "finalizing"
        );
        let chunk_output = self.chunk_state.output();
        self.stack
            .drain_into_root(chunk_output, &self.key, self.domain.flags())
    }

    /// Finalize the hash state and return an [`OutputReader`], which can
    /// supply any number of output bytes.
    ///
    /// This moves the hasher to the finalized state. Calling any `finalize`
    /// method again before [`reset`](Hasher::reset) returns
    /// [`Error::AlreadyFinalized`].
    pub fn finalize_xof(&mut self) -> Result<OutputReader, Error> {
        if self.is_finalized() {
            return Err(Error::AlreadyFinalized);
        }
        let output = self.final_output();
        self.state = State::Finalized;
        Ok(OutputReader::new(output))
    }

    /// Finalize the hash state and return `out_len` output bytes.
    ///
    /// An `out_len` of zero returns [`Error::InvalidOutputLength`] and leaves
    /// the hasher untouched. The same goes for an output buffer that can't be
    /// allocated, which returns [`Error::OutOfMemory`].
    pub fn finalize(&mut self, out_len: usize) -> Result<alloc::vec::Vec<u8>, Error> {
        if out_len == 0 {
            return Err(Error::InvalidOutputLength);
        }
        if self.is_finalized() {
            return Err(Error::AlreadyFinalized);
        }
        let mut out = output::zeroed_vec(out_len)?;
        self.finalize_xof()?.fill(&mut out);
        Ok(out)
    }

    /// Finalize the hash state and fill `out` with output bytes.
    pub fn finalize_into(&mut self, out: &mut [u8]) -> Result<(), Error> {
        if out.is_empty() {
            return Err(Error::InvalidOutputLength);
        }
        self.finalize_xof()?.fill(out);
        Ok(())
    }

    /// Finalize the hash state and return the [`Hash`] of the input, which
    /// is the first [`OUT_LEN`] bytes of the extended output.
    pub fn finalize_hash(&mut self) -> Result<Hash, Error> {
        let mut bytes = [0; OUT_LEN];
        self.finalize_xof()?.fill(&mut bytes);
        Ok(Hash(bytes))
    }

    #[cfg(test)]
    pub(crate) fn stack_sizes(&self) -> alloc::vec::Vec<u64> {
        self.stack.sizes().collect()
    }
}

// Don't derive(Debug), because the state may be secret.
impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Hasher")
            .field("domain", &self.domain)
            .field("count", &self.count())
            .field("stack_depth", &self.stack.len())
            .field("state", &self.state)
            .finish()
    }
}

impl Default for Hasher {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// The default hash function.
///
/// For an incremental version that accepts multiple writes, see
/// [`Hasher::update`]. For output sizes other than 32 bytes, see
/// [`Hasher::finalize`] and [`OutputReader`].
pub fn hash(input: &[u8]) -> Hash {
    Hasher::new().update(input).final_output().root_hash()
}

/// The keyed hash function.
///
/// This is suitable for use as a message authentication code, for example to
/// replace an HMAC instance. In that use case, the constant-time equality
/// checking provided by [`Hash`] is almost always a security requirement,
/// and callers need to be careful not to compare MACs as raw bytes.
pub fn keyed_hash(key: &[u8; KEY_LEN], input: &[u8]) -> Hash {
    Hasher::new_keyed(key).update(input).final_output().root_hash()
}

/// The key derivation function.
///
/// Given cryptographic key material of any length and a context string of
/// any length, this function outputs a 32-byte derived subkey. The context
/// string should be hardcoded, globally unique, and application-specific,
/// for example `"example.com 2019-12-25 16:18:03 session tokens v1"`.
///
/// The context string is hashed first, in its own domain, and the result
/// keys a second hash over the key material. For output sizes other than 32
/// bytes, see [`Hasher::new_derive_key`] and [`Hasher::finalize`].
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; OUT_LEN] {
    Hasher::new_derive_key(context)
        .update(key_material)
        .final_output()
        .root_hash()
        .into()
}
