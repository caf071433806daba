use crate::{portable, CVWords, Error, Flags, Hash, BLOCK_LEN, OUT_LEN};
use alloc::vec::Vec;
use core::cmp;
use core::fmt;

// Each chunk or parent node can produce either an 8-word chaining value or, by
// setting the ROOT flag, any number of final output bytes. The Output struct
// captures the state just prior to choosing between those two possibilities.
#[derive(Clone)]
pub(crate) struct Output {
    pub(crate) input_chaining_value: CVWords,
    pub(crate) block: [u8; BLOCK_LEN],
    pub(crate) block_len: u8,
    pub(crate) counter: u64,
    pub(crate) flags: Flags,
}

impl Output {
    pub(crate) fn chaining_value(&self) -> CVWords {
        portable::first_8_words(&portable::compress(
            &self.input_chaining_value,
            &self.block,
            self.block_len,
            self.counter,
            self.flags,
        ))
    }

    // One 64-byte block of root output. The root node is re-evaluated with the
    // output block counter in place of its chunk counter, which is always 0
    // for a root.
    pub(crate) fn root_output_block(&self, output_block_counter: u64) -> [u8; BLOCK_LEN] {
        debug_assert_eq!(self.counter, 0, "root nodes start at counter 0");
        let words = portable::compress(
            &self.input_chaining_value,
            &self.block,
            self.block_len,
            output_block_counter,
            self.flags | Flags::ROOT,
        );
        portable::le_bytes_from_words_64(&words)
    }

    pub(crate) fn root_hash(&self) -> Hash {
        let block = self.root_output_block(0);
        let mut bytes = [0; OUT_LEN];
        bytes.copy_from_slice(&block[..OUT_LEN]);
        Hash::from(bytes)
    }
}

pub(crate) fn zeroed_vec(len: usize) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    out.try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory { requested: len })?;
    out.resize(len, 0);
    Ok(out)
}

/// An incremental reader for extended output, returned by
/// [`Hasher::finalize_xof`](crate::Hasher::finalize_xof).
///
/// Shorter outputs are prefixes of longer ones, and explicitly requesting a
/// short output is equivalent to truncating the default-length output.
///
/// Each 64-byte block of output is an independent re-evaluation of the root
/// node, so the reader can start at any position without computing the bytes
/// before it. The total length of output is 2<sup>64</sup> blocks.
///
/// When the `std` Cargo feature is enabled, `OutputReader` implements
/// [`std::io::Read`] and [`std::io::Seek`].
#[derive(Clone)]
pub struct OutputReader {
    inner: Output,
    block_counter: u64,
    position_within_block: u8,
}

impl OutputReader {
    pub(crate) fn new(inner: Output) -> Self {
        Self {
            inner,
            block_counter: 0,
            position_within_block: 0,
        }
    }

    /// Fill a buffer with output bytes and advance the position of the
    /// `OutputReader`.
    ///
    /// The position wraps around after 2<sup>64</sup> blocks, which is never
    /// reached in practice.
    pub fn fill(&mut self, mut buf: &mut [u8]) {
        while !buf.is_empty() {
            let block = self.inner.root_output_block(self.block_counter);
            let output_bytes = &block[self.position_within_block as usize..];
            let take = cmp::min(buf.len(), output_bytes.len());
            buf[..take].copy_from_slice(&output_bytes[..take]);
            buf = &mut buf[take..];
            self.position_within_block += take as u8;
            if self.position_within_block == BLOCK_LEN as u8 {
                self.block_counter = self.block_counter.wrapping_add(1);
                self.position_within_block = 0;
            }
        }
    }

    /// Return `len` output bytes starting at byte `offset` of the output
    /// stream, without moving this reader's position.
    ///
    /// Only the output blocks covering `offset..offset + len` are computed.
    /// A `len` of zero returns [`Error::InvalidOutputLength`].
    pub fn read_at(&self, offset: u64, len: usize) -> Result<Vec<u8>, Error> {
        if len == 0 {
            return Err(Error::InvalidOutputLength);
        }
        let mut out = zeroed_vec(len)?;
        let mut reader = self.clone();
        reader.set_position(offset);
        reader.fill(&mut out);
        Ok(out)
    }

    /// Return the current read position in the output stream. This is
    /// initially zero, increases with every call to [`fill`](Self::fill), and
    /// can be set with [`set_position`](Self::set_position).
    pub fn position(&self) -> u64 {
        self.block_counter
            .wrapping_mul(BLOCK_LEN as u64)
            .wrapping_add(self.position_within_block as u64)
    }

    /// Seek to a new read position in the output stream.
    pub fn set_position(&mut self, position: u64) {
        self.position_within_block = (position % BLOCK_LEN as u64) as u8;
        self.block_counter = position / BLOCK_LEN as u64;
    }
}

// Don't derive(Debug), because the state may be secret.
impl fmt::Debug for OutputReader {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("OutputReader")
            .field("position", &self.position())
            .finish()
    }
}
