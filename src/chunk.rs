use crate::output::Output;
use crate::{portable, CVWords, Flags, BLOCK_LEN, CHUNK_LEN};
use arrayref::array_ref;
use core::cmp;
use core::fmt;

// The state of one chunk. Full blocks are compressed only once more input
// arrives, because the last block of a chunk gets the CHUNK_END flag and,
// for a single-chunk message, the ROOT flag too.
#[derive(Clone)]
pub(crate) struct ChunkState {
    pub(crate) cv: CVWords,
    pub(crate) chunk_counter: u64,
    pub(crate) buf: [u8; BLOCK_LEN],
    pub(crate) buf_len: u8,
    pub(crate) blocks_compressed: u8,
    pub(crate) flags: Flags,
}

impl ChunkState {
    pub(crate) fn new(key: &CVWords, chunk_counter: u64, flags: Flags) -> Self {
        Self {
            cv: *key,
            chunk_counter,
            buf: [0; BLOCK_LEN],
            buf_len: 0,
            blocks_compressed: 0,
            flags,
        }
    }

    pub(crate) fn len(&self) -> usize {
        BLOCK_LEN * self.blocks_compressed as usize + self.buf_len as usize
    }

    fn fill_buf(&mut self, input: &mut &[u8]) {
        let want = BLOCK_LEN - self.buf_len as usize;
        let take = cmp::min(want, input.len());
        self.buf[self.buf_len as usize..][..take].copy_from_slice(&input[..take]);
        self.buf_len += take as u8;
        *input = &input[take..];
    }

    fn start_flag(&self) -> Flags {
        if self.blocks_compressed == 0 {
            Flags::CHUNK_START
        } else {
            Flags::empty()
        }
    }

    fn compress_block(&mut self, block: &[u8; BLOCK_LEN]) {
        let block_flags = self.flags | self.start_flag();
        let output = portable::compress(
            &self.cv,
            block,
            BLOCK_LEN as u8,
            self.chunk_counter,
            block_flags,
        );
        self.cv = portable::first_8_words(&output);
        self.blocks_compressed += 1;
    }

    // Try to avoid buffering as much as possible, by compressing directly from
    // the input slice when full blocks are available.
    pub(crate) fn update(&mut self, mut input: &[u8]) -> &mut Self {
        debug_assert!(
            self.len() + input.len() <= CHUNK_LEN,
            "chunk {} overfilled: {} + {} bytes",
            self.chunk_counter,
            self.len(),
            input.len(),
        );
        if self.buf_len > 0 {
            self.fill_buf(&mut input);
            if !input.is_empty() {
                debug_assert_eq!(self.buf_len as usize, BLOCK_LEN);
                let block = self.buf;
                self.compress_block(&block);
                self.buf_len = 0;
                self.buf = [0; BLOCK_LEN];
            }
        }

        while input.len() > BLOCK_LEN {
            debug_assert_eq!(self.buf_len, 0);
            self.compress_block(array_ref!(input, 0, BLOCK_LEN));
            input = &input[BLOCK_LEN..];
        }

        self.fill_buf(&mut input);
        debug_assert!(input.is_empty());
        debug_assert!(self.len() <= CHUNK_LEN);
        self
    }

    pub(crate) fn output(&self) -> Output {
        let block_flags = self.flags | self.start_flag() | Flags::CHUNK_END;
        Output {
            input_chaining_value: self.cv,
            block: self.buf,
            block_len: self.buf_len,
            counter: self.chunk_counter,
            flags: block_flags,
        }
    }
}

// Don't derive(Debug), because the state may be secret.
impl fmt::Debug for ChunkState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ChunkState")
            .field("len", &self.len())
            .field("chunk_counter", &self.chunk_counter)
            .field("flags", &self.flags)
            .finish()
    }
}
