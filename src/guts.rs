//! This undocumented and unstable module is for callers that need to build the
//! tree themselves and work with chunk and parent chaining values directly, for
//! example to verify a message one chunk at a time. There might be breaking
//! changes to this module between patch versions.

use crate::{portable, tree, Hash, IV};

pub use crate::{BLOCK_LEN, CHUNK_LEN};

/// The state of a single chunk at a given position in the tree.
#[derive(Clone, Debug)]
pub struct ChunkState(crate::chunk::ChunkState);

impl ChunkState {
    // Currently this type only supports the regular hash mode.
    pub fn new(chunk_counter: u64) -> Self {
        Self(crate::chunk::ChunkState::new(
            IV,
            chunk_counter,
            crate::Domain::Hash.flags(),
        ))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.len() == 0
    }

    /// Add input to the chunk.
    ///
    /// # Panics
    ///
    /// Panics if the chunk would hold more than `CHUNK_LEN` bytes.
    #[inline]
    pub fn update(&mut self, input: &[u8]) -> &mut Self {
        assert!(
            self.0.len() + input.len() <= CHUNK_LEN,
            "a chunk holds at most {CHUNK_LEN} bytes",
        );
        self.0.update(input);
        self
    }

    /// The chunk's chaining value, or its root hash if the chunk is the whole
    /// message. A root chunk must have a chunk counter of 0.
    pub fn finalize(&self, is_root: bool) -> Hash {
        let output = self.0.output();
        if is_root {
            assert_eq!(self.0.chunk_counter, 0, "only chunk 0 can be the root");
            output.root_hash()
        } else {
            Hash::from(portable::le_bytes_from_words_32(&output.chaining_value()))
        }
    }
}

/// Merge two child chaining values into their parent's chaining value, or into
/// the root hash if the parent is the root of the whole tree.
pub fn parent_cv(left_child: &Hash, right_child: &Hash, is_root: bool) -> Hash {
    let left = portable::words_from_le_bytes_32(left_child.as_bytes());
    let right = portable::words_from_le_bytes_32(right_child.as_bytes());
    let output = tree::parent_output(&left, &right, IV, crate::Domain::Hash.flags());
    if is_root {
        output.root_hash()
    } else {
        Hash::from(portable::le_bytes_from_words_32(&output.chaining_value()))
    }
}
