use crate::output::Output;
use crate::{portable, CVWords, Flags, BLOCK_LEN, MAX_DEPTH};
use arrayvec::ArrayVec;
use tracing::trace;

// A parent node is an ordinary compression whose block is the two child
// chaining values side by side. Parents always use counter 0 and a full
// block length.
pub(crate) fn parent_output(
    left_child_cv: &CVWords,
    right_child_cv: &CVWords,
    key: &CVWords,
    flags: Flags,
) -> Output {
    Output {
        input_chaining_value: *key,
        block: portable::parent_block(left_child_cv, right_child_cv),
        block_len: BLOCK_LEN as u8,
        counter: 0,
        flags: flags | Flags::PARENT,
    }
}

pub(crate) fn parent_cv(
    left_child_cv: &CVWords,
    right_child_cv: &CVWords,
    key: &CVWords,
    flags: Flags,
) -> CVWords {
    parent_output(left_child_cv, right_child_cv, key, flags).chaining_value()
}

#[derive(Clone, Copy, Debug)]
struct Subtree {
    cv: CVWords,
    chunks: u64,
}

// The chaining values of completed subtrees along the right edge of the tree,
// largest at the bottom. Between updates the subtree sizes are exactly the set
// bits of the number of completed chunks, so the stack never holds two
// subtrees of the same size, and the tree shape depends only on the input
// length. The key and flags belong to the owning `Hasher` and are passed in.
#[derive(Clone, Default)]
pub(crate) struct MergeStack {
    entries: ArrayVec<Subtree, MAX_DEPTH>,
}

impl MergeStack {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn sizes(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|entry| entry.chunks)
    }

    // Push the chaining value of a completed chunk. `total_chunks` counts the
    // completed chunks including this one. Each trailing zero bit of that
    // count is a carry in binary addition, and each carry is one merge of the
    // top of the stack with the new subtree. Returns the number of merges.
    pub(crate) fn push_chunk_cv(
        &mut self,
        chunk_cv: &CVWords,
        total_chunks: u64,
        key: &CVWords,
        flags: Flags,
    ) -> u32 {
        debug_assert_ne!(total_chunks, 0, "chunk counts start at 1");
        let merges = total_chunks.trailing_zeros();
        let mut node = Subtree {
            cv: *chunk_cv,
            chunks: 1,
        };
        for _ in 0..merges {
            let Some(left) = self.entries.pop() else {
                unreachable!("merge stack underflow at chunk {total_chunks}");
            };
            debug_assert_eq!(left.chunks, node.chunks, "merging unequal subtrees");
            node = Subtree {
                cv: parent_cv(&left.cv, &node.cv, key, flags),
                chunks: left.chunks + node.chunks,
            };
        }
        if self.entries.try_push(node).is_err() {
            panic!("merge stack overflow: more than {MAX_DEPTH} pending subtrees");
        }
        debug_assert_eq!(self.entries.len(), total_chunks.count_ones() as usize);
        trace!(
            total_chunks,
            merges,
            depth = self.entries.len(),
            "pushed chunk chaining value"
        );
        merges
    }

    // Fold the stack into the last chunk's output, from the top (the most
    // recent, smallest subtree) down to the bottom. The result is the root
    // node, not yet compressed. Its ROOT flag is added when output is read.
    pub(crate) fn drain_into_root(
        &mut self,
        mut output: Output,
        key: &CVWords,
        flags: Flags,
    ) -> Output {
        while let Some(left) = self.entries.pop() {
            output = parent_output(&left.cv, &output.chaining_value(), key, flags);
        }
        output
    }
}
