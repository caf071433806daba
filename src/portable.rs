use crate::{counter_high, counter_low, CVWords, Flags, BLOCK_LEN, IV, MSG_SCHEDULE, OUT_LEN};
use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};

#[inline(always)]
fn g(state: &mut [u32; 16], a: usize, b: usize, c: usize, d: usize, x: u32, y: u32) {
    state[a] = state[a].wrapping_add(state[b]).wrapping_add(x);
    state[d] = (state[d] ^ state[a]).rotate_right(16);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_right(12);
    state[a] = state[a].wrapping_add(state[b]).wrapping_add(y);
    state[d] = (state[d] ^ state[a]).rotate_right(8);
    state[c] = state[c].wrapping_add(state[d]);
    state[b] = (state[b] ^ state[c]).rotate_right(7);
}

#[inline(always)]
fn round(state: &mut [u32; 16], msg: &[u32; 16], round: usize) {
    // Select the message schedule based on the round.
    let schedule = MSG_SCHEDULE[round];

    // Mix the columns.
    g(state, 0, 4, 8, 12, msg[schedule[0]], msg[schedule[1]]);
    g(state, 1, 5, 9, 13, msg[schedule[2]], msg[schedule[3]]);
    g(state, 2, 6, 10, 14, msg[schedule[4]], msg[schedule[5]]);
    g(state, 3, 7, 11, 15, msg[schedule[6]], msg[schedule[7]]);

    // Mix the diagonals.
    g(state, 0, 5, 10, 15, msg[schedule[8]], msg[schedule[9]]);
    g(state, 1, 6, 11, 12, msg[schedule[10]], msg[schedule[11]]);
    g(state, 2, 7, 8, 13, msg[schedule[12]], msg[schedule[13]]);
    g(state, 3, 4, 9, 14, msg[schedule[14]], msg[schedule[15]]);
}

/// The compression function. Chunk blocks and parent nodes both go through
/// here; they differ only in their flags and in what the 64-byte block holds.
///
/// The low 8 words of the result are the new chaining value. All 16 words are
/// one block of root output when `flags` contains `ROOT`.
pub fn compress(
    cv: &CVWords,
    block: &[u8; BLOCK_LEN],
    block_len: u8,
    counter: u64,
    flags: Flags,
) -> [u32; 16] {
    debug_assert!(block_len as usize <= BLOCK_LEN, "block_len too large");
    let block_words = words_from_le_bytes_64(block);
    let mut state = [
        cv[0],
        cv[1],
        cv[2],
        cv[3],
        cv[4],
        cv[5],
        cv[6],
        cv[7],
        IV[0],
        IV[1],
        IV[2],
        IV[3],
        counter_low(counter),
        counter_high(counter),
        block_len as u32,
        flags.bits() as u32,
    ];

    round(&mut state, &block_words, 0);
    round(&mut state, &block_words, 1);
    round(&mut state, &block_words, 2);
    round(&mut state, &block_words, 3);
    round(&mut state, &block_words, 4);
    round(&mut state, &block_words, 5);
    round(&mut state, &block_words, 6);

    for i in 0..8 {
        state[i] ^= state[i + 8];
        state[i + 8] ^= cv[i];
    }
    state
}

/// The first 8 words of a compression, i.e. the chaining value.
#[inline(always)]
pub fn first_8_words(compression_output: &[u32; 16]) -> CVWords {
    *array_ref!(compression_output, 0, 8)
}

#[inline(always)]
pub fn words_from_le_bytes_32(bytes: &[u8; 32]) -> CVWords {
    let refs = array_refs!(bytes, 4, 4, 4, 4, 4, 4, 4, 4);
    [
        u32::from_le_bytes(*refs.0),
        u32::from_le_bytes(*refs.1),
        u32::from_le_bytes(*refs.2),
        u32::from_le_bytes(*refs.3),
        u32::from_le_bytes(*refs.4),
        u32::from_le_bytes(*refs.5),
        u32::from_le_bytes(*refs.6),
        u32::from_le_bytes(*refs.7),
    ]
}

#[inline(always)]
pub fn words_from_le_bytes_64(bytes: &[u8; BLOCK_LEN]) -> [u32; 16] {
    let (low, high) = array_refs!(bytes, 32, 32);
    let mut words = [0; 16];
    words[..8].copy_from_slice(&words_from_le_bytes_32(low));
    words[8..].copy_from_slice(&words_from_le_bytes_32(high));
    words
}

#[inline(always)]
pub fn le_bytes_from_words_32(words: &CVWords) -> [u8; OUT_LEN] {
    let mut out = [0; OUT_LEN];
    for (word, chunk) in words.iter().zip(out.chunks_exact_mut(4)) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    out
}

#[inline(always)]
pub fn le_bytes_from_words_64(words: &[u32; 16]) -> [u8; BLOCK_LEN] {
    let mut out = [0; BLOCK_LEN];
    {
        let (low, high) = mut_array_refs!(&mut out, 32, 32);
        *low = le_bytes_from_words_32(array_ref!(words, 0, 8));
        *high = le_bytes_from_words_32(array_ref!(words, 8, 8));
    }
    out
}

/// Lay two child chaining values side by side as one parent block.
#[inline(always)]
pub fn parent_block(left: &CVWords, right: &CVWords) -> [u8; BLOCK_LEN] {
    let mut block = [0; BLOCK_LEN];
    *array_mut_ref!(block, 0, OUT_LEN) = le_bytes_from_words_32(left);
    *array_mut_ref!(block, OUT_LEN, OUT_LEN) = le_bytes_from_words_32(right);
    block
}
