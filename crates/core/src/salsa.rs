//! Salsa20/8 core transform
//!
//! Blocks inside a lane are kept in the "SIMD shuffled" word order used by
//! the yescrypt reference code: stored word `k` holds logical word
//! `5k mod 16`. The shuffle is invisible to Salsa20/8 itself but the S-box
//! transform reads stored words pairwise, so the layout is part of the
//! algorithm.

/// Words in one 64-byte block
pub const BLOCK_WORDS: usize = 16;

/// One 64-byte block as little-endian words
pub type Block = [u32; BLOCK_WORDS];

/// Stored position `k` holds logical word `SHUFFLE[k]`
const SHUFFLE: [usize; BLOCK_WORDS] = [0, 5, 10, 15, 4, 9, 14, 3, 8, 13, 2, 7, 12, 1, 6, 11];

/// Salsa20/8 core on a block in logical word order: 4 double rounds, then
/// the input is added back word-wise.
pub fn salsa20_8(block: &mut Block) {
    let mut x = *block;
    double_rounds(&mut x);
    for (b, x) in block.iter_mut().zip(x.iter()) {
        *b = b.wrapping_add(*x);
    }
}

/// Salsa20/8 core on a block stored in shuffled order
#[inline(always)]
pub(crate) fn salsa20_8_shuffled(block: &mut [u32]) {
    debug_assert_eq!(block.len(), BLOCK_WORDS);

    let mut x = [0u32; BLOCK_WORDS];
    for (stored, &logical) in SHUFFLE.iter().enumerate() {
        x[logical] = block[stored];
    }
    double_rounds(&mut x);
    for (stored, &logical) in SHUFFLE.iter().enumerate() {
        block[stored] = block[stored].wrapping_add(x[logical]);
    }
}

/// Convert a block array from logical to shuffled word order
pub(crate) fn shuffle(src: &[u32], dst: &mut [u32]) {
    debug_assert_eq!(src.len(), dst.len());
    for (src, dst) in src
        .chunks_exact(BLOCK_WORDS)
        .zip(dst.chunks_exact_mut(BLOCK_WORDS))
    {
        for (stored, &logical) in SHUFFLE.iter().enumerate() {
            dst[stored] = src[logical];
        }
    }
}

/// Convert a block array from shuffled back to logical word order
pub(crate) fn unshuffle(src: &[u32], dst: &mut [u32]) {
    debug_assert_eq!(src.len(), dst.len());
    for (src, dst) in src
        .chunks_exact(BLOCK_WORDS)
        .zip(dst.chunks_exact_mut(BLOCK_WORDS))
    {
        for (stored, &logical) in SHUFFLE.iter().enumerate() {
            dst[logical] = src[stored];
        }
    }
}

#[inline(always)]
fn double_rounds(x: &mut Block) {
    for _ in 0..4 {
        // Columns
        quarter_round(x, 0, 4, 8, 12);
        quarter_round(x, 5, 9, 13, 1);
        quarter_round(x, 10, 14, 2, 6);
        quarter_round(x, 15, 3, 7, 11);

        // Rows
        quarter_round(x, 0, 1, 2, 3);
        quarter_round(x, 5, 6, 7, 4);
        quarter_round(x, 10, 11, 8, 9);
        quarter_round(x, 15, 12, 13, 14);
    }
}

#[inline(always)]
fn quarter_round(x: &mut Block, a: usize, b: usize, c: usize, d: usize) {
    x[b] ^= x[a].wrapping_add(x[d]).rotate_left(7);
    x[c] ^= x[b].wrapping_add(x[a]).rotate_left(9);
    x[d] ^= x[c].wrapping_add(x[b]).rotate_left(13);
    x[a] ^= x[d].wrapping_add(x[c]).rotate_left(18);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(hex_block: &str) -> Block {
        let bytes = hex::decode(hex_block).unwrap();
        let mut block = [0u32; BLOCK_WORDS];
        for (w, c) in block.iter_mut().zip(bytes.chunks_exact(4)) {
            *w = u32::from_le_bytes(c.try_into().unwrap());
        }
        block
    }

    // RFC 7914 section 8
    const INPUT: &str = "7e879a214f3ec9867ca940e641718f26baee555b8c61c1b50df846116dcd3b1d\
                         ee24f319df9b3d8514121e4b5ac5aa3276021d2909c74829edebc68db8b8c25e";
    const OUTPUT: &str = "a41f859c6608cc993b81cacb020cef05044b2181a2fd337dfd7b1c6396682f29\
                          b4393168e3c9e6bcfe6bc5b7a06d96bae424cc102c91745c24ad673dc7618f81";

    #[test]
    fn test_salsa20_8_rfc7914_vector() {
        let mut block = words(INPUT);
        salsa20_8(&mut block);
        assert_eq!(block, words(OUTPUT));
    }

    #[test]
    fn test_shuffled_matches_logical() {
        let input = words(INPUT);

        let mut stored = [0u32; BLOCK_WORDS];
        shuffle(&input, &mut stored);
        salsa20_8_shuffled(&mut stored);

        let mut back = [0u32; BLOCK_WORDS];
        unshuffle(&stored, &mut back);
        assert_eq!(back, words(OUTPUT));
    }

    #[test]
    fn test_shuffle_is_five_k_mod_sixteen() {
        for (k, &logical) in SHUFFLE.iter().enumerate() {
            assert_eq!(logical, (5 * k) % 16);
        }
    }

    #[test]
    fn test_shuffle_round_trip() {
        let src: Vec<u32> = (0..64).collect();
        let mut stored = vec![0u32; 64];
        let mut back = vec![0u32; 64];
        shuffle(&src, &mut stored);
        unshuffle(&stored, &mut back);
        assert_eq!(src, back);
        assert_ne!(src, stored);
    }
}
