//! pwxform S-box transform
//!
//! Each lane owns two S-boxes. A 64-byte block is viewed as
//! [`PWX_GATHER`] lanes of [`PWX_SIMPLE`] little-endian 64-bit words taken
//! from the shuffled block layout. Every round, the first word of a lane
//! picks one entry in each S-box (low and high 32 bits, masked to the table
//! size) and each word becomes `(hi32 * lo32 + S0) ^ S1` with wrapping
//! 64-bit arithmetic.
//!
//! With [`SboxMode::WriteBack`](crate::SboxMode::WriteBack) each S-box is
//! split into two halves. Reads hit the current read half, updated lanes
//! from the middle rounds are stored at a cursor that walks both write
//! halves as one ring, and the halves swap roles after every block.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::blockmix::SalsaMix;
use crate::error::Error;
use crate::params::{PWX_GATHER, PWX_ROUNDS, PWX_SIMPLE, SBOX_ENTRY_SIZE};
use crate::salsa::{BLOCK_WORDS, Block};
use crate::smix::{alloc_words, smix1};

/// u32 words per S-box entry
const ENTRY_WORDS: usize = SBOX_ENTRY_SIZE / 4;

/// Lane-local S-box arena: S0 followed by S1
pub(crate) struct SBoxes {
    words: Vec<u32>,
    /// Entries in one S-box
    entries: usize,
    /// Half currently read from (write-back only)
    read_half: usize,
    /// Next entry of the write ring (write-back only)
    cursor: usize,
}

impl SBoxes {
    /// Allocate two S-boxes of `bytes` each
    pub(crate) fn allocate(bytes: usize) -> Result<Self, Error> {
        debug_assert!(bytes.is_power_of_two() && bytes >= SBOX_ENTRY_SIZE * 2);
        Ok(Self {
            words: alloc_words(2 * bytes / 4)?,
            entries: bytes / SBOX_ENTRY_SIZE,
            read_half: 0,
            cursor: 0,
        })
    }

    /// Bytes held by both S-boxes
    pub(crate) fn size_bytes(&self) -> usize {
        self.words.len() * 4
    }

    /// Fill both S-boxes from the first 128 bytes of a lane's block array.
    ///
    /// Runs the fill phase with r = 1 using the S-box memory as the scratch
    /// array; `head` is advanced in place.
    pub(crate) fn init(&mut self, head: &mut [u32], tmp: &mut [u32], read_write: bool) {
        let arrays = (self.words.len() / 32) as u64;
        smix1(head, tmp, &mut self.words, arrays, read_write, None, &mut SalsaMix);
        self.read_half = 0;
        self.cursor = 0;
    }

    #[inline(always)]
    fn entry_word(&self, entry: usize, k: usize) -> u64 {
        let at = entry * ENTRY_WORDS + 2 * k;
        u64::from(self.words[at]) | u64::from(self.words[at + 1]) << 32
    }

    #[inline(always)]
    fn store_entry(&mut self, entry: usize, lane: &[u64; PWX_SIMPLE]) {
        let at = entry * ENTRY_WORDS;
        for (k, &w) in lane.iter().enumerate() {
            self.words[at + 2 * k] = w as u32;
            self.words[at + 2 * k + 1] = (w >> 32) as u32;
        }
    }

    /// pwxform over read-only S-boxes
    #[inline(always)]
    pub(crate) fn transform(&self, block: &mut Block) {
        let mut lanes = load(block);
        let mask = self.entries - 1;

        // Lanes never read each other, so each runs all rounds in turn
        for lane in lanes.iter_mut() {
            for _ in 0..PWX_ROUNDS {
                let (p0, p1) = offsets(lane[0], mask);
                let p1 = self.entries + p1;
                for (k, x) in lane.iter_mut().enumerate() {
                    *x = mul_hi_lo(*x).wrapping_add(self.entry_word(p0, k)) ^ self.entry_word(p1, k);
                }
            }
        }

        store(&lanes, block);
    }

    /// pwxform that writes into the idle halves, then swaps halves
    #[inline(always)]
    pub(crate) fn transform_write_back(&mut self, block: &mut Block) {
        let mut lanes = load(block);
        let half = self.entries / 2;
        let mask = half - 1;
        let read = self.read_half * half;
        let write = (self.read_half ^ 1) * half;

        for round in 0..PWX_ROUNDS {
            for lane in lanes.iter_mut() {
                let (p0, p1) = offsets(lane[0], mask);
                let (p0, p1) = (read + p0, self.entries + read + p1);
                for (k, x) in lane.iter_mut().enumerate() {
                    *x = mul_hi_lo(*x).wrapping_add(self.entry_word(p0, k)) ^ self.entry_word(p1, k);
                }

                if round != 0 && round != PWX_ROUNDS - 1 {
                    let sbox = self.cursor / half;
                    let entry = sbox * self.entries + write + self.cursor % half;
                    self.store_entry(entry, lane);
                    self.cursor = (self.cursor + 1) % (2 * half);
                }
            }
        }

        self.read_half ^= 1;
        store(&lanes, block);
    }
}

/// S-box entry indices from the low and high halves of a lane's first word
#[inline(always)]
fn offsets(x: u64, mask: usize) -> (usize, usize) {
    let lo = (x as u32 as usize) / SBOX_ENTRY_SIZE;
    let hi = ((x >> 32) as usize) / SBOX_ENTRY_SIZE;
    (lo & mask, hi & mask)
}

#[inline(always)]
fn mul_hi_lo(x: u64) -> u64 {
    (x >> 32).wrapping_mul(x & 0xffff_ffff)
}

#[inline(always)]
fn load(block: &Block) -> [[u64; PWX_SIMPLE]; PWX_GATHER] {
    let mut lanes = [[0u64; PWX_SIMPLE]; PWX_GATHER];
    for (i, pair) in block.chunks_exact(2).enumerate() {
        lanes[i / PWX_SIMPLE][i % PWX_SIMPLE] = u64::from(pair[0]) | u64::from(pair[1]) << 32;
    }
    lanes
}

#[inline(always)]
fn store(lanes: &[[u64; PWX_SIMPLE]; PWX_GATHER], block: &mut Block) {
    debug_assert_eq!(PWX_GATHER * PWX_SIMPLE * 2, BLOCK_WORDS);
    for (i, pair) in block.chunks_exact_mut(2).enumerate() {
        let w = lanes[i / PWX_SIMPLE][i % PWX_SIMPLE];
        pair[0] = w as u32;
        pair[1] = (w >> 32) as u32;
    }
}
