//! Memory-hard mixing engine
//!
//! One lane runs the fill phase over its scratch array, then the mix phase.
//! In read-write mode the fill phase already reads back earlier slots and
//! the mix phase writes each visited slot back. Everything here works on
//! block arrays in the shuffled word layout of [`crate::salsa`].

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::blockmix::{BlockMix, PwxformMix, PwxformWriteBackMix, SalsaMix, xor_into};
use crate::error::Error;
use crate::params::{Params, SboxMode};
use crate::pwxform::SBoxes;
use crate::rom::Rom;
use crate::salsa::{BLOCK_WORDS, shuffle, unshuffle};

/// Allocate a zeroed word buffer, reporting failure instead of aborting
pub(crate) fn alloc_words(len: usize) -> Result<Vec<u32>, Error> {
    let mut words = Vec::new();
    words
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed(len.saturating_mul(4)))?;
    words.resize(len, 0);
    Ok(words)
}

/// Memory owned by one lane: scratch array, working block array, mixer
/// scratch and S-boxes
pub(crate) struct LaneMemory {
    v: Vec<u32>,
    x: Vec<u32>,
    y: Vec<u32>,
    sboxes: Option<SBoxes>,
}

impl LaneMemory {
    /// Allocate for the largest N any pass of `params` uses
    pub(crate) fn allocate(params: &Params) -> Result<Self, Error> {
        let words = params.block_array_words();
        let scratch = params.footprint().scratch / 4;
        let sboxes = match params.flags().sboxes {
            SboxMode::Disabled => None,
            _ => Some(SBoxes::allocate(params.sbox_bytes())?),
        };

        Ok(Self {
            v: alloc_words(scratch)?,
            x: alloc_words(words)?,
            y: alloc_words(words)?,
            sboxes,
        })
    }

    /// Bytes held by the scratch array and the S-boxes
    pub(crate) fn allocated_bytes(&self) -> usize {
        self.v.len() * 4 + self.sboxes.as_ref().map_or(0, SBoxes::size_bytes)
    }
}

/// Run the fill and mix phases of one lane over its slice of the block
/// stream (`128 * r` bytes, little-endian words in logical order).
pub(crate) fn smix(
    lane: &mut LaneMemory,
    b: &mut [u8],
    params: &Params,
    n: u64,
    t: u32,
    rom: Option<&Rom>,
) {
    let LaneMemory { v, x, y, sboxes } = lane;
    let words = x.len();
    debug_assert_eq!(b.len(), words * 4);

    for (w, bytes) in y.iter_mut().zip(b.chunks_exact(4)) {
        *w = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    }
    shuffle(y, x);

    let rw = params.flags().mode.is_read_write();
    let (nloop_all, nloop_rw) = nloop(n, t, rw);
    let v = &mut v[..words * n as usize];

    match (params.flags().sboxes, sboxes.as_mut()) {
        (SboxMode::ReadOnly, Some(sboxes)) => {
            sboxes.init(&mut x[..32], &mut y[..32], rw);
            run(x, y, v, n, nloop_all, nloop_rw, rw, rom, &mut PwxformMix(&*sboxes));
        }
        (SboxMode::WriteBack, Some(sboxes)) => {
            sboxes.init(&mut x[..32], &mut y[..32], rw);
            let mut mixer = PwxformWriteBackMix(sboxes);
            run(x, y, v, n, nloop_all, nloop_rw, rw, rom, &mut mixer);
        }
        _ => run(x, y, v, n, nloop_all, nloop_rw, rw, rom, &mut SalsaMix),
    }

    unshuffle(x, y);
    for (w, bytes) in y.iter().zip(b.chunks_exact_mut(4)) {
        bytes.copy_from_slice(&w.to_le_bytes());
    }
}

#[allow(clippy::too_many_arguments)]
#[inline(always)]
fn run<M: BlockMix>(
    x: &mut [u32],
    y: &mut [u32],
    v: &mut [u32],
    n: u64,
    nloop_all: u64,
    nloop_rw: u64,
    rw: bool,
    rom: Option<&Rom>,
    mixer: &mut M,
) {
    smix1(x, y, v, n, rw, rom, mixer);
    smix2(x, y, v, p2floor(n), nloop_rw, rw, rom, mixer);
    if nloop_all > nloop_rw {
        smix2(x, y, v, n, nloop_all - nloop_rw, false, rom, mixer);
    }
}

/// Fill phase: store `x` into slot `i`, fold in an earlier slot (read-write)
/// or a ROM entry (odd `i` with a ROM), then mix.
pub(crate) fn smix1<M: BlockMix>(
    x: &mut [u32],
    y: &mut [u32],
    v: &mut [u32],
    n: u64,
    rw: bool,
    rom: Option<&Rom>,
    mixer: &mut M,
) {
    let s = x.len();
    debug_assert!(v.len() >= s * n as usize);

    for i in 0..n as usize {
        v[i * s..(i + 1) * s].copy_from_slice(x);

        if let Some(rom) = rom.filter(|_| i & 1 == 1) {
            xor_into(x, rom.lookup(integerify(x)));
        } else if rw && i > 1 {
            let j = wrap(integerify(x), i as u64) as usize;
            xor_into(x, &v[j * s..(j + 1) * s]);
        }

        mixer.mix(x, y);
    }
}

/// Mix phase: `nloop` data-dependent visits to the first `n` slots
#[allow(clippy::too_many_arguments)]
pub(crate) fn smix2<M: BlockMix>(
    x: &mut [u32],
    y: &mut [u32],
    v: &mut [u32],
    n: u64,
    nloop: u64,
    rw: bool,
    rom: Option<&Rom>,
    mixer: &mut M,
) {
    let s = x.len();
    let mask = n - 1;

    for i in 0..nloop {
        if let Some(rom) = rom.filter(|_| i & 1 == 1) {
            xor_into(x, rom.lookup(integerify(x)));
        } else {
            let j = (integerify(x) & mask) as usize;
            let slot = &mut v[j * s..(j + 1) * s];
            xor_into(x, slot);
            if rw {
                slot.copy_from_slice(x);
            }
        }

        mixer.mix(x, y);
    }
}

/// Logical words 0 and 1 of the last block. In the shuffled layout logical
/// word 1 sits at stored position 13.
#[inline(always)]
pub(crate) fn integerify(x: &[u32]) -> u64 {
    let last = x.len() - BLOCK_WORDS;
    u64::from(x[last]) | u64::from(x[last + 13]) << 32
}

/// Largest power of two not above `x`
#[inline(always)]
pub(crate) fn p2floor(mut x: u64) -> u64 {
    while x & (x - 1) != 0 {
        x &= x - 1;
    }
    x
}

/// Map `x` into `[0, i)`, favouring the most recent power-of-two window
#[inline(always)]
pub(crate) fn wrap(x: u64, i: u64) -> u64 {
    let n = p2floor(i);
    (x & (n - 1)) + (i - n)
}

/// Mix-phase iteration counts `(total, read-write share)`, both even
pub(crate) fn nloop(n: u64, t: u32, rw: bool) -> (u64, u64) {
    let t = u64::from(t);
    let total = if rw {
        match t {
            0 => n.div_ceil(3),
            1 => (2 * n).div_ceil(3),
            _ => n * (t - 1),
        }
    } else {
        match t {
            0 => n,
            1 => n + n.div_ceil(2),
            _ => n * t,
        }
    };
    let share = if rw { total } else { 0 };

    (round_even(total), round_even(share))
}

#[inline(always)]
fn round_even(x: u64) -> u64 {
    x + (x & 1)
}
