//! Read-only lookup table for [`Mode::ReadOnlyRom`](crate::Mode::ReadOnlyRom)
//!
//! Odd iterations of both phases XOR in a ROM entry instead of touching the
//! lane's own scratch array. The ROM is built once by the caller and shared
//! by reference.

#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;

use crate::blockmix::SalsaMix;
use crate::error::Error;
use crate::params::block_array_size;
use crate::salsa::shuffle;
use crate::smix::{alloc_words, smix1};

/// Read-only table of `len()` block arrays in the shuffled layout
pub struct Rom {
    words: Vec<u32>,
    r: u32,
    blocks: u64,
}

impl Rom {
    /// Build a ROM of `nrom` block arrays of `128 * r` bytes from `seed`.
    ///
    /// The seed is stretched with PBKDF2-HMAC-SHA256 (empty salt, one
    /// iteration) and the table is filled by the read-write fill phase.
    pub fn generate(seed: &[u8], nrom: u64, r: u32) -> Result<Self, Error> {
        if nrom < 2 || !nrom.is_power_of_two() {
            return Err(Error::InvalidN(nrom));
        }
        if r == 0 {
            return Err(Error::InvalidR);
        }

        let array = block_array_size(r);
        let total = usize::try_from(nrom)
            .ok()
            .and_then(|n| n.checked_mul(array))
            .ok_or(Error::MemoryOverflow)?;

        let mut stream = vec![0u8; array];
        pbkdf2_hmac::<Sha256>(seed, &[], 1, &mut stream);
        let logical: Vec<u32> = stream
            .chunks_exact(4)
            .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect();

        let mut x = vec![0u32; logical.len()];
        let mut y = vec![0u32; logical.len()];
        shuffle(&logical, &mut x);

        let mut words = alloc_words(total / 4)?;
        smix1(&mut x, &mut y, &mut words, nrom, true, None, &mut SalsaMix);

        tracing::debug!(nrom, r, bytes = total, "generated ROM");
        Ok(Self {
            words,
            r,
            blocks: nrom,
        })
    }

    /// Number of block arrays
    pub fn len(&self) -> u64 {
        self.blocks
    }

    /// Always false: a ROM holds at least two block arrays
    pub fn is_empty(&self) -> bool {
        self.blocks == 0
    }

    /// Block size factor the ROM was built for
    pub fn r(&self) -> u32 {
        self.r
    }

    /// Bytes held by the table
    pub fn size_bytes(&self) -> usize {
        self.words.len() * 4
    }

    /// Block array selected by the low bits of `x`
    #[inline(always)]
    pub(crate) fn lookup(&self, x: u64) -> &[u32] {
        let s = self.words.len() / self.blocks as usize;
        let j = (x & (self.blocks - 1)) as usize;
        &self.words[j * s..(j + 1) * s]
    }
}

impl core::fmt::Debug for Rom {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Rom")
            .field("blocks", &self.blocks)
            .field("r", &self.r)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_is_deterministic() {
        let a = Rom::generate(b"rom seed", 16, 1).unwrap();
        let b = Rom::generate(b"rom seed", 16, 1).unwrap();
        assert_eq!(a.words, b.words);
        assert_eq!(a.len(), 16);
        assert_eq!(a.size_bytes(), 16 * 128);

        let c = Rom::generate(b"other seed", 16, 1).unwrap();
        assert_ne!(a.words, c.words);
    }

    #[test]
    fn test_generate_rejects_bad_sizes() {
        assert_eq!(Rom::generate(b"", 3, 1).unwrap_err(), Error::InvalidN(3));
        assert_eq!(Rom::generate(b"", 1, 1).unwrap_err(), Error::InvalidN(1));
        assert_eq!(Rom::generate(b"", 16, 0).unwrap_err(), Error::InvalidR);
    }

    #[test]
    fn test_lookup_masks_index() {
        let rom = Rom::generate(b"seed", 4, 1).unwrap();
        assert_eq!(rom.lookup(1), rom.lookup(5));
        assert_eq!(rom.lookup(3).len(), 32);
    }
}
