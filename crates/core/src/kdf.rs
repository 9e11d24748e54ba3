//! PBKDF2 front end, lane scheduling and PBKDF2 back end
//!
//! The front end stretches the password into `p` block arrays, every lane
//! runs the mixing engine over its own array, and the back end compresses
//! the mixed stream into the output. Lanes share nothing but the parameter
//! set and the optional ROM.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use hmac::digest::Key;
use hmac::{Hmac, Mac};
use pbkdf2::pbkdf2_hmac;
use sha2::{Digest, Sha256};
use tracing::{debug, debug_span, trace};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::Error;
use crate::params::{DIGEST_SIZE, Mode, Params, block_array_size};
use crate::rom::Rom;
use crate::smix::{LaneMemory, smix};

/// Longest output PBKDF2-HMAC-SHA256 can produce
pub const MAX_OUTPUT_LEN: u64 = u32::MAX as u64 * DIGEST_SIZE as u64;

/// Reusable yescrypt hasher
///
/// Holds the validated parameters, the optional ROM and every buffer a
/// computation needs, so repeated calls do not allocate.
pub struct Yescrypt<'a> {
    params: Params,
    rom: Option<&'a Rom>,
    /// Block stream: 128 * r * p bytes
    block: Vec<u8>,
    /// One entry per lane in flight
    lanes: Vec<LaneMemory>,
}

impl<'a> Yescrypt<'a> {
    /// Allocate a hasher for `params`
    ///
    /// Fails with [`Error::MissingRom`] for [`Mode::ReadOnlyRom`]; use
    /// [`Yescrypt::with_rom`] there.
    pub fn new(params: Params) -> Result<Self, Error> {
        if params.flags().mode == Mode::ReadOnlyRom {
            return Err(Error::MissingRom);
        }
        Self::allocate(params, None)
    }

    /// Allocate a hasher that XORs in entries of `rom`
    pub fn with_rom(params: Params, rom: &'a Rom) -> Result<Self, Error> {
        if params.flags().mode != Mode::ReadOnlyRom {
            return Err(Error::RomMismatch("mode does not read a ROM"));
        }
        if rom.r() != params.r() {
            return Err(Error::RomMismatch("ROM block size differs from r"));
        }
        Self::allocate(params, Some(rom))
    }

    fn allocate(params: Params, rom: Option<&'a Rom>) -> Result<Self, Error> {
        let footprint = params.footprint();
        debug!(
            n = params.n(),
            r = params.r(),
            p = params.p(),
            t = params.t(),
            g = params.g(),
            sbox_bytes = params.sbox_bytes(),
            mode = ?params.flags().mode,
            sboxes = ?params.flags().sboxes,
            total_bytes = footprint.total(),
            "allocating yescrypt hasher"
        );

        let mut block = Vec::new();
        block
            .try_reserve_exact(footprint.block_stream)
            .map_err(|_| Error::AllocationFailed(footprint.block_stream))?;
        block.resize(footprint.block_stream, 0);

        let lanes = (0..footprint.lanes_in_flight)
            .map(|_| LaneMemory::allocate(&params))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            params,
            rom,
            block,
            lanes,
        })
    }

    /// Parameters this hasher was built for
    pub fn params(&self) -> &Params {
        &self.params
    }

    /// Bytes held by the hasher's buffers
    pub fn allocated_bytes(&self) -> usize {
        self.block.len() + self.lanes.iter().map(LaneMemory::allocated_bytes).sum::<usize>()
    }

    /// Compute the 32-byte digest of `password` under `salt`
    pub fn compute(&mut self, password: &[u8], salt: &[u8]) -> [u8; DIGEST_SIZE] {
        let mut out = [0u8; DIGEST_SIZE];
        self.run(password, salt, &mut out);
        out
    }

    /// Fill `out` with derived key material
    ///
    /// Classic mode with `t = 0` and no confirmation produces scrypt output
    /// of any length.
    pub fn derive(&mut self, password: &[u8], salt: &[u8], out: &mut [u8]) -> Result<(), Error> {
        if out.is_empty() || out.len() as u64 > MAX_OUTPUT_LEN {
            return Err(Error::InvalidOutputLength(out.len()));
        }
        self.run(password, salt, out);
        Ok(())
    }

    /// Run `g + 1` passes; every pass but the last yields the next password
    fn run(&mut self, password: &[u8], salt: &[u8], out: &mut [u8]) {
        let mut n = self.params.n();
        let mut t = self.params.t();
        let mut chained = [0u8; DIGEST_SIZE];

        for pass in 0..self.params.g() {
            let mut next = [0u8; DIGEST_SIZE];
            let key = if pass == 0 { password } else { &chained[..] };
            self.pass(key, salt, n, t, &mut next);
            chained = next;
            n <<= 2;
            t >>= 1;
        }

        let key = if self.params.g() == 0 {
            password
        } else {
            &chained[..]
        };
        self.pass(key, salt, n, t, out);
    }

    /// One complete front end, mix, back end
    fn pass(&mut self, password: &[u8], salt: &[u8], n: u64, t: u32, out: &mut [u8]) {
        let confirm = self.params.flags().confirm;

        let back_key = {
            let _span = debug_span!("front_end", bytes = self.block.len()).entered();
            let prehashed;
            let password = if confirm {
                prehashed = Sha256::digest(password);
                prehashed.as_slice()
            } else {
                password
            };
            pbkdf2_hmac::<Sha256>(password, salt, 1, &mut self.block);

            if confirm {
                let mut stored = [0u8; DIGEST_SIZE];
                stored.copy_from_slice(&self.block[..DIGEST_SIZE]);
                BackKey::Stored(stored)
            } else {
                BackKey::Password
            }
        };

        {
            let _span = debug_span!("mix_lanes", n, t, p = self.params.p()).entered();
            self.mix_lanes(n, t);
        }

        let _span = debug_span!("back_end", out = out.len()).entered();
        let key = match &back_key {
            BackKey::Password => password,
            BackKey::Stored(stored) => &stored[..],
        };
        pbkdf2_hmac::<Sha256>(key, &self.block, 1, out);

        if confirm && out.len() == DIGEST_SIZE {
            client_key(out);
        }
    }

    /// Run every lane over its slice of the block stream
    #[cfg(feature = "parallel")]
    fn mix_lanes(&mut self, n: u64, t: u32) {
        let params = &self.params;
        let rom = self.rom;
        let lane_bytes = block_array_size(params.r());

        self.block
            .par_chunks_mut(lane_bytes)
            .zip(self.lanes.par_iter_mut())
            .enumerate()
            .for_each(|(index, (b, lane))| {
                trace!(lane = index, "lane start");
                smix(lane, b, params, n, t, rom);
                trace!(lane = index, "lane done");
            });
    }

    /// Run every lane over its slice of the block stream (sequential fallback)
    #[cfg(not(feature = "parallel"))]
    fn mix_lanes(&mut self, n: u64, t: u32) {
        let params = &self.params;
        let rom = self.rom;
        let lane_bytes = block_array_size(params.r());

        // One lane's memory is reused by every lane in turn
        let lane = &mut self.lanes[0];
        for (index, b) in self.block.chunks_exact_mut(lane_bytes).enumerate() {
            trace!(lane = index, "lane start");
            smix(lane, b, params, n, t, rom);
            trace!(lane = index, "lane done");
        }
    }
}

impl core::fmt::Debug for Yescrypt<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Yescrypt")
            .field("params", &self.params)
            .field("rom", &self.rom)
            .finish_non_exhaustive()
    }
}

/// Key of the final PBKDF2
enum BackKey {
    /// The caller's password (no confirmation pass)
    Password,
    /// First 32 bytes of the unmixed block stream
    Stored([u8; DIGEST_SIZE]),
}

/// `SHA-256(HMAC-SHA256(dk, "Client Key"))` in place
fn client_key(dk: &mut [u8]) {
    // HMAC zero-pads keys shorter than the SHA-256 block
    let mut padded = Key::<Hmac<Sha256>>::default();
    padded[..dk.len()].copy_from_slice(dk);

    let mut mac = <Hmac<Sha256> as Mac>::new(&padded);
    mac.update(b"Client Key");
    let client = mac.finalize().into_bytes();
    dk.copy_from_slice(&Sha256::digest(client));
}

/// Compute the 32-byte digest of `password` under `salt`
///
/// Allocates for the call. Use [`Yescrypt`] to reuse buffers or to supply a
/// ROM.
pub fn compute(password: &[u8], salt: &[u8], params: &Params) -> Result<[u8; DIGEST_SIZE], Error> {
    Ok(Yescrypt::new(*params)?.compute(password, salt))
}

/// Fill `out` with key material derived from `password` and `salt`
pub fn derive(password: &[u8], salt: &[u8], params: &Params, out: &mut [u8]) -> Result<(), Error> {
    Yescrypt::new(*params)?.derive(password, salt, out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_key_matches_direct_hmac() {
        let mut dk = [0x5au8; DIGEST_SIZE];
        client_key(&mut dk);

        let mut mac = <Hmac<Sha256> as Mac>::new_from_slice(&[0x5au8; DIGEST_SIZE]).unwrap();
        mac.update(b"Client Key");
        let expected = Sha256::digest(mac.finalize().into_bytes());
        assert_eq!(dk[..], expected[..]);
    }

    #[test]
    fn test_derive_rejects_empty_output() {
        let params = Params::classic(16, 1, 1).unwrap();
        let mut out = [0u8; 0];
        assert_eq!(
            derive(b"", b"", &params, &mut out),
            Err(Error::InvalidOutputLength(0))
        );
    }

    #[test]
    fn test_rom_mode_requires_rom() {
        let params = Params::builder()
            .n(16)
            .r(1)
            .mode(Mode::ReadOnlyRom)
            .sbox_bytes(64)
            .build()
            .unwrap();
        assert_eq!(Yescrypt::new(params).unwrap_err(), Error::MissingRom);

        let rom = Rom::generate(b"seed", 16, 2).unwrap();
        assert!(matches!(
            Yescrypt::with_rom(params, &rom),
            Err(Error::RomMismatch(_))
        ));
    }

    #[test]
    fn test_allocated_bytes_match_footprint() {
        let params = Params::builder()
            .n(32)
            .r(2)
            .p(2)
            .sbox_bytes(256)
            .build()
            .unwrap();
        let hasher = Yescrypt::new(params).unwrap();
        assert_eq!(hasher.allocated_bytes(), params.footprint().total());
    }
}
