//! Block header hashing
//!
//! Headers are 80 bytes with the nonce in the last four bytes
//! (little-endian). The header is passed to yescrypt as both password and
//! salt and the 32-byte digest is read as a little-endian 256-bit integer.

use yescrypt_core::{DIGEST_SIZE, Error, Params, Rom, Yescrypt};

/// Serialized block header size
pub const HEADER_SIZE: usize = 80;

/// Offset of the 32-bit nonce inside the header
pub const NONCE_OFFSET: usize = 76;

/// Hash a block header with the Yenten parameters
///
/// Allocates for the call; use [`PowHasher`] when hashing many headers.
pub fn pow_hash(header: &[u8]) -> Result<[u8; DIGEST_SIZE], Error> {
    Ok(PowHasher::yenten()?.hash(header))
}

/// Reusable header hasher
#[derive(Debug)]
pub struct PowHasher<'a> {
    inner: Yescrypt<'a>,
}

impl<'a> PowHasher<'a> {
    /// Hasher for arbitrary parameters
    pub fn new(params: Params) -> Result<Self, Error> {
        Ok(Self {
            inner: Yescrypt::new(params)?,
        })
    }

    /// Hasher for ROM mode parameters
    pub fn with_rom(params: Params, rom: &'a Rom) -> Result<Self, Error> {
        Ok(Self {
            inner: Yescrypt::with_rom(params, rom)?,
        })
    }

    /// [`PowHasher::with_rom`] when a ROM is given, [`PowHasher::new`] otherwise
    pub fn build(params: Params, rom: Option<&'a Rom>) -> Result<Self, Error> {
        match rom {
            Some(rom) => Self::with_rom(params, rom),
            None => Self::new(params),
        }
    }

    /// Hasher with the Yenten parameters
    pub fn yenten() -> Result<Self, Error> {
        Self::new(Params::yenten())
    }

    /// Parameters in use
    pub fn params(&self) -> &Params {
        self.inner.params()
    }

    /// Hash a header, used as both password and salt
    pub fn hash(&mut self, header: &[u8]) -> [u8; DIGEST_SIZE] {
        self.inner.compute(header, header)
    }

    /// Write `nonce` into `header` and hash it
    pub fn hash_with_nonce(
        &mut self,
        header: &mut [u8; HEADER_SIZE],
        nonce: u32,
    ) -> [u8; DIGEST_SIZE] {
        header[NONCE_OFFSET..].copy_from_slice(&nonce.to_le_bytes());
        self.hash(header)
    }
}

/// Leading zero bits of the digest read as a little-endian 256-bit integer,
/// i.e. counted from the last byte backwards
pub fn leading_zero_bits(digest: &[u8; DIGEST_SIZE]) -> u32 {
    let mut bits = 0;
    for &byte in digest.iter().rev() {
        if byte == 0 {
            bits += 8;
        } else {
            bits += byte.leading_zeros();
            break;
        }
    }
    bits
}

/// True if the digest has at least `difficulty` leading zero bits
pub fn meets_difficulty(digest: &[u8; DIGEST_SIZE], difficulty: u32) -> bool {
    leading_zero_bits(digest) >= difficulty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_zero_bits() {
        let mut digest = [0xffu8; 32];
        assert_eq!(leading_zero_bits(&digest), 0);

        digest[31] = 0x00;
        digest[30] = 0x0f;
        assert_eq!(leading_zero_bits(&digest), 12);

        // The first byte is the least significant one
        let mut low = [0u8; 32];
        low[0] = 1;
        assert_eq!(leading_zero_bits(&low), 255);
        assert_eq!(leading_zero_bits(&[0u8; 32]), 256);
    }

    #[test]
    fn test_meets_difficulty() {
        let mut digest = [0xffu8; 32];
        digest[31] = 0;
        assert!(meets_difficulty(&digest, 8));
        assert!(!meets_difficulty(&digest, 9));
    }

    #[test]
    fn test_build_selects_rom_hasher() {
        let params = Params::builder()
            .n(16)
            .r(1)
            .sbox_bytes(64)
            .mode(yescrypt_core::Mode::ReadOnlyRom)
            .build()
            .unwrap();
        let rom = Rom::generate(b"seed", 16, 1).unwrap();

        assert_eq!(
            PowHasher::build(params, None).unwrap_err(),
            Error::MissingRom
        );

        let header = [3u8; HEADER_SIZE];
        let mut hasher = PowHasher::build(params, Some(&rom)).unwrap();
        let mut direct = Yescrypt::with_rom(params, &rom).unwrap();
        assert_eq!(hasher.hash(&header), direct.compute(&header, &header));
    }

    #[test]
    fn test_nonce_is_written_little_endian() {
        let params = Params::builder().n(16).r(1).sbox_bytes(64).build().unwrap();
        let mut hasher = PowHasher::new(params).unwrap();

        let mut header = [0u8; HEADER_SIZE];
        let digest = hasher.hash_with_nonce(&mut header, 0x0403_0201);
        assert_eq!(header[NONCE_OFFSET..], [1, 2, 3, 4]);
        assert_eq!(digest, hasher.hash(&header));
    }
}
