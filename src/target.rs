//! Difficulty targets
//!
//! A target is a 256-bit unsigned integer. A digest meets it when the digest,
//! read as a little-endian integer, is not above the target. Targets are
//! written as 64 hex digits, most significant first, or as the 32-bit
//! compact `nBits` encoding found in block headers.

use std::fmt;
use std::str::FromStr;

use yescrypt_core::DIGEST_SIZE;

/// Error type for target parsing
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid compact target: {0}")]
    Compact(#[from] std::num::ParseIntError),

    #[error("target must be 64 hex digits or an 8 digit compact value (got {0} digits)")]
    Length(usize),

    #[error("compact target {0:#010x} is negative")]
    NegativeCompact(u32),

    #[error("compact target {0:#010x} does not fit in 256 bits")]
    CompactOverflow(u32),

    #[error("difficulty of {0} bits exceeds 256")]
    Difficulty(u32),
}

/// 256-bit target, stored most significant byte first
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target([u8; 32]);

impl Target {
    /// The largest target: every digest meets it
    pub const MAX: Target = Target([0xff; 32]);

    /// From big-endian bytes
    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Big-endian bytes
    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// Parse 64 hex digits, most significant first
    pub fn from_hex(s: &str) -> Result<Self, TargetError> {
        let s = strip_prefix(s);
        if s.len() != 64 {
            return Err(TargetError::Length(s.len()));
        }
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// Decode the compact `nBits` form: one exponent byte and a 23-bit
    /// mantissa with a sign bit
    pub fn from_compact(bits: u32) -> Result<Self, TargetError> {
        let size = (bits >> 24) as usize;
        let mut word = bits & 0x007f_ffff;

        if word != 0 && bits & 0x0080_0000 != 0 {
            return Err(TargetError::NegativeCompact(bits));
        }
        if word != 0 && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32)) {
            return Err(TargetError::CompactOverflow(bits));
        }

        let mut bytes = [0u8; 32];
        if size <= 3 {
            word >>= 8 * (3 - size);
            bytes[29..].copy_from_slice(&word.to_be_bytes()[1..]);
        } else {
            // Least significant mantissa byte lands `size - 3` bytes up
            for (k, byte) in word.to_le_bytes()[..3].iter().enumerate() {
                let shift = size - 3 + k;
                if shift < 32 {
                    bytes[31 - shift] = *byte;
                }
            }
        }
        Ok(Self(bytes))
    }

    /// Target met by digests with at least `bits` leading zero bits
    pub fn from_leading_zero_bits(bits: u32) -> Result<Self, TargetError> {
        if bits > 256 {
            return Err(TargetError::Difficulty(bits));
        }
        let ones = (256 - bits) as usize;
        let mut bytes = [0u8; 32];
        for byte in bytes.iter_mut().rev().take(ones / 8) {
            *byte = 0xff;
        }
        if ones % 8 != 0 {
            bytes[31 - ones / 8] = (1u8 << (ones % 8)) - 1;
        }
        Ok(Self(bytes))
    }

    /// 64 hex digits, most significant first
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

/// Compare the digest, read as a little-endian integer, against the target
pub fn meets_target(digest: &[u8; DIGEST_SIZE], target: &Target) -> bool {
    for (d, t) in digest.iter().rev().zip(target.0.iter()) {
        if d != t {
            return d < t;
        }
    }
    true
}

fn strip_prefix(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

impl FromStr for Target {
    type Err = TargetError;

    /// 64 hex digits are a full target, up to 8 are compact bits
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = strip_prefix(s);
        match digits.len() {
            64 => Self::from_hex(digits),
            1..=8 => Self::from_compact(u32::from_str_radix(digits, 16)?),
            len => Err(TargetError::Length(len)),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({})", self.to_hex())
    }
}
