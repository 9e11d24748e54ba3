//! yescrypt Proof-of-Work Library
//!
//! Block header hashing, target handling and parameter profiles around the
//! [`yescrypt_core`] engine.
//!
//! # Overview
//!
//! A proof-of-work hash is yescrypt over the serialized block header, with
//! the header used as both password and salt. The default parameters are
//! the Yenten ones: N = 4096, r = 32, p = 1, read-write mode with 4 KiB
//! pwxform S-boxes, about 16 MiB per hash.
//!
//! # Example
//!
//! ```rust
//! use yespow::{Target, meets_target, pow_hash};
//!
//! let header = [0u8; 80];
//! let digest = pow_hash(&header).unwrap();
//!
//! // Compact bits as found in the header
//! let target = Target::from_compact(0x1f00ffff).unwrap();
//! if meets_target(&digest, &target) {
//!     println!("Valid proof found!");
//! }
//! ```

// Re-export the core algorithm
pub use yescrypt_core as algorithm;

pub mod pow;
pub mod profile;
pub mod target;

// Convenience re-exports
pub use algorithm::{Params, Yescrypt};
pub use pow::{HEADER_SIZE, NONCE_OFFSET, PowHasher, leading_zero_bits, meets_difficulty, pow_hash};
pub use profile::{PowProfile, ProfileError};
pub use target::{Target, TargetError, meets_target};
