//! # yescrypt Core Algorithm
//!
//! Memory-hard password hashing and proof-of-work function: the yescrypt 0.5
//! SMix engine with optional pwxform S-boxes, wrapped in a PBKDF2-HMAC-SHA256
//! front and back end.
//!
//! ## Pieces
//!
//! - **Salsa20/8**: the 64-byte core transform, applied to blocks kept in a
//!   shuffled word order
//! - **BlockMix**: the scrypt even/odd interleave, or a sequential chain
//!   through the pwxform S-box transform
//! - **pwxform**: 4 lanes of 2 x 64-bit words, 6 rounds of
//!   multiply/add/xor against two lane-local S-boxes
//! - **SMix**: a fill phase and a data-dependent mix phase over a
//!   `128 * r * N` byte scratch array per lane
//! - **PBKDF2**: stretches the password into `p` lanes and compresses them
//!   into the digest
//!
//! ## Modes
//!
//! - [`Mode::Classic`] is scrypt. With `t = 0` and no confirmation pass the
//!   output is byte-identical to RFC 7914.
//! - [`Mode::ReadWrite`] reads back earlier slots while filling and writes
//!   visited slots back while mixing. This is the Yenten proof-of-work.
//! - [`Mode::ReadOnlyRom`] additionally folds in entries of a caller
//!   supplied [`Rom`] on odd iterations.
//!
//! ## Example
//!
//! ```rust
//! use yescrypt_core::{Params, Yescrypt, compute};
//!
//! // Single-shot hashing with the Yenten preset
//! let header = [0u8; 80];
//! let digest = compute(&header, &header, &Params::yenten()).unwrap();
//! assert_eq!(digest.len(), 32);
//!
//! // Reusable hasher (avoids re-allocation)
//! let params = Params::builder().n(1024).r(8).build().unwrap();
//! let mut hasher = Yescrypt::new(params).unwrap();
//! let first = hasher.compute(b"first", b"salt");
//! let second = hasher.compute(b"second", b"salt");
//! assert_ne!(first, second);
//! ```
//!
//! ## no_std Support
//!
//! This crate supports `no_std` environments with the `alloc` crate:
//!
//! ```toml
//! [dependencies]
//! yescrypt-core = { version = "0.5", default-features = false }
//! ```

#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod blockmix;
mod error;
mod kdf;
mod params;
mod pwxform;
mod rom;
mod salsa;
mod smix;

#[cfg(feature = "std")]
mod ffi;

pub use error::Error;
pub use kdf::{MAX_OUTPUT_LEN, Yescrypt, compute, derive};
pub use params::*;
pub use rom::Rom;
pub use salsa::{BLOCK_WORDS, Block, salsa20_8};
