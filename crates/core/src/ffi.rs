//! C FFI bindings
//!
//! All functions return 0 on success and -1 on a null pointer or rejected
//! parameters. Outputs are left untouched on failure.

use crate::{DIGEST_SIZE, Flags, Params, Yescrypt};
use core::slice;

/// Opaque hasher handle for FFI, preset to the Yenten parameters
pub struct YespowHasher {
    inner: Yescrypt<'static>,
}

/// Create a new Yenten hasher
/// Returns null if the buffers cannot be allocated (caller must free with yespow_free)
#[unsafe(no_mangle)]
pub extern "C" fn yespow_new() -> *mut YespowHasher {
    match Yescrypt::new(Params::yenten()) {
        Ok(inner) => Box::into_raw(Box::new(YespowHasher { inner })),
        Err(_) => core::ptr::null_mut(),
    }
}

/// Free a hasher instance
#[unsafe(no_mangle)]
pub extern "C" fn yespow_free(hasher: *mut YespowHasher) {
    if !hasher.is_null() {
        unsafe {
            let _ = Box::from_raw(hasher);
        }
    }
}

/// Hash a block header with a reusable hasher
/// - hasher: pointer from yespow_new()
/// - input: header bytes, used as both password and salt
/// - output: pointer to a 32-byte buffer
#[unsafe(no_mangle)]
pub extern "C" fn yespow_hasher_hash(
    hasher: *mut YespowHasher,
    input: *const u8,
    input_len: usize,
    output: *mut u8,
) -> i32 {
    if hasher.is_null() || input.is_null() || output.is_null() {
        return -1;
    }

    unsafe {
        let hasher = &mut *hasher;
        let input = slice::from_raw_parts(input, input_len);
        let digest = hasher.inner.compute(input, input);
        slice::from_raw_parts_mut(output, DIGEST_SIZE).copy_from_slice(&digest);
    }
    0
}

/// One-shot Yenten proof-of-work hash of `input` into a 32-byte buffer
#[unsafe(no_mangle)]
pub extern "C" fn yespow_hash(input: *const u8, input_len: usize, output: *mut u8) -> i32 {
    if input.is_null() || output.is_null() {
        return -1;
    }
    let hasher = yespow_new();
    if hasher.is_null() {
        return -1;
    }
    let status = yespow_hasher_hash(hasher, input, input_len, output);
    yespow_free(hasher);
    status
}

/// yescrypt with explicit parameters
///
/// `flags` takes the legacy bits (RW = 1, PWXFORM = 4); `sbox_bytes` must be
/// 0 unless PWXFORM is set. `password` and `salt` may be null when their
/// length is 0.
#[allow(clippy::too_many_arguments)]
#[unsafe(no_mangle)]
pub extern "C" fn yescrypt_kdf(
    password: *const u8,
    password_len: usize,
    salt: *const u8,
    salt_len: usize,
    n: u64,
    r: u32,
    p: u32,
    t: u32,
    g: u32,
    sbox_bytes: usize,
    flags: u32,
    output: *mut u8,
    output_len: usize,
) -> i32 {
    if output.is_null()
        || (password.is_null() && password_len != 0)
        || (salt.is_null() && salt_len != 0)
    {
        return -1;
    }

    let Ok(flags) = Flags::from_legacy(flags, t) else {
        return -1;
    };
    let Ok(params) = Params::builder()
        .n(n)
        .r(r)
        .p(p)
        .t(t)
        .g(g)
        .flags(flags)
        .sbox_bytes(sbox_bytes)
        .build()
    else {
        return -1;
    };

    unsafe {
        let password = bytes(password, password_len);
        let salt = bytes(salt, salt_len);
        let out = slice::from_raw_parts_mut(output, output_len);
        match crate::derive(password, salt, &params, out) {
            Ok(()) => 0,
            Err(_) => -1,
        }
    }
}

unsafe fn bytes<'a>(ptr: *const u8, len: usize) -> &'a [u8] {
    if len == 0 {
        &[]
    } else {
        unsafe { slice::from_raw_parts(ptr, len) }
    }
}

/// Benchmark: compute N Yenten hashes and return total microseconds
#[unsafe(no_mangle)]
pub extern "C" fn yespow_benchmark(iterations: u32) -> u64 {
    use std::time::Instant;

    let Ok(mut hasher) = Yescrypt::new(Params::yenten()) else {
        return 0;
    };
    let mut header = [0u8; 80];

    let start = Instant::now();
    for i in 0..iterations {
        header[76..].copy_from_slice(&i.to_le_bytes());
        let _ = hasher.compute(&header, &header);
    }
    start.elapsed().as_micros() as u64
}

/// Get hash rate (hashes per second) from a benchmark run
#[unsafe(no_mangle)]
pub extern "C" fn yespow_hashrate(iterations: u32, microseconds: u64) -> f64 {
    if microseconds == 0 {
        return 0.0;
    }
    (iterations as f64) / (microseconds as f64 / 1_000_000.0)
}
