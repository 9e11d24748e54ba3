//! Rejections reported by the public entry points
//!
//! Everything here is detected before the scratch array is touched. Once a
//! parameter set is validated and memory is allocated, the computation is
//! total and cannot fail.

/// Error returned by parameter validation and by [`crate::Yescrypt`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// N must be a power of two and at least 2
    #[error("N must be a power of two greater than 1 (got {0})")]
    InvalidN(u64),

    /// r must be at least 1
    #[error("block size factor r must be at least 1")]
    InvalidR,

    /// p must be at least 1
    #[error("parallelism p must be at least 1")]
    InvalidP,

    /// r * p must stay below 2^30
    #[error("r * p must be below 2^30 (r = {r}, p = {p})")]
    ParallelismTooLarge { r: u32, p: u32 },

    /// S-box size is not a power of two in the supported range
    #[error("S-box size must be a power of two between 64 bytes and 1 GiB (got {0})")]
    InvalidSboxSize(usize),

    /// S-box size and S-box mode disagree
    #[error("S-box mode {mode:?} does not match S-box size {bytes}")]
    SboxModeMismatch { mode: crate::SboxMode, bytes: usize },

    /// S-boxes were requested in classic scrypt mode
    #[error("S-boxes require the read-write or ROM mode")]
    SboxesNeedReadWrite,

    /// Legacy flag bits that are unknown or not supported
    #[error("unsupported flag bits {0:#x}")]
    UnsupportedFlags(u32),

    /// N scaled by t or g overflows a 64-bit counter
    #[error("time cost overflows (N = {n}, t = {t}, g = {g})")]
    CostOverflow { n: u64, t: u32, g: u32 },

    /// The memory footprint does not fit the address space
    #[error("memory footprint overflows the address space")]
    MemoryOverflow,

    /// The memory footprint exceeds the caller supplied limit
    #[error("memory footprint of {required} bytes exceeds the limit of {limit} bytes")]
    MemoryLimitExceeded { required: usize, limit: usize },

    /// Allocation of a working buffer failed
    #[error("failed to allocate {0} bytes")]
    AllocationFailed(usize),

    /// ROM mode was selected without supplying a ROM
    #[error("ROM mode requires a ROM")]
    MissingRom,

    /// A ROM was supplied that cannot be used with these parameters
    #[error("ROM cannot be used: {0}")]
    RomMismatch(&'static str),

    /// Requested output length is zero or too long for PBKDF2
    #[error("invalid output length {0}")]
    InvalidOutputLength(usize),
}
