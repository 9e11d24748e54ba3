//! yescrypt cost parameters
//!
//! A [`Params`] value is validated once by [`ParamsBuilder::build`] and is
//! immutable afterwards. It is shared read-only by every lane.

use crate::error::Error;

/// Size of the unit the core transform operates on
pub const BLOCK_SIZE: usize = 64;

/// Size of the digest returned by [`crate::compute`]
pub const DIGEST_SIZE: usize = 32;

/// 64-bit words per pwxform lane
pub const PWX_SIMPLE: usize = 2;

/// Parallel pwxform lanes per 64-byte block
pub const PWX_GATHER: usize = 4;

/// pwxform rounds per block
pub const PWX_ROUNDS: usize = 6;

/// Bytes per S-box entry (one pwxform lane)
pub const SBOX_ENTRY_SIZE: usize = PWX_SIMPLE * 8;

/// Smallest S-box: the two S-boxes together must hold one r = 1 block array
pub const MIN_SBOX_BYTES: usize = 64;

/// Largest S-box accepted
pub const MAX_SBOX_BYTES: usize = 1 << 30;

/// S-box size used when the S-boxes are enabled without an explicit size (4 KiB each)
pub const DEFAULT_SBOX_BYTES: usize = 4096;

/// Yenten proof-of-work: N
pub const YENTEN_N: u64 = 4096;

/// Yenten proof-of-work: r
pub const YENTEN_R: u32 = 32;

/// Yenten proof-of-work: p
pub const YENTEN_P: u32 = 1;

/// Yenten proof-of-work: t
pub const YENTEN_T: u32 = 0;

/// Bytes per block array for a given r
#[inline(always)]
pub const fn block_array_size(r: u32) -> usize {
    128 * r as usize
}

/// Which mixing variant a computation runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// scrypt compatible: the scratch array is read-only during mixing
    Classic,
    /// Fill phase reads back earlier slots and the mix phase writes slots back
    ReadWrite,
    /// Read-write plus lookups into a caller supplied read-only ROM
    ReadOnlyRom,
}

impl Mode {
    /// True for the modes that write into the scratch array while mixing
    #[inline(always)]
    pub const fn is_read_write(self) -> bool {
        !matches!(self, Mode::Classic)
    }
}

/// Whether and how the S-box transform runs inside the block mixer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SboxMode {
    /// Plain Salsa20/8 block mixer
    Disabled,
    /// pwxform over two read-only S-boxes (yescrypt 0.5)
    ReadOnly,
    /// pwxform that writes back into the idle half of each S-box
    WriteBack,
}

impl SboxMode {
    /// True unless the S-boxes are disabled
    #[inline(always)]
    pub const fn is_enabled(self) -> bool {
        !matches!(self, SboxMode::Disabled)
    }
}

/// Variant selection carried in the parameter set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flags {
    /// Mixing variant
    pub mode: Mode,
    /// S-box transform
    pub sboxes: SboxMode,
    /// SHA-256 password pre-hash and ClientKey/StoredKey post-hash
    pub confirm: bool,
}

impl Flags {
    /// Legacy bit: read-write mode
    pub const LEGACY_RW: u32 = 0x1;
    /// Legacy bit: lanes share one scratch array (not supported)
    pub const LEGACY_PARALLEL_SMIX: u32 = 0x2;
    /// Legacy bit: pwxform S-boxes
    pub const LEGACY_PWXFORM: u32 = 0x4;

    /// Plain scrypt
    pub const CLASSIC: Flags = Flags {
        mode: Mode::Classic,
        sboxes: SboxMode::Disabled,
        confirm: false,
    };

    /// Read-write mode with read-only pwxform S-boxes, as used by Yenten
    pub const RW_PWXFORM: Flags = Flags {
        mode: Mode::ReadWrite,
        sboxes: SboxMode::ReadOnly,
        confirm: true,
    };

    /// Decode yescrypt 0.5 bit flags.
    ///
    /// The confirmation pass runs whenever `t` or any flag is non-zero.
    pub fn from_legacy(bits: u32, t: u32) -> Result<Self, Error> {
        let known = Self::LEGACY_RW | Self::LEGACY_PWXFORM;
        if bits & !known != 0 {
            return Err(Error::UnsupportedFlags(bits & !known));
        }

        let mode = if bits & Self::LEGACY_RW != 0 {
            Mode::ReadWrite
        } else {
            Mode::Classic
        };
        let sboxes = if bits & Self::LEGACY_PWXFORM != 0 {
            SboxMode::ReadOnly
        } else {
            SboxMode::Disabled
        };

        Ok(Self {
            mode,
            sboxes,
            confirm: t != 0 || bits != 0,
        })
    }
}

impl Default for Flags {
    fn default() -> Self {
        Self::CLASSIC
    }
}

/// Memory a computation needs, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    /// Scratch array of one lane: 128 * r * N
    pub scratch: usize,
    /// Both S-boxes of one lane: 2 * Sbytes
    pub sboxes: usize,
    /// Initial block stream shared by all lanes: 128 * r * p
    pub block_stream: usize,
    /// Lanes whose memory is live at the same time
    pub lanes_in_flight: u32,
}

impl Footprint {
    /// Scratch array plus S-boxes of one lane
    pub fn per_lane(&self) -> usize {
        self.scratch + self.sboxes
    }

    /// Peak across all lanes in flight plus the block stream
    pub fn total(&self) -> usize {
        self.per_lane() * self.lanes_in_flight as usize + self.block_stream
    }
}

/// Validated cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Params {
    n: u64,
    r: u32,
    p: u32,
    t: u32,
    g: u32,
    sbox_bytes: usize,
    flags: Flags,
    footprint: Footprint,
}

impl Params {
    /// Start from the Yenten preset and override what is needed
    pub fn builder() -> ParamsBuilder {
        ParamsBuilder::default()
    }

    /// Plain scrypt with the given cost
    pub fn classic(n: u64, r: u32, p: u32) -> Result<Self, Error> {
        Self::builder().n(n).r(r).p(p).flags(Flags::CLASSIC).build()
    }

    /// Yenten proof-of-work: N = 4096, r = 32, p = 1, t = 0, read-write, 4 KiB S-boxes
    pub fn yenten() -> Self {
        Self {
            n: YENTEN_N,
            r: YENTEN_R,
            p: YENTEN_P,
            t: YENTEN_T,
            g: 0,
            sbox_bytes: DEFAULT_SBOX_BYTES,
            flags: Flags::RW_PWXFORM,
            footprint: Footprint {
                scratch: 128 * YENTEN_R as usize * YENTEN_N as usize,
                sboxes: 2 * DEFAULT_SBOX_BYTES,
                block_stream: 128 * YENTEN_R as usize * YENTEN_P as usize,
                lanes_in_flight: lanes_in_flight(YENTEN_P),
            },
        }
    }

    /// Iteration count N
    pub fn n(&self) -> u64 {
        self.n
    }

    /// Block size factor r
    pub fn r(&self) -> u32 {
        self.r
    }

    /// Lane count p
    pub fn p(&self) -> u32 {
        self.p
    }

    /// Extra time cost t
    pub fn t(&self) -> u32 {
        self.t
    }

    /// ROM growth counter g
    pub fn g(&self) -> u32 {
        self.g
    }

    /// Size of each of the two S-boxes, 0 when disabled
    pub fn sbox_bytes(&self) -> usize {
        self.sbox_bytes
    }

    /// Variant selection
    pub fn flags(&self) -> Flags {
        self.flags
    }

    /// Memory needed by one computation
    pub fn footprint(&self) -> Footprint {
        self.footprint
    }

    /// N used by the last pass: N * 4^g
    pub fn final_n(&self) -> u64 {
        self.n << (2 * self.g)
    }

    /// 32-bit words in one block array
    #[inline(always)]
    pub(crate) fn block_array_words(&self) -> usize {
        32 * self.r as usize
    }
}

impl Default for Params {
    fn default() -> Self {
        Self::yenten()
    }
}

#[cfg(feature = "parallel")]
const fn lanes_in_flight(p: u32) -> u32 {
    p
}

#[cfg(not(feature = "parallel"))]
const fn lanes_in_flight(_p: u32) -> u32 {
    1
}

/// Builder for [`Params`]
#[derive(Debug, Clone, Copy)]
pub struct ParamsBuilder {
    n: u64,
    r: u32,
    p: u32,
    t: u32,
    g: u32,
    sbox_bytes: Option<usize>,
    flags: Flags,
    max_memory: Option<usize>,
}

impl Default for ParamsBuilder {
    fn default() -> Self {
        Self {
            n: YENTEN_N,
            r: YENTEN_R,
            p: YENTEN_P,
            t: YENTEN_T,
            g: 0,
            sbox_bytes: None,
            flags: Flags::RW_PWXFORM,
            max_memory: None,
        }
    }
}

impl ParamsBuilder {
    /// Iteration count, power of two, at least 2
    pub fn n(mut self, n: u64) -> Self {
        self.n = n;
        self
    }

    /// Block size factor, at least 1
    pub fn r(mut self, r: u32) -> Self {
        self.r = r;
        self
    }

    /// Lane count, at least 1
    pub fn p(mut self, p: u32) -> Self {
        self.p = p;
        self
    }

    /// Extra time cost
    pub fn t(mut self, t: u32) -> Self {
        self.t = t;
        self
    }

    /// ROM growth counter
    pub fn g(mut self, g: u32) -> Self {
        self.g = g;
        self
    }

    /// Size of each S-box in bytes; 0 disables them
    pub fn sbox_bytes(mut self, bytes: usize) -> Self {
        self.sbox_bytes = Some(bytes);
        self
    }

    /// Variant selection
    pub fn flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Mixing variant only
    pub fn mode(mut self, mode: Mode) -> Self {
        self.flags.mode = mode;
        self
    }

    /// S-box transform only
    pub fn sboxes(mut self, sboxes: SboxMode) -> Self {
        self.flags.sboxes = sboxes;
        self
    }

    /// Confirmation pass only
    pub fn confirm(mut self, confirm: bool) -> Self {
        self.flags.confirm = confirm;
        self
    }

    /// Reject parameter sets whose peak memory exceeds `bytes`
    pub fn max_memory(mut self, bytes: usize) -> Self {
        self.max_memory = Some(bytes);
        self
    }

    /// Validate and freeze the parameter set. Nothing is allocated here.
    pub fn build(self) -> Result<Params, Error> {
        let Self {
            n,
            r,
            p,
            t,
            g,
            sbox_bytes,
            flags,
            max_memory,
        } = self;

        if n < 2 || !n.is_power_of_two() {
            return Err(Error::InvalidN(n));
        }
        if r == 0 {
            return Err(Error::InvalidR);
        }
        if p == 0 {
            return Err(Error::InvalidP);
        }
        if u64::from(r) * u64::from(p) >= 1 << 30 {
            return Err(Error::ParallelismTooLarge { r, p });
        }

        let sbox_bytes = match (flags.sboxes, sbox_bytes) {
            (SboxMode::Disabled, None | Some(0)) => 0,
            (SboxMode::Disabled, Some(bytes)) | (_, Some(bytes @ 0)) => {
                return Err(Error::SboxModeMismatch {
                    mode: flags.sboxes,
                    bytes,
                });
            }
            (_, bytes) => {
                let bytes = bytes.unwrap_or(DEFAULT_SBOX_BYTES);
                if !bytes.is_power_of_two() || !(MIN_SBOX_BYTES..=MAX_SBOX_BYTES).contains(&bytes)
                {
                    return Err(Error::InvalidSboxSize(bytes));
                }
                bytes
            }
        };
        if flags.sboxes.is_enabled() && !flags.mode.is_read_write() {
            return Err(Error::SboxesNeedReadWrite);
        }

        // N * (t + 1) bounds every loop count; g multiplies N by 4 per step
        let overflow = Error::CostOverflow { n, t, g };
        n.checked_mul(u64::from(t) + 1).ok_or(overflow.clone())?;
        let final_n = 4u64
            .checked_pow(g)
            .and_then(|growth| n.checked_mul(growth))
            .ok_or(overflow)?;

        let footprint = footprint(final_n, r, p, sbox_bytes)?;
        if let Some(limit) = max_memory {
            if footprint.total() > limit {
                return Err(Error::MemoryLimitExceeded {
                    required: footprint.total(),
                    limit,
                });
            }
        }

        Ok(Params {
            n,
            r,
            p,
            t,
            g,
            sbox_bytes,
            flags,
            footprint,
        })
    }
}

fn footprint(n: u64, r: u32, p: u32, sbox_bytes: usize) -> Result<Footprint, Error> {
    let array = block_array_size(r);
    let scratch = usize::try_from(n)
        .ok()
        .and_then(|n| n.checked_mul(array))
        .ok_or(Error::MemoryOverflow)?;
    let sboxes = sbox_bytes.checked_mul(2).ok_or(Error::MemoryOverflow)?;
    let block_stream = array
        .checked_mul(p as usize)
        .ok_or(Error::MemoryOverflow)?;
    let lanes = lanes_in_flight(p);

    scratch
        .checked_add(sboxes)
        .and_then(|lane| lane.checked_mul(lanes as usize))
        .and_then(|all| all.checked_add(block_stream))
        .ok_or(Error::MemoryOverflow)?;

    Ok(Footprint {
        scratch,
        sboxes,
        block_stream,
        lanes_in_flight: lanes,
    })
}
