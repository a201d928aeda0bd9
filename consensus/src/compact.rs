//! Compact encoding of difficulty targets.
//!
//! Block headers carry the 256-bit target in a 32-bit floating-point form:
//! the high byte is a base-256 exponent (the byte length of the target), bit
//! 23 is a sign flag, and the low 23 bits are the mantissa. The encoding is
//! lossy by design; consensus only ever stores and compares the compact
//! form, so the precision loss itself is consensus-critical and both
//! directions here are bit-exact with the reference arithmetic.
//!
//! Decoding never fails. Negative and overflowing encodings are reported as
//! flags next to the (truncated) value because the transition checks decode
//! untrusted header bits without consulting the flags, and must see the same
//! truncated value everywhere.

use crate::arith::Target;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The 32-bit difficulty encoding stored in a block header.
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    BorshDeserialize,
    BorshSerialize,
)]
pub struct CompactBits(u32);

impl CompactBits {
    /// Wraps the raw value from a block header.
    pub const fn from_consensus(bits: u32) -> Self {
        CompactBits(bits)
    }

    /// The raw value serialized into block headers.
    pub const fn to_consensus(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for CompactBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CompactBits(0x{:08x})", self.0)
    }
}

impl fmt::LowerHex for CompactBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// Result of expanding compact bits into a full target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodedTarget {
    /// The expanded target, truncated modulo 2^256 when the encoding
    /// overflows.
    pub target: Target,
    /// The sign bit was set on a nonzero mantissa.
    pub negative: bool,
    /// The mantissa carries significant bits beyond the 256-bit range.
    pub overflow: bool,
}

/// Expands compact `bits` into a full target.
///
/// The exponent is the high byte; the mantissa is the low 23 bits with the
/// sign bit masked off. Exponents of three or less shift the mantissa down,
/// larger exponents shift it up by whole bytes. Oversized shifts truncate to
/// zero, matching the reference 256-bit arithmetic.
///
/// Total over all 32-bit inputs; nothing here panics.
pub fn decode_compact(bits: CompactBits) -> DecodedTarget {
    let compact = bits.to_consensus();
    let exponent = (compact >> 24) as usize;
    let mantissa = compact & 0x007f_ffff;

    let target = if exponent <= 3 {
        Target::from_u64(u64::from(mantissa >> (8 * (3 - exponent))))
    } else {
        Target::from_u64(u64::from(mantissa)).shl(8 * (exponent - 3))
    };

    let negative = mantissa != 0 && (compact & 0x0080_0000) != 0;
    let overflow = mantissa != 0
        && (exponent > 34
            || (mantissa > 0xff && exponent > 33)
            || (mantissa > 0xffff && exponent > 32));

    DecodedTarget {
        target,
        negative,
        overflow,
    }
}

/// Encodes a target into its canonical compact form.
///
/// Uses the minimal byte length, then renormalizes one byte down when the
/// mantissa's top bit would read as the sign flag.
pub fn encode_compact(target: Target) -> CompactBits {
    let mut size = (target.bit_len() + 7) / 8;
    let mut compact = if size <= 3 {
        target.low_u64() << (8 * (3 - size))
    } else {
        target.shr(8 * (size - 3)).low_u64()
    };

    if compact & 0x0080_0000 != 0 {
        compact >>= 8;
        size += 1;
    }

    CompactBits::from_consensus(compact as u32 | ((size as u32) << 24))
}
