//! Wide-integer arithmetic for difficulty targets.
//!
//! A target is a 256-bit unsigned integer; a block hash, read as an integer,
//! must not exceed it. Retargeting multiplies a target by a clamped timespan
//! and divides by the expected timespan, all in full 256-bit space. Any step
//! whose result would need more than 256 bits is reported as an error rather
//! than wrapped.

use crate::errors::ConsensusError;
use crypto_bigint::{Encoding, U256};
use std::fmt;

/// A 256-bit proof-of-work target. Lower values demand more work.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Target(U256);

impl Target {
    pub const ZERO: Target = Target(U256::ZERO);
    pub const MAX: Target = Target(U256::MAX);

    /// Builds a target from a big-endian hex string of exactly 64 digits.
    pub const fn from_be_hex(hex: &str) -> Self {
        Target(U256::from_be_hex(hex))
    }

    pub fn from_u64(value: u64) -> Self {
        Target(U256::from(value))
    }

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Target(U256::from_be_bytes(bytes))
    }

    /// Reads a block hash (internal byte order) as an integer.
    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        Target(U256::from_le_bytes(bytes))
    }

    pub fn to_be_bytes(self) -> [u8; 32] {
        self.0.to_be_bytes()
    }

    pub fn is_zero(self) -> bool {
        self.0 == U256::ZERO
    }

    /// Number of significant bits.
    pub fn bit_len(self) -> usize {
        self.0.bits()
    }

    /// Least significant 64 bits.
    pub(crate) fn low_u64(self) -> u64 {
        let be = self.0.to_be_bytes();
        let mut word = [0u8; 8];
        word.copy_from_slice(&be[24..]);
        u64::from_be_bytes(word)
    }

    /// Left shift truncating modulo 2^256; shifts of 256 or more yield zero.
    pub(crate) fn shl(self, shift: usize) -> Self {
        Target(self.0.shl_vartime(shift))
    }

    /// Right shift; shifts of 256 or more yield zero.
    pub(crate) fn shr(self, shift: usize) -> Self {
        Target(self.0.shr_vartime(shift))
    }

    /// Multiplies by a timespan scalar in full 256-bit space.
    ///
    /// A product wider than 256 bits is [`ConsensusError::ArithmeticOverflow`];
    /// negative scalars are outside the domain and rejected.
    pub fn checked_mul_i64(self, scalar: i64) -> Result<Self, ConsensusError> {
        if scalar < 0 {
            return Err(ConsensusError::InvalidScalar(scalar));
        }
        let scalar = U256::from(scalar as u64);
        // a * s fits 256 bits iff a <= MAX / s.
        if scalar != U256::ZERO && self.0 > U256::MAX.wrapping_div(&scalar) {
            return Err(ConsensusError::ArithmeticOverflow);
        }
        Ok(Target(self.0.wrapping_mul(&scalar)))
    }

    /// Truncating division by a strictly positive scalar.
    pub fn checked_div_i64(self, scalar: i64) -> Result<Self, ConsensusError> {
        if scalar <= 0 {
            return Err(ConsensusError::InvalidScalar(scalar));
        }
        Ok(Target(self.0.wrapping_div(&U256::from(scalar as u64))))
    }

    /// Expected work for a block at this target: `2^256 / (target + 1)`,
    /// computed as `~target / (target + 1) + 1`.
    ///
    /// The endpoints are pinned: targets of zero and one map to the maximum
    /// work value, the all-ones target to one unit.
    pub fn block_proof(self) -> Target {
        if self.0 == U256::ZERO || self.0 == U256::ONE {
            return Target(U256::MAX);
        }
        if self.0 == U256::MAX {
            return Target(U256::ONE);
        }

        let comp = !self.0;
        Target(
            comp.wrapping_div(&self.0.wrapping_add(&U256::ONE))
                .wrapping_add(&U256::ONE),
        )
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0.to_be_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn mul_stays_in_range_for_valid_retarget_inputs() {
        // Largest mainnet-shaped target times the largest clamped timespan.
        let limit = Target::from_be_hex(
            "00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
        );
        let product = limit.checked_mul_i64(4 * 2016 * 45).unwrap();
        assert!(product > limit);
        assert_eq!(product.checked_div_i64(4 * 2016 * 45).unwrap(), limit);
    }

    #[test]
    fn mul_overflow_is_reported() {
        assert_eq!(
            Target::MAX.checked_mul_i64(2),
            Err(ConsensusError::ArithmeticOverflow)
        );
        assert_eq!(
            Target::MAX.checked_mul_i64(-1),
            Err(ConsensusError::InvalidScalar(-1))
        );
    }

    #[test]
    fn div_rejects_non_positive_scalars() {
        let t = Target::from_u64(1000);
        assert_eq!(t.checked_div_i64(4).unwrap(), Target::from_u64(250));
        assert_eq!(t.checked_div_i64(0), Err(ConsensusError::InvalidScalar(0)));
        assert_eq!(
            t.checked_div_i64(-7),
            Err(ConsensusError::InvalidScalar(-7))
        );
    }

    #[test]
    fn div_truncates() {
        assert_eq!(
            Target::from_u64(7).checked_div_i64(2).unwrap(),
            Target::from_u64(3)
        );
    }

    #[test]
    fn shifts_truncate() {
        let t = Target::from_u64(0x0fffff);
        assert_eq!(t.shl(300), Target::ZERO);
        assert_eq!(t.shl(8).shr(8), t);
        assert_eq!(Target::MAX.shl(8).bit_len(), 256);
    }

    #[test]
    fn block_proof_endpoints() {
        assert_eq!(Target::ZERO.block_proof(), Target::MAX);
        assert_eq!(Target::from_u64(1).block_proof(), Target::MAX);
        assert_eq!(Target::MAX.block_proof(), Target::from_u64(1));
    }

    #[test]
    fn block_proof_known_values() {
        // Work of the Bitcoin mainnet limit target is the classic
        // 0x100010001.
        let btc_limit = Target::from_be_bytes(hex!(
            "00000000FFFF0000000000000000000000000000000000000000000000000000"
        ));
        assert_eq!(
            btc_limit.block_proof(),
            Target::from_u64(0x0001_0001_0001)
        );

        // The PureCoin limit sits at 2^236, so its work is 2^20.
        let limit = Target::from_be_hex(
            "00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff",
        );
        assert_eq!(limit.block_proof(), Target::from_u64(1 << 20));
    }

    #[test]
    fn ordering_follows_numeric_value() {
        let a = Target::from_u64(1);
        let b = Target::from_u64(2);
        let c = b.shl(200);
        assert!(a < b && b < c && c < Target::MAX);
    }

    #[test]
    fn display_is_big_endian_hex() {
        assert_eq!(
            Target::from_u64(0xffff).to_string(),
            "000000000000000000000000000000000000000000000000000000000000ffff"
        );
    }
}
