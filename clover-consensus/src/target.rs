//! 256-bit difficulty targets and their compact ("bits") encoding

use std::fmt;
use std::ops::{Add, Div, Mul, Shl, Shr, Sub};

use num_bigint::BigUint;
use num_traits::{One, Zero};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use clover_hash::Hash256;

use crate::error::ConsensusError;

/// Width of every target, in bits
pub const TARGET_BITS: u64 = 256;

/// Compact encodings a strict decode refuses
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompactError {
    #[error("{0:#010x} has the sign bit set")]
    Negative(u32),

    #[error("{0:#010x} does not fit in 256 bits")]
    Overflow(u32),
}

/// Lenient decode of a compact target, with the flags the strict decode checks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCompact {
    pub target: Target,
    pub negative: bool,
    pub overflow: bool,
}

/// Unsigned 256-bit target; a hash meets it when `hash <= target`
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target(BigUint);

impl Target {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Largest representable target, `2^256 - 1`
    pub fn max_value() -> Self {
        Self((BigUint::one() << TARGET_BITS) - BigUint::one())
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Decode compact bits the way block headers store them.
    ///
    /// The top byte is a base-256 exponent, the low 23 bits are the mantissa
    /// and bit 23 is a sign. Values past 256 bits are truncated; callers that
    /// care must look at the flags.
    pub fn decode_compact(bits: u32) -> DecodedCompact {
        let size = bits >> 24;
        let mut word = bits & 0x007f_ffff;

        let target = if size <= 3 {
            word >>= 8 * (3 - size);
            Self(BigUint::from(word))
        } else {
            Self(BigUint::from(word) << (8 * (size - 3))).truncated()
        };

        let negative = word != 0 && bits & 0x0080_0000 != 0;
        let overflow = word != 0
            && (size > 34 || (word > 0xff && size > 33) || (word > 0xffff && size > 32));

        DecodedCompact {
            target,
            negative,
            overflow,
        }
    }

    /// Strict decode: negative and overflowing encodings are errors
    pub fn from_compact(bits: u32) -> Result<Self, CompactError> {
        let decoded = Self::decode_compact(bits);
        if decoded.negative {
            return Err(CompactError::Negative(bits));
        }
        if decoded.overflow {
            return Err(CompactError::Overflow(bits));
        }
        Ok(decoded.target)
    }

    /// Normalized compact encoding; the mantissa never carries the sign bit
    pub fn to_compact(&self) -> u32 {
        let mut size = (self.bits() + 7) / 8;
        let mut compact = if size <= 3 {
            low_u64(&self.0) << (8 * (3 - size))
        } else {
            low_u64(&(&self.0 >> (8 * (size - 3))))
        };

        if compact & 0x0080_0000 != 0 {
            compact >>= 8;
            size += 1;
        }

        (compact as u32 & 0x007f_ffff) | ((size as u32) << 24)
    }

    /// Interpret a hash as a little-endian 256-bit number
    pub fn from_hash_le(hash: &Hash256) -> Self {
        Self(BigUint::from_bytes_le(hash.as_bytes()))
    }

    /// Parse a big-endian hex number, with or without `0x`
    pub fn from_hex_be(hex: &str) -> Result<Self, ConsensusError> {
        let digits = hex.trim_start_matches("0x");
        if digits.is_empty() || digits.len() > 64 {
            return Err(ConsensusError::InvalidHex(hex.to_string()));
        }
        BigUint::parse_bytes(digits.as_bytes(), 16)
            .map(Self)
            .ok_or_else(|| ConsensusError::InvalidHex(hex.to_string()))
    }

    /// Zero-padded 64-digit big-endian hex
    pub fn to_hex_be(&self) -> String {
        format!("{:064x}", self.0)
    }

    /// Position of the highest set bit plus one
    pub fn bits(&self) -> u64 {
        self.0.bits()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// True when `hash`, read little-endian, does not exceed this target
    pub fn is_met_by(&self, hash: &Hash256) -> bool {
        Self::from_hash_le(hash) <= *self
    }

    fn truncated(self) -> Self {
        if self.0.bits() > TARGET_BITS {
            let mask = (BigUint::one() << TARGET_BITS) - BigUint::one();
            Self(self.0 & mask)
        } else {
            self
        }
    }
}

fn low_u64(value: &BigUint) -> u64 {
    value.iter_u64_digits().next().unwrap_or(0)
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex_be())
    }
}

impl Add for Target {
    type Output = Target;

    fn add(self, rhs: Target) -> Target {
        Target(self.0 + rhs.0)
    }
}

/// Panics on underflow, like any unsigned subtraction
impl Sub for Target {
    type Output = Target;

    fn sub(self, rhs: Target) -> Target {
        Target(self.0 - rhs.0)
    }
}

impl Mul<u64> for Target {
    type Output = Target;

    fn mul(self, rhs: u64) -> Target {
        Target(self.0 * rhs)
    }
}

impl Div<u64> for Target {
    type Output = Target;

    fn div(self, rhs: u64) -> Target {
        Target(self.0 / rhs)
    }
}

impl Shr<u32> for Target {
    type Output = Target;

    fn shr(self, rhs: u32) -> Target {
        Target(self.0 >> rhs)
    }
}

impl Shl<u32> for Target {
    type Output = Target;

    fn shl(self, rhs: u32) -> Target {
        Target(self.0 << rhs)
    }
}

impl Serialize for Target {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_be())
    }
}

impl<'de> Deserialize<'de> for Target {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Target::from_hex_be(&s).map_err(de::Error::custom)
    }
}
