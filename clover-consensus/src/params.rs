//! Per-network consensus parameters read by the verifier and the retargeting rules

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ConsensusError, Result};
use crate::target::Target;

/// Version bit that selects the memory-hard proof of work
pub const MEMORY_HARD_VERSION_BIT: i32 = 0x0000_0100;

const MAINNET_POW_LIMIT: &str = "00000fffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";
const REGTEST_POW_LIMIT: &str = "7fffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff";

/// Supported networks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
    Regtest,
}

impl Network {
    pub fn params(self) -> ConsensusParams {
        match self {
            Network::Mainnet => ConsensusParams::mainnet(),
            Network::Testnet => ConsensusParams::testnet(),
            Network::Regtest => ConsensusParams::regtest(),
        }
    }
}

impl FromStr for Network {
    type Err = ConsensusError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "regtest" => Ok(Network::Regtest),
            other => Err(ConsensusError::UnknownNetwork(other.to_string())),
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Regtest => "regtest",
        };
        f.write_str(name)
    }
}

/// Target DUAL_KGW3 falls back to when a block is overdue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReliefTarget {
    PowLimit,
    PowLimitDivided(u64),
}

impl ReliefTarget {
    pub fn resolve(self, pow_limit: &Target) -> Target {
        match self {
            ReliefTarget::PowLimit => pow_limit.clone(),
            ReliefTarget::PowLimitDivided(divisor) => pow_limit.clone() / divisor.max(1),
        }
    }
}

/// Consensus parameters for one network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusParams {
    /// Easiest allowed target
    pub pow_limit: Target,

    /// Desired seconds between blocks
    pub pow_target_spacing: i64,

    /// Retarget timespan of the fixed-window rule
    pub pow_target_timespan_v1: i64,

    /// Timespan Kimoto Gravity Well scales against
    pub pow_target_timespan_v2: i64,

    /// First height of the memory-hard era, retargeted by Kimoto Gravity Well
    pub memory_hard_switch_height: u32,

    /// Testnet-style minimum difficulty blocks; also selects DUAL_KGW3
    pub allow_min_difficulty_blocks: bool,

    /// Keep the previous block's bits forever
    pub no_retargeting: bool,

    /// Version bit marking memory-hard headers
    pub memory_hard_version_bit: i32,

    /// Seconds past the previous block after which DUAL_KGW3 relief applies
    pub dual_long_time_limit: i64,

    pub dual_relief: ReliefTarget,
}

impl ConsensusParams {
    pub fn mainnet() -> Self {
        Self {
            pow_limit: limit(MAINNET_POW_LIMIT),
            pow_target_spacing: 5 * 60,
            pow_target_timespan_v1: 10 * 60,
            pow_target_timespan_v2: 60 * 60,
            memory_hard_switch_height: 30_000,
            allow_min_difficulty_blocks: false,
            no_retargeting: false,
            memory_hard_version_bit: MEMORY_HARD_VERSION_BIT,
            dual_long_time_limit: 30 * 60,
            dual_relief: ReliefTarget::PowLimitDivided(15),
        }
    }

    pub fn testnet() -> Self {
        Self {
            memory_hard_switch_height: 1_000,
            ..Self::mainnet()
        }
    }

    pub fn regtest() -> Self {
        Self {
            pow_limit: limit(REGTEST_POW_LIMIT),
            pow_target_spacing: 150,
            memory_hard_switch_height: u32::MAX,
            allow_min_difficulty_blocks: true,
            no_retargeting: true,
            ..Self::mainnet()
        }
    }

    /// Blocks between fixed-window retargets
    pub fn difficulty_adjustment_interval(&self) -> i64 {
        (self.pow_target_timespan_v1 / self.pow_target_spacing.max(1)).max(1)
    }

    /// Compact encoding of the power limit
    pub fn pow_limit_bits(&self) -> u32 {
        self.pow_limit.to_compact()
    }

    pub fn is_memory_hard(&self, version: i32) -> bool {
        version & self.memory_hard_version_bit != 0
    }

    /// Reject parameters the retargeting rules cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pow_limit.is_zero() {
            return Err(ConsensusError::InvalidParams("pow_limit must be non-zero".into()));
        }
        // Upper bound keeps the clamp arithmetic inside i64
        let max = i64::from(u32::MAX);
        for (name, value) in [
            ("pow_target_spacing", self.pow_target_spacing),
            ("pow_target_timespan_v1", self.pow_target_timespan_v1),
            ("pow_target_timespan_v2", self.pow_target_timespan_v2),
        ] {
            if !(1..=max).contains(&value) {
                return Err(ConsensusError::InvalidParams(format!(
                    "{name} must be between 1 and {max} seconds, got {value}"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ConsensusParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

fn limit(hex: &str) -> Target {
    // Constants above are 64 valid hex digits
    Target::from_hex_be(hex).unwrap_or_else(|_| Target::max_value())
}
