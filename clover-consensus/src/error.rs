use thiserror::Error;

use clover_hash::Hash128;

use crate::target::CompactError;

/// Reasons a header fails proof-of-work validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConsensusError {
    #[error("Invalid compact target: {0}")]
    InvalidBits(#[from] CompactError),

    #[error("Compact target {0:#010x} decodes to zero")]
    ZeroTarget(u32),

    #[error("Target {bits:#010x} is above the network power limit")]
    TargetAboveLimit { bits: u32 },

    #[error("Claimed mix {claimed} does not match computed mix {computed}")]
    MixMismatch { claimed: Hash128, computed: Hash128 },

    #[error("Proof hash does not meet the target")]
    InsufficientWork,

    #[error("Unknown network: {0}")]
    UnknownNetwork(String),

    #[error("Invalid target hex: {0}")]
    InvalidHex(String),

    #[error("Invalid consensus parameters: {0}")]
    InvalidParams(String),
}

pub type Result<T> = std::result::Result<T, ConsensusError>;
