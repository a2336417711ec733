//! Consensus rules around Cloverhash: compact targets, proof-of-work
//! verification and difficulty retargeting.
//!
//! ```
//! use clover_consensus::{get_next_work_required, ConsensusParams, IndexEntry};
//!
//! let params = ConsensusParams::mainnet();
//! let genesis = IndexEntry::genesis(1_500_000_000, 0x1e0f_ffff);
//! assert_eq!(get_next_work_required(genesis.as_ref(), 1_500_000_300, &params), 0x1e0f_ffff);
//! ```

pub mod chain;
pub mod error;
pub mod params;
pub mod pow;
pub mod retarget;
pub mod target;

pub use chain::{Ancestors, ChainIndex, HistoryBlock, IndexEntry};
pub use error::{ConsensusError, Result};
pub use params::{ConsensusParams, Network, ReliefTarget, MEMORY_HARD_VERSION_BIT};
pub use pow::{check_proof_of_work, check_target, solve, verify_proof_of_work, VerifyOptions};
pub use retarget::{get_next_work_required, select_algorithm, RetargetAlgorithm};
pub use target::{CompactError, DecodedCompact, Target};
