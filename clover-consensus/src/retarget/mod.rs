//! Difficulty retargeting
//!
//! Three independent rules, each a pure function of the chain history, the
//! candidate block time and the network parameters. [`select_algorithm`] is
//! the only place that decides which one runs.

pub mod dual_kgw3;
pub mod kgw;
pub mod legacy;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::chain::ChainIndex;
use crate::params::ConsensusParams;

pub use self::dual_kgw3::next_work_dual_kgw3;
pub use self::kgw::next_work_kgw;
pub use self::legacy::{calculate_next_work_required, next_work_legacy};

/// Retarget rule applied to the next block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetargetAlgorithm {
    /// Difficulty never changes
    Fixed,
    Legacy,
    KimotoGravityWell,
    DualKgw3,
}

/// Pick the rule for a block at `next_height`.
///
/// Disabled retargeting wins over everything. Minimum-difficulty networks
/// run DUAL_KGW3 at every height. Everything else switches from the legacy
/// rule to Kimoto Gravity Well at `memory_hard_switch_height`.
pub fn select_algorithm(next_height: u32, params: &ConsensusParams) -> RetargetAlgorithm {
    match (params.no_retargeting, params.allow_min_difficulty_blocks) {
        (true, _) => RetargetAlgorithm::Fixed,
        (false, true) => RetargetAlgorithm::DualKgw3,
        (false, false) if next_height >= params.memory_hard_switch_height => {
            RetargetAlgorithm::KimotoGravityWell
        }
        (false, false) => RetargetAlgorithm::Legacy,
    }
}

/// Compact target required of the block following `last`
pub fn get_next_work_required<C: ChainIndex>(
    last: &C,
    candidate_time: i64,
    params: &ConsensusParams,
) -> u32 {
    let next_height = last.height().saturating_add(1);
    let algorithm = select_algorithm(next_height, params);
    debug!(next_height, ?algorithm, "Selecting retarget algorithm");

    match algorithm {
        RetargetAlgorithm::Fixed => last.bits(),
        RetargetAlgorithm::Legacy => next_work_legacy(last, candidate_time, params),
        RetargetAlgorithm::KimotoGravityWell => next_work_kgw(last, params),
        RetargetAlgorithm::DualKgw3 => next_work_dual_kgw3(last, candidate_time, params),
    }
}
