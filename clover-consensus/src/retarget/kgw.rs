//! Kimoto Gravity Well, the retarget used after the algorithm switch

use tracing::debug;

use crate::chain::ChainIndex;
use crate::params::ConsensusParams;
use crate::target::Target;

/// Clamp an observed timespan to `[0.75, 1.5]` of the target timespan
pub fn clamp_kgw_timespan(actual: i64, timespan: i64) -> i64 {
    actual.clamp(timespan - timespan / 4, timespan + timespan / 2)
}

/// Next bits under Kimoto Gravity Well.
///
/// The window is `pow_target_spacing` blocks long (one less on the very
/// first retarget) and its elapsed time is compared with
/// `pow_target_timespan_v2`.
pub fn next_work_kgw<C: ChainIndex>(last: &C, params: &ConsensusParams) -> u32 {
    let limit_bits = params.pow_limit_bits();
    if last.height() == 0 {
        return limit_bits;
    }

    let window = params.pow_target_spacing;
    let timespan = params.pow_target_timespan_v2;

    let blocks_back = if i64::from(last.height()) + 1 == window {
        window - 1
    } else {
        window
    };

    let first = match last.back(blocks_back.max(0) as usize) {
        Some(first) => first,
        None => {
            debug!(
                height = last.height(),
                window, "Not enough history for Kimoto Gravity Well, using power limit"
            );
            return limit_bits;
        }
    };

    let actual = clamp_kgw_timespan(last.time() - first.time(), timespan);

    let before = Target::decode_compact(last.bits()).target;
    let mut target = before * actual as u64 / timespan as u64;
    if target > params.pow_limit {
        target = params.pow_limit.clone();
    }

    let bits = target.to_compact();
    debug!(
        height = last.height() + 1,
        actual_timespan = actual,
        target_timespan = timespan,
        before = format_args!("{:08x}", last.bits()),
        after = format_args!("{:08x}", bits),
        "Kimoto Gravity Well retarget"
    );
    bits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::{HistoryBlock, IndexEntry};
    use std::sync::Arc;

    fn spaced_chain(len: usize, spacing: i64, bits: u32) -> Arc<IndexEntry> {
        let history: Vec<HistoryBlock> = (0..len)
            .map(|i| HistoryBlock {
                time: i as i64 * spacing,
                bits,
            })
            .collect();
        IndexEntry::from_history(&history).unwrap()
    }

    #[test]
    fn test_on_schedule_chain_hits_upper_clamp() {
        // 300 blocks at 300s is far past 1.5x the 3600s timespan
        let tip = spaced_chain(401, 300, 0x1d00_ffff);
        assert_eq!(next_work_kgw(tip.as_ref(), &ConsensusParams::mainnet()), 0x1d01_7ffe);
    }

    #[test]
    fn test_fast_chain_hits_lower_clamp() {
        let tip = spaced_chain(401, 10, 0x1d00_ffff);
        assert_eq!(next_work_kgw(tip.as_ref(), &ConsensusParams::mainnet()), 0x1d00_d554);
    }

    #[test]
    fn test_first_window_reaches_genesis() {
        let tip = spaced_chain(300, 10, 0x1d00_ffff);
        assert_eq!(tip.height() + 1, 300);
        assert_eq!(next_work_kgw(tip.as_ref(), &ConsensusParams::mainnet()), 0x1d00_d49e);
    }

    #[test]
    fn test_short_history_and_genesis_use_limit() {
        let params = ConsensusParams::mainnet();
        let tip = spaced_chain(50, 300, 0x1d00_ffff);
        assert_eq!(next_work_kgw(tip.as_ref(), &params), 0x1e0f_ffff);

        let genesis = IndexEntry::genesis(0, 0x1d00_ffff);
        assert_eq!(next_work_kgw(genesis.as_ref(), &params), 0x1e0f_ffff);
    }

    #[test]
    fn test_clamped_to_limit() {
        let tip = spaced_chain(401, 300, 0x1e0f_ffff);
        assert_eq!(next_work_kgw(tip.as_ref(), &ConsensusParams::mainnet()), 0x1e0f_ffff);
    }

    #[test]
    fn test_kgw_clamp_bounds() {
        assert_eq!(clamp_kgw_timespan(0, 3600), 2700);
        assert_eq!(clamp_kgw_timespan(100_000, 3600), 5400);
        assert_eq!(clamp_kgw_timespan(3000, 3600), 3000);
    }
}
