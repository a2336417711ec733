//! Fixed-window retarget used before the algorithm switch

use tracing::debug;

use crate::chain::ChainIndex;
use crate::params::ConsensusParams;
use crate::target::Target;

/// Clamp an observed timespan to `[timespan / 4, timespan * 4]`
pub fn clamp_timespan(actual: i64, timespan: i64) -> i64 {
    actual.clamp(timespan / 4, timespan * 4)
}

/// Next bits under the fixed-window rule
pub fn next_work_legacy<C: ChainIndex>(
    last: &C,
    candidate_time: i64,
    params: &ConsensusParams,
) -> u32 {
    let limit_bits = params.pow_limit_bits();
    if last.height() == 0 {
        return limit_bits;
    }

    let interval = params.difficulty_adjustment_interval();
    let next_height = i64::from(last.height()) + 1;

    if next_height % interval != 0 {
        if params.allow_min_difficulty_blocks {
            if candidate_time > last.time() + params.pow_target_spacing * 2 {
                return limit_bits;
            }
            // Last block not mined under the minimum difficulty rule
            return last
                .ancestors()
                .find(|block| {
                    block.prev().is_none()
                        || i64::from(block.height()) % interval == 0
                        || block.bits() != limit_bits
                })
                .map_or(last.bits(), |block| block.bits());
        }
        return last.bits();
    }

    // Go back the full window, one block less on the first retarget after genesis
    let blocks_back = if next_height == interval {
        interval - 1
    } else {
        interval
    };

    match last.back(blocks_back as usize) {
        Some(first) => calculate_next_work_required(last, first.time(), params),
        None => {
            debug!(
                height = last.height(),
                "Not enough history for a retarget window, using power limit"
            );
            limit_bits
        }
    }
}

/// Scale the last target by the clamped time the window took
pub fn calculate_next_work_required<C: ChainIndex>(
    last: &C,
    first_block_time: i64,
    params: &ConsensusParams,
) -> u32 {
    if params.no_retargeting {
        return last.bits();
    }

    let timespan = params.pow_target_timespan_v1;
    let actual = clamp_timespan(last.time() - first_block_time, timespan);

    let limit = &params.pow_limit;
    let mut target = Target::decode_compact(last.bits()).target;

    // Keep the intermediate product within one bit of the limit
    let shift = target.bits() + 1 > limit.bits();
    if shift {
        target = target >> 1;
    }
    target = target * actual as u64 / timespan as u64;
    if shift {
        target = target << 1;
    }

    if target > *limit {
        target = limit.clone();
    }

    let bits = target.to_compact();
    debug!(
        height = last.height() + 1,
        actual_timespan = actual,
        before = format_args!("{:08x}", last.bits()),
        after = format_args!("{:08x}", bits),
        "Legacy retarget"
    );
    bits
}
