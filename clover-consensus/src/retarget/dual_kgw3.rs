//! DUAL_KGW3: Kimoto-style weighted average blended with a one-block adjustment

use tracing::{debug, warn};

use crate::chain::ChainIndex;
use crate::params::ConsensusParams;
use crate::target::Target;

/// Shortest history window, in seconds
const PAST_SECONDS_MIN: i64 = 2_160;
/// Longest history window, in seconds
const PAST_SECONDS_MAX: i64 = 7 * 86_400;

/// Accelerator applied after a suspiciously fast block
const ACCELERATOR_NUM: u64 = 85;
const ACCELERATOR_DEN: u64 = 100;

/// Envelope the rate ratio may move in before the walk stops
pub fn event_horizon_deviation(mass: i64) -> f64 {
    1.0 + 0.7084 * (mass as f64 / 72.0).powf(-1.228)
}

/// Window-walk state: weighted difficulty average and last measured rates
struct Window {
    average: Target,
    actual_seconds: i64,
    target_seconds: i64,
}

fn walk_window<C: ChainIndex>(last: &C, spacing: i64, blocks_min: i64, blocks_max: i64) -> Window {
    let mut mass = 0i64;
    let mut average = Target::zero();
    let mut actual_seconds = 0i64;
    let mut target_seconds = 0i64;

    for (i, reading) in (1i64..).zip(last.ancestors()) {
        if reading.height() == 0 || (blocks_max > 0 && i > blocks_max) {
            break;
        }
        mass += 1;

        let sample = Target::decode_compact(reading.bits()).target;
        average = if i == 1 {
            sample
        } else if sample >= average {
            (sample - average.clone()) / i as u64 + average
        } else {
            average.clone() - (average - sample) / i as u64
        };

        actual_seconds = (last.time() - reading.time()).max(0);
        target_seconds = spacing * mass;
        let ratio = if actual_seconds != 0 && target_seconds != 0 {
            target_seconds as f64 / actual_seconds as f64
        } else {
            1.0
        };

        let fast = event_horizon_deviation(mass);
        let slow = 1.0 / fast;
        if mass >= blocks_min && (ratio <= slow || ratio >= fast) {
            break;
        }
    }

    Window {
        average,
        actual_seconds,
        target_seconds,
    }
}

/// Next bits under DUAL_KGW3
pub fn next_work_dual_kgw3<C: ChainIndex>(
    last: &C,
    candidate_time: i64,
    params: &ConsensusParams,
) -> u32 {
    let limit = &params.pow_limit;
    let spacing = params.pow_target_spacing.max(1);
    let blocks_min = PAST_SECONDS_MIN / spacing;
    let blocks_max = PAST_SECONDS_MAX / spacing;

    let prev = match last.prev() {
        Some(prev) if i64::from(last.height()) >= blocks_min => prev,
        _ => return limit.to_compact(),
    };

    let window = walk_window(last, spacing, blocks_min, blocks_max);

    // Long window: weighted average scaled by the observed rate
    let mut long = window.average;
    if window.actual_seconds != 0 && window.target_seconds != 0 {
        long = long * window.actual_seconds as u64 / window.target_seconds as u64;
    }

    // Short window: last block interval, bounded to [spacing/3, spacing*3]
    let short_interval = last.time() - prev.time();
    let clamped = if short_interval < 0 {
        spacing
    } else {
        short_interval
    }
    .clamp(spacing / 3, spacing * 3);
    let short = Target::decode_compact(last.bits()).target * clamped as u64 / spacing as u64;

    let mut target = (short + long) / 2;

    if short_interval < spacing / 6 {
        target = target * ACCELERATOR_NUM / ACCELERATOR_DEN;
    }

    if candidate_time - last.time() > params.dual_long_time_limit {
        target = params.dual_relief.resolve(limit);
        warn!(
            height = last.height() + 1,
            bits = format_args!("{:08x}", target.to_compact()),
            "Maximum block time hit, applying difficulty relief"
        );
    }

    if target > *limit {
        warn!(
            wanted = format_args!("{:08x}", target.to_compact()),
            limit = format_args!("{:08x}", limit.to_compact()),
            "DUAL_KGW3 target above power limit, clamping"
        );
        target = limit.clone();
    }

    let bits = target.to_compact();
    debug!(
        height = last.height() + 1,
        short_interval,
        before = format_args!("{:08x}", last.bits()),
        after = format_args!("{:08x}", bits),
        "DUAL_KGW3 retarget"
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

    fn params() -> ConsensusParams {
        ConsensusParams {
            allow_min_difficulty_blocks: true,
            ..ConsensusParams::mainnet()
        }
    }

    #[test]
    fn test_deviation_envelope() {
        assert!((event_horizon_deviation(72) - 1.7084).abs() < 1e-12);
        assert!(event_horizon_deviation(7) > event_horizon_deviation(500));
        assert!(event_horizon_deviation(2016) > 1.0);
    }

    #[test]
    fn test_known_schedules() {
        let cases = [(300, 0x1d00_fd62), (30, 0x1c2d_efe4), (600, 0x1d01_fac4)];
        for (spacing, expected) in cases {
            let tip = spaced_chain(50, spacing, 0x1d00_ffff);
            assert_eq!(
                next_work_dual_kgw3(tip.as_ref(), tip.time() + spacing, &params()),
                expected,
                "spacing {spacing}"
            );
        }
    }

    #[test]
    fn test_overdue_block_gets_relief() {
        let tip = spaced_chain(50, 600, 0x1d00_ffff);
        let bits = next_work_dual_kgw3(tip.as_ref(), tip.time() + 1801, &params());
        let params = params();
        assert_eq!(bits, (params.pow_limit.clone() / 15).to_compact());
        assert_eq!(bits, 0x1e01_1111);
    }

    #[test]
    fn test_exactly_at_time_limit_no_relief() {
        let tip = spaced_chain(50, 600, 0x1d00_ffff);
        let bits = next_work_dual_kgw3(tip.as_ref(), tip.time() + 1800, &params());
        assert_eq!(bits, 0x1d01_fac4);
    }

    #[test]
    fn test_short_history_uses_limit() {
        let tip = spaced_chain(6, 300, 0x1d00_ffff);
        assert_eq!(
            next_work_dual_kgw3(tip.as_ref(), tip.time() + 300, &params()),
            0x1e0f_ffff
        );
    }

    #[test]
    fn test_result_never_exceeds_limit() {
        let tip = spaced_chain(50, 900, 0x1e0f_ffff);
        assert_eq!(
            next_work_dual_kgw3(tip.as_ref(), tip.time() + 900, &params()),
            0x1e0f_ffff
        );
    }
}
