//! Proof-of-work verification

use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use clover_hash::{BlockHeader, EpochCacheManager, HashimotoMode};

use crate::error::{ConsensusError, Result};
use crate::params::ConsensusParams;
use crate::target::Target;

/// How much work verification is allowed to do
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyOptions {
    /// Read nodes from the full dataset and decide on the Hashimoto result alone
    pub fast: bool,
    /// Do not compare the header's claimed mix with the recomputed one
    pub skip_mix_check: bool,
}

impl VerifyOptions {
    pub fn fast() -> Self {
        Self {
            fast: true,
            ..Self::default()
        }
    }

    fn mode(&self) -> HashimotoMode {
        if self.fast {
            HashimotoMode::Dataset
        } else {
            HashimotoMode::Cache
        }
    }
}

/// Decode `bits` and check it against the network's power limit
pub fn check_target(bits: u32, params: &ConsensusParams) -> Result<Target> {
    let target = Target::from_compact(bits)?;
    if target.is_zero() {
        return Err(ConsensusError::ZeroTarget(bits));
    }
    if target > params.pow_limit {
        return Err(ConsensusError::TargetAboveLimit { bits });
    }
    Ok(target)
}

/// Validate the proof of work of `header`.
///
/// Memory-hard headers are run through Hashimoto first and must carry the
/// right mix. In fast mode the Hashimoto result alone decides; otherwise the
/// header must also meet the target with its legacy proof hash, which is the
/// only check headers without the memory-hard bit get.
pub fn verify_proof_of_work(
    header: &BlockHeader,
    params: &ConsensusParams,
    manager: &EpochCacheManager,
    options: VerifyOptions,
) -> Result<()> {
    let target = check_target(header.bits, params)?;

    if params.is_memory_hard(header.version) {
        let res = manager.hashimoto(header, options.mode());

        if !options.skip_mix_check && header.hash_mix != res.cmix {
            return Err(ConsensusError::MixMismatch {
                claimed: header.hash_mix,
                computed: res.cmix,
            });
        }

        if options.fast {
            return if target.is_met_by(&res.result) {
                Ok(())
            } else {
                Err(ConsensusError::InsufficientWork)
            };
        }
    }

    if target.is_met_by(&header.pow_hash()) {
        Ok(())
    } else {
        Err(ConsensusError::InsufficientWork)
    }
}

/// Boolean form of [`verify_proof_of_work`]; rejections are logged at debug level
pub fn check_proof_of_work(
    header: &BlockHeader,
    params: &ConsensusParams,
    manager: &EpochCacheManager,
    options: VerifyOptions,
) -> bool {
    match verify_proof_of_work(header, params, manager, options) {
        Ok(()) => true,
        Err(e) => {
            debug!(
                height = header.height,
                nonce = header.nonce,
                bits = format_args!("{:08x}", header.bits),
                "Proof of work rejected: {}",
                e
            );
            false
        }
    }
}

/// Search `nonces` for a header that passes verification.
///
/// Memory-hard headers get the recomputed mix filled in before each check.
/// Returns the solved header, or `None` when the range is exhausted.
pub fn solve(
    header: &BlockHeader,
    params: &ConsensusParams,
    manager: &EpochCacheManager,
    options: VerifyOptions,
    nonces: Range<u32>,
) -> Option<BlockHeader> {
    check_target(header.bits, params).ok()?;

    let memory_hard = params.is_memory_hard(header.version);
    if memory_hard {
        manager.prewarm(header.height, options.fast);
    }

    info!(
        height = header.height,
        bits = format_args!("{:08x}", header.bits),
        memory_hard,
        "Searching nonces {}..{}",
        nonces.start,
        nonces.end
    );

    let mut candidate = header.clone();
    for nonce in nonces {
        candidate.nonce = nonce;
        if memory_hard {
            candidate.hash_mix = manager.hashimoto(&candidate, options.mode()).cmix;
        }
        if verify_proof_of_work(&candidate, params, manager, options).is_ok() {
            info!(nonce, "Found valid nonce");
            return Some(candidate);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use clover_hash::{DagParams, Hash128};
    use hex_literal::hex;

    fn regtest_header(nonce: u32) -> BlockHeader {
        let mut header = BlockHeader::test_header(0);
        header.bits = 0x207f_ffff;
        header.nonce = nonce;
        header
    }

    #[test]
    fn test_check_target() {
        let params = ConsensusParams::mainnet();
        assert!(check_target(0x1d00_ffff, &params).is_ok());
        assert!(check_target(0x1e0f_ffff, &params).is_ok());
        assert_eq!(
            check_target(0x1e10_0000, &params),
            Err(ConsensusError::TargetAboveLimit { bits: 0x1e10_0000 })
        );
        assert_eq!(check_target(0, &params), Err(ConsensusError::ZeroTarget(0)));
        assert!(matches!(
            check_target(0x04923456, &params),
            Err(ConsensusError::InvalidBits(_))
        ));
    }

    #[test]
    fn test_mix_is_checked_before_work() {
        let manager = EpochCacheManager::new(DagParams::testing());
        let params = ConsensusParams::regtest();
        let mut header = regtest_header(2);
        header.hash_mix = Hash128::from_bytes([0xab; 16]);

        let err = verify_proof_of_work(&header, &params, &manager, VerifyOptions::default());
        assert_eq!(
            err,
            Err(ConsensusError::MixMismatch {
                claimed: Hash128::from_bytes([0xab; 16]),
                computed: Hash128::from_bytes(hex!("4dc8d280d78393242370c96b034c4db4")),
            })
        );

        let skip = VerifyOptions {
            skip_mix_check: true,
            ..VerifyOptions::default()
        };
        assert!(verify_proof_of_work(&header, &params, &manager, skip).is_ok());
    }

    #[test]
    fn test_solve_fills_mix() {
        let manager = EpochCacheManager::new(DagParams::testing());
        let params = ConsensusParams::regtest();

        let solved = solve(&regtest_header(0), &params, &manager, VerifyOptions::fast(), 0..16)
            .unwrap();
        assert_eq!(solved.nonce, 2);
        assert_eq!(
            solved.hash_mix,
            Hash128::from_bytes(hex!("4dc8d280d78393242370c96b034c4db4"))
        );
        assert!(check_proof_of_work(&solved, &params, &manager, VerifyOptions::fast()));

        let slow = solve(&regtest_header(0), &params, &manager, VerifyOptions::default(), 0..16)
            .unwrap();
        assert_eq!(slow.nonce, 1);
    }

    #[test]
    fn test_solve_gives_up() {
        let manager = EpochCacheManager::new(DagParams::testing());
        let params = ConsensusParams::mainnet();
        let mut header = BlockHeader::test_header(0);
        header.version = 0;
        assert!(solve(&header, &params, &manager, VerifyOptions::default(), 0..4).is_none());

        header.bits = 0x2100_ffff;
        assert!(solve(&header, &params, &manager, VerifyOptions::default(), 0..u32::MAX).is_none());
    }
}
