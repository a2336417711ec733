/// DAG parameters and size schedule

use serde::{Deserialize, Serialize};

use crate::error::{DagError, Result};

pub const WORD_BYTES: usize = 4;
pub const HASH_BYTES: usize = 32;
pub const MIX_BYTES: usize = 64;
/// 32-bit words per node
pub const HASH_WORDS: usize = HASH_BYTES / WORD_BYTES;
/// 32-bit words in the Hashimoto mix
pub const MIX_WORDS: usize = MIX_BYTES / WORD_BYTES;
/// Nodes fetched per Hashimoto access
pub const MIX_HASHES: usize = MIX_BYTES / HASH_BYTES;

/// Tunable constants of the construction.
///
/// The size schedule grows with `round(sqrt(6 * epoch))`, so all fields are
/// consensus-critical for a given network. Fields missing from a
/// deserialized table take their mainnet value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DagParams {
    /// Blocks per epoch
    pub epoch_length: u32,
    pub cache_bytes_init: u64,
    pub cache_bytes_growth: u64,
    pub dataset_bytes_init: u64,
    pub dataset_bytes_growth: u64,
    /// Randomized-memory passes over the cache
    pub cache_rounds: u32,
    /// Cache parents mixed into each dataset node
    pub dataset_parents: u32,
    /// Dataset accesses per Hashimoto run
    pub accesses: u32,
}

impl DagParams {
    /// Production parameters
    pub const fn mainnet() -> Self {
        Self {
            epoch_length: 400,
            cache_bytes_init: 8_388_608,
            cache_bytes_growth: 196_608,
            dataset_bytes_init: 536_870_912,
            dataset_bytes_growth: 12_582_912,
            cache_rounds: 3,
            dataset_parents: 256,
            accesses: 64,
        }
    }

    /// Tiny parameters for tests and local tooling: a 4 KiB cache and a
    /// 64 KiB dataset at epoch 0, with a 4-block epoch.
    pub const fn testing() -> Self {
        Self {
            epoch_length: 4,
            cache_bytes_init: 4_096,
            cache_bytes_growth: 512,
            dataset_bytes_init: 65_536,
            dataset_bytes_growth: 4_096,
            cache_rounds: 3,
            dataset_parents: 256,
            accesses: 64,
        }
    }

    pub fn validate(&self) -> Result<()> {
        let mix = MIX_BYTES as u64;
        if self.epoch_length == 0 {
            return Err(DagError::InvalidParams("epoch_length must be positive".into()));
        }
        for (name, value) in [
            ("cache_bytes_init", self.cache_bytes_init),
            ("dataset_bytes_init", self.dataset_bytes_init),
        ] {
            // Room for at least a few items after the prime search steps down
            if value < 4 * mix || value % mix != 0 {
                return Err(DagError::InvalidParams(format!(
                    "{name} must be a multiple of {mix} and at least {}",
                    4 * mix
                )));
            }
        }
        for (name, value) in [
            ("cache_bytes_growth", self.cache_bytes_growth),
            ("dataset_bytes_growth", self.dataset_bytes_growth),
        ] {
            if value % mix != 0 {
                return Err(DagError::InvalidParams(format!(
                    "{name} must be a multiple of {mix}"
                )));
            }
        }
        if self.cache_rounds == 0 || self.dataset_parents == 0 || self.accesses == 0 {
            return Err(DagError::InvalidParams(
                "cache_rounds, dataset_parents and accesses must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Epoch for block height
    pub fn epoch_of(&self, height: u32) -> u64 {
        (height / self.epoch_length) as u64
    }

    /// Size of the cache in bytes; `size / HASH_BYTES` is prime
    pub fn cache_size(&self, epoch: u64) -> u64 {
        let mut size = self.cache_bytes_init + self.cache_bytes_growth * growth_steps(epoch);
        size -= HASH_BYTES as u64;
        while !is_prime(size / HASH_BYTES as u64) {
            size -= MIX_BYTES as u64;
        }
        size
    }

    /// Size of the full dataset in bytes; `size / MIX_BYTES` is prime
    pub fn dataset_size(&self, epoch: u64) -> u64 {
        let mut size = self.dataset_bytes_init + self.dataset_bytes_growth * growth_steps(epoch);
        size -= MIX_BYTES as u64;
        while !is_prime(size / MIX_BYTES as u64) {
            size -= 2 * MIX_BYTES as u64;
        }
        size
    }

    /// Number of 32-byte items in the cache
    pub fn cache_items(&self, epoch: u64) -> u64 {
        self.cache_size(epoch) / HASH_BYTES as u64
    }

    /// Number of 32-byte nodes in the dataset
    pub fn dataset_items(&self, epoch: u64) -> u64 {
        self.dataset_size(epoch) / HASH_BYTES as u64
    }
}

impl Default for DagParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// `round(sqrt(6 * epoch))`
fn growth_steps(epoch: u64) -> u64 {
    ((6 * epoch) as f64).sqrt().round() as u64
}

/// Trial-division primality check
pub(crate) fn is_prime(n: u64) -> bool {
    if n < 2 {
        return false;
    }
    if n % 2 == 0 {
        return n == 2;
    }
    let mut i = 3u64;
    while i * i <= n {
        if n % i == 0 {
            return false;
        }
        i += 2;
    }
    true
}
