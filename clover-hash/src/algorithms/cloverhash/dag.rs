/// Seed chain, cache generation, node derivation and full dataset construction
///
/// The dataset is a pure function of the cache: every node can be derived
/// on demand (slow, small) or read from a materialized dataset (fast, large).

use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

use rayon::prelude::*;
use tracing::{debug, info};

use super::fnv::fnv;
use super::hashing::chain_hash;
use super::node::{DagNode, NodeSource};
use super::params::{DagParams, HASH_BYTES, HASH_WORDS};
use crate::common::hash_types::Hash256;

/// Nodes generated per parallel batch when building a dataset
const DATASET_CHUNK_ITEMS: usize = 1 << 16;

/// One step of the seed chain
pub fn next_seed(seed: &Hash256) -> Hash256 {
    Hash256::from_bytes(chain_hash(seed.as_bytes()))
}

/// Advance `ancestor` by `steps` links of the seed chain
pub fn advance_seed(ancestor: Hash256, steps: u64) -> Hash256 {
    (0..steps).fold(ancestor, |seed, _| next_seed(&seed))
}

/// Seed for `epoch`, derived directly from the all-zero epoch 0 seed
pub fn seed_hash(epoch: u64) -> Hash256 {
    advance_seed(Hash256::default(), epoch)
}

/// Pseudo-random cache for one epoch
pub struct DagCache {
    epoch: u64,
    items: Vec<[u8; HASH_BYTES]>,
    dataset_parents: u32,
}

impl DagCache {
    /// Generate cache of `params.cache_size(epoch)` bytes from the epoch seed
    pub fn new(params: &DagParams, epoch: u64, seed: &Hash256) -> Self {
        let cache_size = params.cache_size(epoch);
        let n = (cache_size / HASH_BYTES as u64) as usize;

        info!(
            "Generating DAG cache for epoch {}, size: {} KB",
            epoch,
            cache_size / 1024
        );

        // Sequential hash chain seeded from the epoch seed
        let mut items = vec![[0u8; HASH_BYTES]; n];
        items[0] = chain_hash(seed.as_bytes());
        for i in 1..n {
            items[i] = chain_hash(&items[i - 1]);
        }

        // Randomized-memory passes; updates are visible to later items in the same pass
        for _ in 0..params.cache_rounds {
            for i in 0..n {
                let target = items[i][0] as usize % n;
                let prev = (i + n - 1) % n;

                let mut mixed = [0u8; HASH_BYTES];
                for (k, byte) in mixed.iter_mut().enumerate() {
                    *byte = items[prev][k] ^ items[target][k];
                }
                items[i] = chain_hash(&mixed);
            }
        }

        DagCache {
            epoch,
            items,
            dataset_parents: params.dataset_parents,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of 32-byte items
    pub fn items(&self) -> u64 {
        self.items.len() as u64
    }

    /// Size in bytes
    pub fn size(&self) -> u64 {
        self.items() * HASH_BYTES as u64
    }

    pub fn item(&self, index: u64) -> &[u8; HASH_BYTES] {
        &self.items[index as usize]
    }

    /// Calculate a single dataset node
    pub fn calc_dataset_item(&self, index: u64) -> [u8; HASH_BYTES] {
        let n = self.items();
        let mut mix = [0u32; HASH_WORDS];

        LittleEndian::read_u32_into(&self.items[(index % n) as usize], &mut mix);
        mix[0] ^= index as u32;
        rehash(&mut mix);

        for parent in 0..self.dataset_parents {
            let parent_index =
                fnv(index as u32 ^ parent, mix[parent as usize % HASH_WORDS]) as u64 % n;
            let parent_item = &self.items[parent_index as usize];
            for (w, word) in mix.iter_mut().enumerate() {
                *word = fnv(*word, LittleEndian::read_u32(&parent_item[w * 4..]));
            }
        }

        rehash(&mut mix);
        words_to_bytes(&mix)
    }
}

impl NodeSource for DagCache {
    fn node(&self, index: u64) -> DagNode<'_> {
        DagNode::Owned(self.calc_dataset_item(index))
    }
}

/// Re-hash a word buffer in place with the chaining hash
fn rehash(mix: &mut [u32; HASH_WORDS]) {
    let digest = chain_hash(&words_to_bytes(mix));
    LittleEndian::read_u32_into(&digest, mix);
}

fn words_to_bytes(words: &[u32; HASH_WORDS]) -> [u8; HASH_BYTES] {
    let mut bytes = [0u8; HASH_BYTES];
    LittleEndian::write_u32_into(words, &mut bytes);
    bytes
}

/// Full dataset for one epoch
pub struct Dataset {
    epoch: u64,
    nodes: Vec<[u8; HASH_BYTES]>,
}

impl Dataset {
    /// Generate the full dataset of `params.dataset_size(epoch)` bytes from a cache
    pub fn from_cache(params: &DagParams, cache: &DagCache) -> Self {
        let dataset_size = params.dataset_size(cache.epoch);
        let n = (dataset_size / HASH_BYTES as u64) as usize;

        info!(
            "Generating full DAG for epoch {}, size: {} MB",
            cache.epoch,
            dataset_size / (1024 * 1024)
        );

        let mut nodes = vec![[0u8; HASH_BYTES]; n];
        let num_chunks = (n + DATASET_CHUNK_ITEMS - 1) / DATASET_CHUNK_ITEMS;

        for (chunk_idx, chunk) in nodes.chunks_mut(DATASET_CHUNK_ITEMS).enumerate() {
            if chunk_idx % 10 == 0 {
                debug!(
                    "Generating DAG chunk {}/{} ({:.1}%)",
                    chunk_idx,
                    num_chunks,
                    (chunk_idx as f64 / num_chunks as f64) * 100.0
                );
            }

            let start = (chunk_idx * DATASET_CHUNK_ITEMS) as u64;
            chunk.par_iter_mut().enumerate().for_each(|(offset, node)| {
                *node = cache.calc_dataset_item(start + offset as u64);
            });
        }

        info!("DAG generation complete for epoch {}", cache.epoch);

        Dataset {
            epoch: cache.epoch,
            nodes,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Number of 32-byte nodes
    pub fn items(&self) -> u64 {
        self.nodes.len() as u64
    }

    pub fn size(&self) -> u64 {
        self.items() * HASH_BYTES as u64
    }

    /// Get a dataset node
    pub fn item(&self, index: u64) -> &[u8; HASH_BYTES] {
        &self.nodes[index as usize]
    }
}

impl fmt::Debug for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dataset")
            .field("epoch", &self.epoch)
            .field("items", &self.items())
            .finish_non_exhaustive()
    }
}

impl NodeSource for Dataset {
    fn node(&self, index: u64) -> DagNode<'_> {
        DagNode::Borrowed(self.item(index))
    }
}
