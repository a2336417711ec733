/// Cloverhash: Hashimoto over an epoch-keyed DAG
///
/// A block header is pre-hashed, tiled into a 64-byte mix, and folded with
/// 64 pseudo-randomly selected pairs of dataset nodes. The mix is compressed
/// to 128 bits (`cmix`) and hashed together with the header hash and height
/// into the final 256-bit proof. The nodes can come from the small per-epoch
/// cache (derived on demand) or from the materialized dataset; both give
/// the same answer.

pub mod dag;
pub mod fnv;
pub mod hashing;
pub mod manager;
pub mod node;
pub mod params;

use byteorder::{ByteOrder, LittleEndian};
use serde::{Deserialize, Serialize};

use self::fnv::{fnv, fnv_fold4};
use self::hashing::final_hash;
use self::node::NodeSource;
use self::params::{HASH_BYTES, HASH_WORDS, MIX_HASHES, MIX_WORDS, WORD_BYTES};
use crate::common::hash_types::{BlockHeader, Hash128, Hash256};

pub use self::dag::{advance_seed, next_seed, seed_hash, DagCache, Dataset};
pub use self::manager::{EpochCacheManager, ManagerStats, RetentionPolicy};
pub use self::node::{DagNode, GraphNode};
pub use self::params::DagParams;

/// Length of the final hash input: header hash, height, cmix
pub const FINAL_INPUT_BYTES: usize = HASH_BYTES + WORD_BYTES + 16;

/// Where Hashimoto reads dataset nodes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashimotoMode {
    /// Derive every node from the cache (slow, small)
    Cache,
    /// Read nodes from the full dataset (fast once built)
    Dataset,
}

/// Output of one Hashimoto run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashimotoResult {
    /// Compressed mix, checked against the header's claimed value
    pub cmix: Hash128,
    /// Proof hash, compared against the target
    pub result: Hash256,
}

/// Run Hashimoto for `header` over `dataset_items` nodes served by `source`
pub fn hashimoto<S: NodeSource + ?Sized>(
    header: &BlockHeader,
    source: &S,
    dataset_items: u64,
    accesses: u32,
) -> HashimotoResult {
    let header_hash = final_hash(&header.pow_bytes());
    let seed_word = Hash256::from_bytes(header_hash).first_word();
    let mut header_words = [0u32; HASH_WORDS];
    LittleEndian::read_u32_into(&header_hash, &mut header_words);

    // Tile the header hash across the mix
    let mut mix = [0u32; MIX_WORDS];
    for chunk in mix.chunks_exact_mut(HASH_WORDS) {
        chunk.copy_from_slice(&header_words);
    }

    let pages = dataset_items / MIX_HASHES as u64;
    for access in 0..accesses {
        let target = fnv(access ^ seed_word, mix[access as usize % MIX_WORDS]) as u64
            % pages
            * MIX_HASHES as u64;

        for sub in 0..MIX_HASHES {
            let node = source.node(target + sub as u64);
            let lane = &mut mix[sub * HASH_WORDS..(sub + 1) * HASH_WORDS];
            for (w, word) in lane.iter_mut().enumerate() {
                *word = fnv(*word, node.word(w));
            }
        }
    }

    let mut cmix_words = [0u32; MIX_WORDS / 4];
    for (j, word) in cmix_words.iter_mut().enumerate() {
        *word = fnv_fold4([mix[4 * j], mix[4 * j + 1], mix[4 * j + 2], mix[4 * j + 3]]);
    }
    let cmix = Hash128::from_words(cmix_words);

    let mut input = [0u8; FINAL_INPUT_BYTES];
    input[..HASH_BYTES].copy_from_slice(&header_hash);
    input[HASH_BYTES..HASH_BYTES + WORD_BYTES].copy_from_slice(&header.height.to_le_bytes());
    input[HASH_BYTES + WORD_BYTES..].copy_from_slice(cmix.as_bytes());

    HashimotoResult {
        cmix,
        result: Hash256::from_bytes(final_hash(&input)),
    }
}
