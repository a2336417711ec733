/// Primitive hash functions
///
/// Two fixed-size 256-bit hashes back the whole construction: a fast chaining
/// hash (BLAKE2s-256) for the seed chain, cache and node derivation, and a
/// distinct final hash (SHA3-256) for header pre-hashing and the proof result.

use blake2::Blake2s256;
use sha3::{Digest, Sha3_256};

/// Digest size of both primitives
pub const DIGEST_BYTES: usize = 32;

/// Chaining hash used for dataset generation
#[inline]
pub fn chain_hash(data: &[u8]) -> [u8; DIGEST_BYTES] {
    let mut hasher = Blake2s256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Final hash used for header pre-hash and the Hashimoto result
#[inline]
pub fn final_hash(data: &[u8]) -> [u8; DIGEST_BYTES] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}
