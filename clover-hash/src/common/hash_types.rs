/// Common hash types shared by the DAG, the mixer and block validation

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

use crate::algorithms::cloverhash::hashing::final_hash;

/// Size of the serialized header prefix covered by the proof-of-work hashes
pub const POW_HEADER_BYTES: usize = 80;

/// 256-bit hash (32 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// Create from bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Create from slice (must be 32 bytes)
    pub fn from_slice(slice: &[u8]) -> Result<Self, &'static str> {
        let bytes: [u8; 32] = slice
            .try_into()
            .map_err(|_| "Hash256 requires exactly 32 bytes")?;
        Ok(Self(bytes))
    }

    /// Get as bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string
    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex)?;
        Self::from_slice(&bytes).map_err(|_| hex::FromHexError::InvalidStringLength)
    }

    /// First little-endian 32-bit word
    pub fn first_word(&self) -> u32 {
        u32::from_le_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// 128-bit value, used for the compressed Hashimoto mix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Hash128(pub [u8; 16]);

impl Hash128 {
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Build from four little-endian words
    pub fn from_words(words: [u32; 4]) -> Self {
        let mut bytes = [0u8; 16];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        Self(bytes)
    }

    /// Interpret as a little-endian 128-bit integer
    pub fn as_u128(&self) -> u128 {
        u128::from_le_bytes(self.0)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(hex: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(hex)?;
        let bytes: [u8; 16] = bytes
            .try_into()
            .map_err(|_| hex::FromHexError::InvalidStringLength)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Hash128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// Hashes travel as hex strings in JSON headers and config files.
macro_rules! impl_hex_serde {
    ($ty:ty) => {
        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                <$ty>::from_hex(s.trim_start_matches("0x")).map_err(de::Error::custom)
            }
        }
    };
}

impl_hex_serde!(Hash256);
impl_hex_serde!(Hash128);

/// Block header fields read by proof-of-work validation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block version; one bit selects the memory-hard proof of work
    pub version: i32,
    /// Previous block hash
    pub prev_hash: Hash256,
    /// Merkle root of transactions
    pub merkle_root: Hash256,
    /// Block timestamp
    pub time: u32,
    /// Compact difficulty target
    pub bits: u32,
    /// Nonce value
    pub nonce: u32,
    /// Block height, selects the DAG epoch
    pub height: u32,
    /// Claimed compressed Hashimoto mix
    #[serde(default)]
    pub hash_mix: Hash128,
}

impl BlockHeader {
    /// Serialize the 80-byte prefix: version, prev hash, merkle root, time, bits, nonce
    pub fn pow_bytes(&self) -> [u8; POW_HEADER_BYTES] {
        let mut bytes = [0u8; POW_HEADER_BYTES];
        bytes[0..4].copy_from_slice(&self.version.to_le_bytes());
        bytes[4..36].copy_from_slice(self.prev_hash.as_bytes());
        bytes[36..68].copy_from_slice(self.merkle_root.as_bytes());
        bytes[68..72].copy_from_slice(&self.time.to_le_bytes());
        bytes[72..76].copy_from_slice(&self.bits.to_le_bytes());
        bytes[76..80].copy_from_slice(&self.nonce.to_le_bytes());
        bytes
    }

    /// Legacy proof hash, used when the memory-hard bit is not set
    pub fn pow_hash(&self) -> Hash256 {
        Hash256::from_bytes(final_hash(&self.pow_bytes()))
    }

    /// Parse a header from its JSON form
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Create test header
    pub fn test_header(height: u32) -> Self {
        Self {
            version: 0x0000_0100,
            prev_hash: Hash256::default(),
            merkle_root: Hash256::from_bytes([0x11; 32]),
            time: 1_234_567_890,
            bits: 0x1e0f_ffff,
            nonce: 0,
            height,
            hash_mix: Hash128::default(),
        }
    }
}
