/// Proof-of-work algorithm implementations

pub mod cloverhash;

// Re-export main types
pub use cloverhash::{EpochCacheManager, HashimotoMode, HashimotoResult};
