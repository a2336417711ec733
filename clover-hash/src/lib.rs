//! Cloverhash - memory-hard proof of work
//!
//! This crate implements the epoch-keyed DAG and the Hashimoto mixer used to
//! compute and verify block proof of work: the seed chain, per-epoch cache
//! generation, on-demand node derivation, full dataset construction, and an
//! epoch cache manager that populates each epoch exactly once under
//! concurrent access.
//!
//! # Example
//!
//! ```
//! use clover_hash::{BlockHeader, DagParams, EpochCacheManager, HashimotoMode};
//!
//! let manager = EpochCacheManager::new(DagParams::testing());
//! let header = BlockHeader::test_header(0);
//! let slow = manager.hashimoto(&header, HashimotoMode::Cache);
//! let fast = manager.hashimoto(&header, HashimotoMode::Dataset);
//! assert_eq!(slow, fast);
//! ```

pub mod algorithms;
pub mod common;
pub mod error;

// Re-export main types
pub use algorithms::cloverhash::{
    hashimoto, DagCache, DagNode, DagParams, Dataset, EpochCacheManager, GraphNode,
    HashimotoMode, HashimotoResult, ManagerStats, RetentionPolicy,
};
pub use common::hash_types::{BlockHeader, Hash128, Hash256};
pub use error::{DagError, Result};
