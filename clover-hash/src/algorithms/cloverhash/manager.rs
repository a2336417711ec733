/// Per-epoch seed, cache and dataset storage
///
/// Every epoch slot is populated at most once, even when many validator
/// threads hit a cold epoch together: the maps are guarded by a read/write
/// lock, and each slot is a `OnceCell` that runs its builder exactly once
/// while concurrent callers block on it. Evicting an epoch only drops the
/// manager's handle; verifications already holding the `Arc` keep reading
/// from the same buffer until they finish.

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use super::dag::{advance_seed, DagCache, Dataset};
use super::node::{DagNode, GraphNode};
use super::params::DagParams;
use super::{hashimoto, HashimotoMode, HashimotoResult};
use crate::common::hash_types::{BlockHeader, Hash256};

type Slot<T> = Arc<OnceCell<Arc<T>>>;

/// How many epochs of each buffer stay resident.
///
/// After a build for epoch `e`, caches of epochs `<= e - cache_epochs` and
/// datasets of epochs `<= e - dataset_epochs` are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    #[serde(default = "default_cache_epochs")]
    pub cache_epochs: u64,
    #[serde(default = "default_dataset_epochs")]
    pub dataset_epochs: u64,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            cache_epochs: default_cache_epochs(),
            dataset_epochs: default_dataset_epochs(),
        }
    }
}

fn default_cache_epochs() -> u64 { 2 }
fn default_dataset_epochs() -> u64 { 1 }

/// Snapshot of manager activity
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ManagerStats {
    pub seed_derivations: u64,
    pub cache_builds: u64,
    pub dataset_builds: u64,
    pub cache_evictions: u64,
    pub dataset_evictions: u64,
    pub resident_caches: Vec<u64>,
    pub resident_datasets: Vec<u64>,
}

#[derive(Default)]
struct Counters {
    seed_derivations: AtomicU64,
    cache_builds: AtomicU64,
    dataset_builds: AtomicU64,
    cache_evictions: AtomicU64,
    dataset_evictions: AtomicU64,
}

static GLOBAL: Lazy<EpochCacheManager> = Lazy::new(|| EpochCacheManager::new(DagParams::mainnet()));

/// Owns the seed chain and the per-epoch caches and datasets
pub struct EpochCacheManager {
    params: DagParams,
    retention: RetentionPolicy,
    /// Seeds are tiny and kept for every epoch seen, so later epochs always
    /// find a nearby ancestor
    seeds: Mutex<BTreeMap<u64, Hash256>>,
    caches: RwLock<HashMap<u64, Slot<DagCache>>>,
    datasets: RwLock<HashMap<u64, Slot<Dataset>>>,
    counters: Counters,
}

impl EpochCacheManager {
    pub fn new(params: DagParams) -> Self {
        Self::with_retention(params, RetentionPolicy::default())
    }

    pub fn with_retention(params: DagParams, retention: RetentionPolicy) -> Self {
        let mut seeds = BTreeMap::new();
        seeds.insert(0, Hash256::default());
        Self {
            params,
            retention,
            seeds: Mutex::new(seeds),
            caches: RwLock::new(HashMap::new()),
            datasets: RwLock::new(HashMap::new()),
            counters: Counters::default(),
        }
    }

    /// Process-wide manager with mainnet parameters
    pub fn global() -> &'static EpochCacheManager {
        &GLOBAL
    }

    pub fn params(&self) -> &DagParams {
        &self.params
    }

    pub fn retention(&self) -> RetentionPolicy {
        self.retention
    }

    /// Get epoch for block height
    pub fn epoch_of(&self, height: u32) -> u64 {
        self.params.epoch_of(height)
    }

    /// Seed for `epoch`, chained from the closest known ancestor epoch
    pub fn seed(&self, epoch: u64) -> Hash256 {
        let mut seeds = self.seeds.lock();
        if let Some(seed) = seeds.get(&epoch) {
            return *seed;
        }

        // Epoch 0 is always present, so an ancestor exists
        let (ancestor, ancestor_seed) = seeds
            .range(..epoch)
            .next_back()
            .map(|(e, s)| (*e, *s))
            .unwrap_or((0, Hash256::default()));

        let seed = advance_seed(ancestor_seed, epoch - ancestor);
        seeds.insert(epoch, seed);
        self.counters.seed_derivations.fetch_add(1, Ordering::Relaxed);
        debug!("Derived seed for epoch {} from epoch {}", epoch, ancestor);
        seed
    }

    /// Get or build the cache for `epoch`
    pub fn get_cache(&self, epoch: u64) -> Arc<DagCache> {
        let slot = Self::slot(&self.caches, epoch);
        let mut built = false;
        let cache = slot
            .get_or_init(|| {
                built = true;
                let seed = self.seed(epoch);
                self.counters.cache_builds.fetch_add(1, Ordering::Relaxed);
                Arc::new(DagCache::new(&self.params, epoch, &seed))
            })
            .clone();

        if built {
            self.evict(epoch);
        }
        cache
    }

    /// Get or build the full dataset for `epoch`.
    ///
    /// The first call per epoch builds the whole dataset, which takes minutes
    /// with mainnet parameters.
    pub fn get_dataset(&self, epoch: u64) -> Arc<Dataset> {
        let slot = Self::slot(&self.datasets, epoch);
        let mut built = false;
        let dataset = slot
            .get_or_init(|| {
                built = true;
                let cache = self.get_cache(epoch);
                self.counters.dataset_builds.fetch_add(1, Ordering::Relaxed);
                Arc::new(Dataset::from_cache(&self.params, &cache))
            })
            .clone();

        if built {
            self.evict(epoch);
        }
        dataset
    }

    /// Derive node `index` from the cache of the epoch containing `height`.
    ///
    /// May build the cache, never the dataset.
    pub fn get_node(&self, index: u64, height: u32) -> DagNode<'static> {
        let cache = self.get_cache(self.epoch_of(height));
        DagNode::Owned(cache.calc_dataset_item(index))
    }

    /// Read node `index` from the dataset of the epoch containing `height`,
    /// building cache and dataset on first access.
    ///
    /// Returns `None` when `index` is past the end of the dataset; nothing is
    /// built in that case.
    pub fn get_node_from_graph(&self, index: u64, height: u32) -> Option<GraphNode> {
        let epoch = self.epoch_of(height);
        if index >= self.params.dataset_items(epoch) {
            return None;
        }
        Some(GraphNode::new(self.get_dataset(epoch), index))
    }

    /// Populate the epoch for `height` ahead of time
    pub fn prewarm(&self, height: u32, with_dataset: bool) {
        let epoch = self.epoch_of(height);
        if with_dataset {
            self.get_dataset(epoch);
        } else {
            self.get_cache(epoch);
        }
    }

    /// Run Hashimoto for `header` against its epoch
    pub fn hashimoto(&self, header: &BlockHeader, mode: HashimotoMode) -> HashimotoResult {
        let epoch = self.epoch_of(header.height);
        let items = self.params.dataset_items(epoch);
        match mode {
            HashimotoMode::Cache => {
                let cache = self.get_cache(epoch);
                hashimoto(header, cache.as_ref(), items, self.params.accesses)
            }
            HashimotoMode::Dataset => {
                // The handle pins the dataset for the whole run
                let dataset = self.get_dataset(epoch);
                hashimoto(header, dataset.as_ref(), items, self.params.accesses)
            }
        }
    }

    pub fn stats(&self) -> ManagerStats {
        let mut resident_caches = Self::resident(&self.caches);
        let mut resident_datasets = Self::resident(&self.datasets);
        resident_caches.sort_unstable();
        resident_datasets.sort_unstable();

        ManagerStats {
            seed_derivations: self.counters.seed_derivations.load(Ordering::Relaxed),
            cache_builds: self.counters.cache_builds.load(Ordering::Relaxed),
            dataset_builds: self.counters.dataset_builds.load(Ordering::Relaxed),
            cache_evictions: self.counters.cache_evictions.load(Ordering::Relaxed),
            dataset_evictions: self.counters.dataset_evictions.load(Ordering::Relaxed),
            resident_caches,
            resident_datasets,
        }
    }

    /// Fetch or create the slot for `epoch` with double-checked locking
    fn slot<T>(map: &RwLock<HashMap<u64, Slot<T>>>, epoch: u64) -> Slot<T> {
        if let Some(slot) = map.read().get(&epoch) {
            return Arc::clone(slot);
        }
        let mut map = map.write();
        Arc::clone(map.entry(epoch).or_default())
    }

    fn resident<T>(map: &RwLock<HashMap<u64, Slot<T>>>) -> Vec<u64> {
        map.read()
            .iter()
            .filter(|(_, slot)| slot.get().is_some())
            .map(|(epoch, _)| *epoch)
            .collect()
    }

    /// Drop epochs that fell out of the retention window behind `current`
    fn evict(&self, current: u64) {
        let evicted_caches = Self::evict_before(
            &self.caches,
            current.saturating_sub(self.retention.cache_epochs.saturating_sub(1)),
        );
        let evicted_datasets = Self::evict_before(
            &self.datasets,
            current.saturating_sub(self.retention.dataset_epochs.saturating_sub(1)),
        );

        if !evicted_caches.is_empty() || !evicted_datasets.is_empty() {
            info!(
                "Evicted epochs behind {}: caches {:?}, datasets {:?}",
                current, evicted_caches, evicted_datasets
            );
        }
        self.counters
            .cache_evictions
            .fetch_add(evicted_caches.len() as u64, Ordering::Relaxed);
        self.counters
            .dataset_evictions
            .fetch_add(evicted_datasets.len() as u64, Ordering::Relaxed);
    }

    /// Remove built slots older than `keep_from`
    fn evict_before<T>(map: &RwLock<HashMap<u64, Slot<T>>>, keep_from: u64) -> Vec<u64> {
        let mut map = map.write();
        let stale: Vec<u64> = map
            .iter()
            .filter(|(epoch, slot)| **epoch < keep_from && slot.get().is_some())
            .map(|(epoch, _)| *epoch)
            .collect();
        for epoch in &stale {
            map.remove(epoch);
        }
        stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::cloverhash::dag::seed_hash;

    fn manager() -> EpochCacheManager {
        EpochCacheManager::new(DagParams::testing())
    }

    #[test]
    fn test_seed_from_cached_ancestor() {
        let mgr = manager();
        assert!(mgr.seed(0).is_zero());

        let five = mgr.seed(5);
        assert_eq!(five, seed_hash(5));
        // Derived from epoch 5, not from epoch 0
        assert_eq!(mgr.seed(9), seed_hash(9));
        // Earlier epoch after a later one still chains from the right ancestor
        assert_eq!(mgr.seed(3), seed_hash(3));
        assert_eq!(mgr.stats().seed_derivations, 3);

        // Cached
        assert_eq!(mgr.seed(9), seed_hash(9));
        assert_eq!(mgr.stats().seed_derivations, 3);
    }

    #[test]
    fn test_dag_caching() {
        let mgr = manager();

        let cache1 = mgr.get_cache(0);
        let cache2 = mgr.get_cache(0);

        // Should return same cache
        assert!(Arc::ptr_eq(&cache1, &cache2));
        assert_eq!(mgr.stats().cache_builds, 1);
    }

    #[test]
    fn test_get_node_resolves_epoch_from_height() {
        let mgr = manager();
        let params = *mgr.params();

        let from_epoch_one = mgr.get_node(17, params.epoch_length);
        let cache = DagCache::new(&params, 1, &seed_hash(1));
        assert_eq!(from_epoch_one, cache.calc_dataset_item(17));
        assert!(!from_epoch_one.is_borrowed());
        assert_eq!(mgr.stats().dataset_builds, 0);
    }

    #[test]
    fn test_graph_node_matches_cache_node() {
        let mgr = manager();
        let node = mgr.get_node_from_graph(42, 0).unwrap();
        assert_eq!(node.view(), mgr.get_node(42, 0));
        assert!(node.view().is_borrowed());
        assert_eq!(node.epoch(), 0);
        assert_eq!(&*node, mgr.get_node(42, 0).as_bytes());
    }

    #[test]
    fn test_graph_node_out_of_range() {
        let mgr = manager();
        let items = mgr.params().dataset_items(0);

        assert!(mgr.get_node_from_graph(items, 0).is_none());
        assert!(mgr.get_node_from_graph(u64::MAX, 0).is_none());
        assert_eq!(mgr.stats().dataset_builds, 0);

        let last = mgr.get_node_from_graph(items - 1, 0).unwrap();
        assert_eq!(last.index(), items - 1);
        assert_eq!(*last, mgr.get_node(items - 1, 0).to_owned_bytes());
        assert!(format!("{:?}", last).contains("index"));
    }

    #[test]
    fn test_retention_drops_old_caches() {
        let mgr = manager();
        for epoch in 0..4 {
            mgr.get_cache(epoch);
        }
        let stats = mgr.stats();
        assert_eq!(stats.resident_caches, vec![2, 3]);
        assert_eq!(stats.cache_evictions, 2);
        assert_eq!(stats.cache_builds, 4);
    }

    #[test]
    fn test_retention_drops_old_datasets() {
        let mgr = manager();
        mgr.get_dataset(0);
        mgr.get_dataset(1);
        let stats = mgr.stats();
        assert_eq!(stats.resident_datasets, vec![1]);
        assert_eq!(stats.resident_caches, vec![0, 1]);
    }

    #[test]
    fn test_borrowed_node_survives_eviction() {
        let mgr = manager();
        let node = mgr.get_node_from_graph(7, 0).unwrap();
        let expected = mgr.get_node(7, 0).to_owned_bytes();

        // Building a later dataset evicts epoch 0 from the manager
        mgr.get_dataset(1);
        assert_eq!(mgr.stats().resident_datasets, vec![1]);

        assert_eq!(*node, expected);
    }

    #[test]
    fn test_revisit_evicted_epoch_rebuilds() {
        let mgr = manager();
        let first = mgr.get_cache(0).calc_dataset_item(5);
        mgr.get_cache(2);
        assert!(!mgr.stats().resident_caches.contains(&0));

        assert_eq!(mgr.get_cache(0).calc_dataset_item(5), first);
        assert_eq!(mgr.stats().cache_builds, 3);
    }
}
