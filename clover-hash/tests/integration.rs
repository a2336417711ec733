use std::sync::{Arc, Barrier};
use std::thread;

use clover_hash::algorithms::cloverhash::seed_hash;
use clover_hash::{
    BlockHeader, DagCache, DagParams, EpochCacheManager, HashimotoMode, RetentionPolicy,
};
use hex_literal::hex;
use pretty_assertions::assert_eq;

const THREADS: usize = 8;

#[test]
fn test_concurrent_get_node_builds_cache_once() {
    let manager = EpochCacheManager::new(DagParams::testing());
    let barrier = Barrier::new(THREADS);
    let height = 3 * manager.params().epoch_length;

    let nodes: Vec<[u8; 32]> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    manager.get_node(11, height).to_owned_bytes()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let stats = manager.stats();
    assert_eq!(stats.cache_builds, 1);
    assert_eq!(stats.dataset_builds, 0);
    assert!(nodes.iter().all(|n| *n == nodes[0]));

    let reference = DagCache::new(manager.params(), 3, &seed_hash(3));
    assert_eq!(nodes[0], reference.calc_dataset_item(11));
}

#[test]
fn test_concurrent_graph_access_builds_dataset_once() {
    let manager = Arc::new(EpochCacheManager::new(DagParams::testing()));
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS as u64)
        .map(|i| {
            let manager = Arc::clone(&manager);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let node = manager.get_node_from_graph(i * 100, 0).unwrap();
                (i * 100, *node)
            })
        })
        .collect();

    for handle in handles {
        let (index, bytes) = handle.join().unwrap();
        assert_eq!(manager.get_node(index, 0).to_owned_bytes(), bytes);
    }

    let stats = manager.stats();
    assert_eq!(stats.dataset_builds, 1);
    assert_eq!(stats.cache_builds, 1);
}

#[test]
fn test_epoch_zero_node_golden() {
    let manager = EpochCacheManager::new(DagParams::testing());
    assert!(manager.seed(0).is_zero());
    assert_eq!(
        manager.get_node(0, 0).to_owned_bytes(),
        hex!("5f7d07d8b76835e7c00f8306f24c00142bdc3707f9a1f5ebea237b0031b26dfa")
    );
}

#[test]
fn test_modes_agree_across_epochs() {
    let manager = EpochCacheManager::with_retention(
        DagParams::testing(),
        RetentionPolicy {
            cache_epochs: 8,
            dataset_epochs: 8,
        },
    );

    for epoch in 0..4u32 {
        let mut header = BlockHeader::test_header(epoch * manager.params().epoch_length + 1);
        header.nonce = 0xc10e_0000 + epoch;
        let slow = manager.hashimoto(&header, HashimotoMode::Cache);
        let fast = manager.hashimoto(&header, HashimotoMode::Dataset);
        assert_eq!(slow, fast);
    }

    let stats = manager.stats();
    assert_eq!(stats.resident_datasets, vec![0, 1, 2, 3]);
}

#[test]
fn test_concurrent_hashimoto_consistent() {
    let manager = EpochCacheManager::new(DagParams::testing());
    let header = BlockHeader::test_header(6);
    let expected = EpochCacheManager::new(DagParams::testing())
        .hashimoto(&header, HashimotoMode::Cache);

    thread::scope(|s| {
        for i in 0..THREADS {
            let manager = &manager;
            let header = &header;
            s.spawn(move || {
                let mode = if i % 2 == 0 {
                    HashimotoMode::Cache
                } else {
                    HashimotoMode::Dataset
                };
                assert_eq!(manager.hashimoto(header, mode), expected);
            });
        }
    });

    assert_eq!(manager.stats().cache_builds, 1);
}
