//! Read-only view of block history for retargeting

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// One block in the chain index, linked to its predecessor
pub trait ChainIndex {
    fn height(&self) -> u32;

    /// Block timestamp in seconds
    fn time(&self) -> i64;

    /// Compact target of this block
    fn bits(&self) -> u32;

    /// Predecessor, `None` at genesis
    fn prev(&self) -> Option<&Self>;

    /// Walk from this block back to genesis, starting with this block
    fn ancestors(&self) -> Ancestors<'_, Self>
    where
        Self: Sized,
    {
        Ancestors { next: Some(self) }
    }

    /// The block `n` steps back, if history goes that far
    fn back(&self, n: usize) -> Option<&Self>
    where
        Self: Sized,
    {
        self.ancestors().nth(n)
    }
}

/// Iterator over a block and its predecessors
pub struct Ancestors<'a, C> {
    next: Option<&'a C>,
}

impl<'a, C: ChainIndex> Iterator for Ancestors<'a, C> {
    type Item = &'a C;

    fn next(&mut self) -> Option<&'a C> {
        let current = self.next?;
        self.next = current.prev();
        Some(current)
    }
}

/// Time and bits of one recorded block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryBlock {
    pub time: i64,
    pub bits: u32,
}

/// In-memory chain index entry with a shared link to its predecessor
#[derive(Debug)]
pub struct IndexEntry {
    height: u32,
    time: i64,
    bits: u32,
    prev: Option<Arc<IndexEntry>>,
}

impl IndexEntry {
    pub fn genesis(time: i64, bits: u32) -> Arc<Self> {
        Arc::new(Self {
            height: 0,
            time,
            bits,
            prev: None,
        })
    }

    /// Append a block on top of `tip`
    pub fn extend(tip: &Arc<Self>, time: i64, bits: u32) -> Arc<Self> {
        Arc::new(Self {
            height: tip.height + 1,
            time,
            bits,
            prev: Some(Arc::clone(tip)),
        })
    }

    /// Build a chain from genesis-first history and return its tip
    pub fn from_history(history: &[HistoryBlock]) -> Option<Arc<Self>> {
        let (first, rest) = history.split_first()?;
        let genesis = Self::genesis(first.time, first.bits);
        Some(
            rest.iter()
                .fold(genesis, |tip, block| Self::extend(&tip, block.time, block.bits)),
        )
    }
}

impl ChainIndex for IndexEntry {
    fn height(&self) -> u32 {
        self.height
    }

    fn time(&self) -> i64 {
        self.time
    }

    fn bits(&self) -> u32 {
        self.bits
    }

    fn prev(&self) -> Option<&Self> {
        self.prev.as_deref()
    }
}

// Unlink iteratively so dropping a long chain does not recurse per block.
impl Drop for IndexEntry {
    fn drop(&mut self) {
        let mut prev = self.prev.take();
        while let Some(entry) = prev {
            match Arc::try_unwrap(entry) {
                Ok(mut inner) => prev = inner.prev.take(),
                Err(_) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(len: usize) -> Vec<HistoryBlock> {
        (0..len)
            .map(|i| HistoryBlock {
                time: 1_000 + i as i64 * 300,
                bits: 0x1d00_ffff,
            })
            .collect()
    }

    #[test]
    fn test_from_history_heights() {
        let tip = IndexEntry::from_history(&history(5)).unwrap();
        assert_eq!(tip.height(), 4);
        assert_eq!(tip.time(), 2_200);

        let heights: Vec<u32> = tip.ancestors().map(|b| b.height()).collect();
        assert_eq!(heights, vec![4, 3, 2, 1, 0]);
        assert!(IndexEntry::from_history(&[]).is_none());
    }

    #[test]
    fn test_back() {
        let tip = IndexEntry::from_history(&history(3)).unwrap();
        assert_eq!(tip.back(0).map(|b| b.height()), Some(2));
        assert_eq!(tip.back(2).map(|b| b.height()), Some(0));
        assert!(tip.back(3).is_none());
    }

    #[test]
    fn test_shared_history_forks() {
        let base = IndexEntry::from_history(&history(3)).unwrap();
        let a = IndexEntry::extend(&base, 5_000, 1);
        let b = IndexEntry::extend(&base, 6_000, 2);
        drop(base);
        assert_eq!(a.prev().map(|p| p.height()), Some(2));
        drop(a);
        // The shared prefix is still alive through `b`
        assert_eq!(b.ancestors().count(), 4);
    }

    #[test]
    fn test_long_chain_drops() {
        let tip = IndexEntry::from_history(&history(200_000)).unwrap();
        assert_eq!(tip.height(), 199_999);
        drop(tip);
    }

    #[test]
    fn test_history_json() {
        let json = r#"[{"time": 10, "bits": 486604799}, {"time": 310, "bits": 486604799}]"#;
        let blocks: Vec<HistoryBlock> = serde_json::from_str(json).unwrap();
        let tip = IndexEntry::from_history(&blocks).unwrap();
        assert_eq!(tip.bits(), 0x1d00_ffff);
        assert_eq!(tip.height(), 1);
    }
}
