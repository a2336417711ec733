/// Read-only views over 32-byte dataset nodes
///
/// A node is either derived on demand from the cache, in which case the caller
/// owns the buffer, or borrowed straight out of a materialized dataset. The
/// borrow carries the dataset's lifetime, so a view can never outlive the
/// buffer it points into.

use byteorder::{ByteOrder, LittleEndian};
use std::ops::Deref;
use std::sync::Arc;

use super::dag::Dataset;
use super::params::{HASH_BYTES, HASH_WORDS};

#[derive(Debug, Clone, Copy)]
pub enum DagNode<'a> {
    /// Freshly derived from the cache
    Owned([u8; HASH_BYTES]),
    /// View into a dataset buffer
    Borrowed(&'a [u8; HASH_BYTES]),
}

impl DagNode<'_> {
    pub fn as_bytes(&self) -> &[u8; HASH_BYTES] {
        match self {
            DagNode::Owned(bytes) => bytes,
            DagNode::Borrowed(bytes) => *bytes,
        }
    }

    /// Little-endian 32-bit word `index` of the node
    #[inline]
    pub fn word(&self, index: usize) -> u32 {
        LittleEndian::read_u32(&self.as_bytes()[index * 4..])
    }

    pub fn words(&self) -> [u32; HASH_WORDS] {
        let mut words = [0u32; HASH_WORDS];
        LittleEndian::read_u32_into(self.as_bytes(), &mut words);
        words
    }

    pub fn to_owned_bytes(&self) -> [u8; HASH_BYTES] {
        *self.as_bytes()
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self, DagNode::Borrowed(_))
    }
}

impl AsRef<[u8]> for DagNode<'_> {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl PartialEq for DagNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for DagNode<'_> {}

impl PartialEq<[u8; HASH_BYTES]> for DagNode<'_> {
    fn eq(&self, other: &[u8; HASH_BYTES]) -> bool {
        self.as_bytes() == other
    }
}

/// Anything Hashimoto can fetch dataset nodes from
pub trait NodeSource {
    /// Node `index` of the full dataset
    fn node(&self, index: u64) -> DagNode<'_>;
}

/// A dataset node handed out by the epoch cache manager.
///
/// Holding the guard keeps the whole dataset alive, even if the manager
/// evicts the epoch in the meantime.
#[derive(Debug, Clone)]
pub struct GraphNode {
    dataset: Arc<Dataset>,
    index: u64,
}

impl GraphNode {
    pub(crate) fn new(dataset: Arc<Dataset>, index: u64) -> Self {
        Self { dataset, index }
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn epoch(&self) -> u64 {
        self.dataset.epoch()
    }

    /// Borrowed view, bound to this guard
    pub fn view(&self) -> DagNode<'_> {
        self.dataset.node(self.index)
    }
}

impl Deref for GraphNode {
    type Target = [u8; HASH_BYTES];

    fn deref(&self) -> &Self::Target {
        self.dataset.item(self.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owned_and_borrowed_compare_by_bytes() {
        let bytes = [0x5a; HASH_BYTES];
        let owned = DagNode::Owned(bytes);
        let borrowed = DagNode::Borrowed(&bytes);
        assert_eq!(owned, borrowed);
        assert!(borrowed.is_borrowed());
        assert!(!owned.is_borrowed());
        assert_eq!(owned, bytes);
    }

    #[test]
    fn test_words_little_endian() {
        let mut bytes = [0u8; HASH_BYTES];
        bytes[0] = 0x01;
        bytes[3] = 0x80;
        bytes[28] = 0xff;
        let node = DagNode::Owned(bytes);
        assert_eq!(node.word(0), 0x8000_0001);
        assert_eq!(node.word(7), 0x0000_00ff);
        assert_eq!(node.words()[0], node.word(0));
    }
}
