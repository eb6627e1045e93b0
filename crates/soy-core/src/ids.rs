//! Node identifiers for template trees.
//!
//! Passes that synthesize new nodes draw fresh identifiers from the
//! [`IdGenerator`] owned by the file set. The generator is atomic so the
//! single-file phase can run files on several workers at once.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

/// Identifies a node in a template tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node_{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(index: u32) -> Self {
        Self::new(index)
    }
}

/// Hands out unique [`NodeId`]s.
#[derive(Debug, Default)]
pub struct IdGenerator {
    next: AtomicU32,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start numbering at `first`, e.g. after a parser has already used some ids.
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: AtomicU32::new(first),
        }
    }

    /// Allocate the next identifier.
    pub fn gen_id(&self) -> NodeId {
        NodeId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    /// The identifier the next call to [`gen_id`](Self::gen_id) would return.
    pub fn peek(&self) -> NodeId {
        NodeId(self.next.load(Ordering::Relaxed))
    }
}
