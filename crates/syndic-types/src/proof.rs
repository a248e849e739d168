use crate::Digest;
use serde::{Deserialize, Serialize};

/// Sibling path for one leaf of the membership tree. Produced against a
/// specific root; verification recomputes the root from the leaf and this
/// path, so a proof is only meaningful for the tree state it was taken at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipProof {
    /// Position of the leaf in the tree's leaf vector.
    pub leaf_index: u64,
    /// Sibling digests from the leaf level up to just below the root.
    pub siblings: Vec<Digest>,
}

impl MembershipProof {
    pub fn new(leaf_index: u64, siblings: Vec<Digest>) -> Self {
        Self {
            leaf_index,
            siblings,
        }
    }

    pub fn depth(&self) -> usize {
        self.siblings.len()
    }
}
