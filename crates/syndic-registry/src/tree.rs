use crate::error::{RegistryError, Result};
use std::collections::HashMap;
use syndic_types::{AccountId, Digest, MembershipProof};

const LEAF_TAG: &[u8] = b"syndic.tree.leaf";
const NODE_TAG: &[u8] = b"syndic.tree.node";

/// Append-only Merkle tree over operator accounts.
///
/// Insertion appends a leaf; removal zeroes the leaf in place after the
/// caller proves its position with a sibling path against the current root.
/// Leaf slots are never reused, so a leaf index identifies one operator for
/// the life of the tree. The leaf vector is padded with zero digests to the
/// next power of two when hashing.
#[derive(Debug, Clone, Default)]
pub struct MembershipTree {
    leaves: Vec<Digest>,
    index: HashMap<AccountId, usize>,
}

impl MembershipTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Live member count. Zeroed slots are not counted.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Total leaf slots ever allocated, including zeroed ones.
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    pub fn contains(&self, operator: &AccountId) -> bool {
        self.index.contains_key(operator)
    }

    pub fn members(&self) -> Vec<AccountId> {
        self.index.keys().copied().collect()
    }

    pub fn root(&self) -> Digest {
        if self.leaves.is_empty() {
            return Digest::ZERO;
        }
        let mut level = self.padded_leaves();
        while level.len() > 1 {
            level = level
                .chunks(2)
                .map(|pair| Self::parent(&pair[0], &pair[1]))
                .collect();
        }
        level[0]
    }

    /// Append a leaf for the operator and return its index.
    pub fn insert(&mut self, operator: AccountId) -> Result<u64> {
        if self.index.contains_key(&operator) {
            return Err(RegistryError::MemberExists);
        }
        let leaf_index = self.leaves.len();
        self.leaves.push(Self::leaf_hash(&operator));
        self.index.insert(operator, leaf_index);
        Ok(leaf_index as u64)
    }

    /// Zero the operator's leaf. The proof must carry the operator's leaf
    /// index and a sibling path that hashes to the current root.
    pub fn remove(&mut self, operator: AccountId, proof: &MembershipProof) -> Result<()> {
        let leaf_index = *self
            .index
            .get(&operator)
            .ok_or(RegistryError::MemberNotFound)?;
        if proof.leaf_index as usize != leaf_index {
            return Err(RegistryError::InvalidMembershipProof);
        }
        if !self.verify_path(leaf_index, Self::leaf_hash(&operator), &proof.siblings) {
            return Err(RegistryError::InvalidMembershipProof);
        }
        self.leaves[leaf_index] = Digest::ZERO;
        self.index.remove(&operator);
        Ok(())
    }

    /// Sibling path for the operator's leaf against the current tree.
    pub fn proof_of(&self, operator: &AccountId) -> Result<MembershipProof> {
        let leaf_index = *self
            .index
            .get(operator)
            .ok_or(RegistryError::MemberNotFound)?;
        let mut level = self.padded_leaves();
        let mut siblings = Vec::new();
        let mut pos = leaf_index;
        while level.len() > 1 {
            siblings.push(level[pos ^ 1]);
            level = level
                .chunks(2)
                .map(|pair| Self::parent(&pair[0], &pair[1]))
                .collect();
            pos /= 2;
        }
        Ok(MembershipProof::new(leaf_index as u64, siblings))
    }

    fn verify_path(&self, leaf_index: usize, leaf: Digest, siblings: &[Digest]) -> bool {
        let padded_len = self.leaves.len().next_power_of_two();
        if siblings.len() != padded_len.trailing_zeros() as usize {
            return false;
        }
        let mut acc = leaf;
        let mut pos = leaf_index;
        for sibling in siblings {
            acc = if pos % 2 == 0 {
                Self::parent(&acc, sibling)
            } else {
                Self::parent(sibling, &acc)
            };
            pos /= 2;
        }
        acc == self.root()
    }

    fn padded_leaves(&self) -> Vec<Digest> {
        let mut level = self.leaves.clone();
        level.resize(level.len().next_power_of_two(), Digest::ZERO);
        level
    }

    fn leaf_hash(operator: &AccountId) -> Digest {
        Digest::of_parts(&[LEAF_TAG, operator.as_bytes()])
    }

    fn parent(left: &Digest, right: &Digest) -> Digest {
        Digest::of_parts(&[NODE_TAG, left.as_bytes(), right.as_bytes()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(byte: u8) -> AccountId {
        AccountId::from_bytes([byte; 32])
    }

    #[test]
    fn test_empty_tree_root_is_zero() {
        let tree = MembershipTree::new();
        assert_eq!(tree.root(), Digest::ZERO);
        assert!(tree.is_empty());
    }

    #[test]
    fn test_insert_assigns_sequential_indices() {
        let mut tree = MembershipTree::new();
        assert_eq!(tree.insert(op(1)).unwrap(), 0);
        assert_eq!(tree.insert(op(2)).unwrap(), 1);
        assert_eq!(tree.insert(op(3)).unwrap(), 2);
        assert_eq!(tree.len(), 3);
        assert!(matches!(
            tree.insert(op(2)),
            Err(RegistryError::MemberExists)
        ));
    }

    #[test]
    fn test_root_changes_with_membership() {
        let mut tree = MembershipTree::new();
        tree.insert(op(1)).unwrap();
        let root_one = tree.root();
        tree.insert(op(2)).unwrap();
        let root_two = tree.root();
        assert_ne!(root_one, root_two);
        assert!(!root_two.is_zero());
    }

    #[test]
    fn test_proof_round_trips_through_remove() {
        let mut tree = MembershipTree::new();
        for byte in 1..=5 {
            tree.insert(op(byte)).unwrap();
        }

        let proof = tree.proof_of(&op(3)).unwrap();
        assert_eq!(proof.leaf_index, 2);
        tree.remove(op(3), &proof).unwrap();

        assert!(!tree.contains(&op(3)));
        assert_eq!(tree.len(), 4);
        // Slot stays allocated
        assert_eq!(tree.leaf_count(), 5);
        assert!(matches!(
            tree.proof_of(&op(3)),
            Err(RegistryError::MemberNotFound)
        ));
    }

    #[test]
    fn test_remove_rejects_stale_proof() {
        let mut tree = MembershipTree::new();
        tree.insert(op(1)).unwrap();
        tree.insert(op(2)).unwrap();

        let stale = tree.proof_of(&op(2)).unwrap();
        // Tree shape changes after the proof was taken
        tree.insert(op(3)).unwrap();

        assert!(matches!(
            tree.remove(op(2), &stale),
            Err(RegistryError::InvalidMembershipProof)
        ));

        // A fresh proof works
        let fresh = tree.proof_of(&op(2)).unwrap();
        tree.remove(op(2), &fresh).unwrap();
    }

    #[test]
    fn test_remove_rejects_wrong_index() {
        let mut tree = MembershipTree::new();
        tree.insert(op(1)).unwrap();
        tree.insert(op(2)).unwrap();

        let mut proof = tree.proof_of(&op(2)).unwrap();
        proof.leaf_index = 0;
        assert!(matches!(
            tree.remove(op(2), &proof),
            Err(RegistryError::InvalidMembershipProof)
        ));
    }

    #[test]
    fn test_single_member_proof_is_empty_path() {
        let mut tree = MembershipTree::new();
        tree.insert(op(7)).unwrap();
        let proof = tree.proof_of(&op(7)).unwrap();
        assert!(proof.siblings.is_empty());
        tree.remove(op(7), &proof).unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn test_reinsert_after_removal_gets_new_slot() {
        let mut tree = MembershipTree::new();
        tree.insert(op(1)).unwrap();
        tree.insert(op(2)).unwrap();

        let proof = tree.proof_of(&op(1)).unwrap();
        tree.remove(op(1), &proof).unwrap();

        assert_eq!(tree.insert(op(1)).unwrap(), 2);
        assert_eq!(tree.leaf_count(), 3);
    }
}
