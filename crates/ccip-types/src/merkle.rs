//! Merkle tree over commit report leaves, compatible with the OffRamp's
//! multi-proof verifier.
//!
//! Adjacent nodes are paired left to right. A pair is hashed as
//! `keccak256(INTERNAL_DOMAIN_SEPARATOR || min(a, b) || max(a, b))`, so the
//! parent does not depend on which side a node sits. When a level has an odd
//! number of nodes the last one is promoted to the next level unchanged.
//!
//! Proofs use the verifier's source flags: flag i tells whether the second
//! operand of hashing step i is taken from the leaves and computed hashes
//! (set) or from the proof hashes (clear). A single-leaf proof only ever
//! consumes proof hashes, so all its flags are clear.

use alloy_primitives::{B256, U256, b256, keccak256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Domain separator prepended to every internal node preimage.
pub const INTERNAL_DOMAIN_SEPARATOR: B256 =
    b256!("0x0000000000000000000000000000000000000000000000000000000000000001");

/// Proof flags are packed into a uint256 on-chain.
pub const MAX_PROOF_DEPTH: usize = 256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MerkleError {
    #[error("cannot build a merkle tree without leaves")]
    EmptyTree,
    #[error("leaf index {index} out of bounds for a tree of {leaves} leaves")]
    IndexOutOfBounds { index: usize, leaves: usize },
    #[error("exactly one leaf index can be proven per proof, got {0}")]
    UnsupportedIndexCount(usize),
}

/// Hashes two sibling nodes into their parent, smaller hash first.
pub fn hash_internal(a: &B256, b: &B256) -> B256 {
    let (low, high) = if a < b { (a, b) } else { (b, a) };
    let mut preimage = [0u8; 96];
    preimage[..32].copy_from_slice(INTERNAL_DOMAIN_SEPARATOR.as_slice());
    preimage[32..64].copy_from_slice(low.as_slice());
    preimage[64..].copy_from_slice(high.as_slice());
    keccak256(preimage)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerkleTree {
    // layers[0] holds the leaves, the last layer holds the root
    layers: Vec<Vec<B256>>,
}

impl MerkleTree {
    /// Builds the tree over `leaves`, in order.
    pub fn new(leaves: Vec<B256>) -> Result<Self, MerkleError> {
        if leaves.is_empty() {
            return Err(MerkleError::EmptyTree);
        }

        let mut layers = vec![leaves];
        while let Some(layer) = layers.last().filter(|layer| layer.len() > 1) {
            let next = layer
                .chunks(2)
                .map(|pair| match pair {
                    [left, right] => hash_internal(left, right),
                    _ => pair[0],
                })
                .collect();
            layers.push(next);
        }

        Ok(Self { layers })
    }

    pub fn root(&self) -> B256 {
        self.layers[self.layers.len() - 1][0]
    }

    pub fn leaves(&self) -> &[B256] {
        &self.layers[0]
    }

    pub fn leaf_count(&self) -> usize {
        self.layers[0].len()
    }

    /// Number of hashing levels between the leaves and the root.
    pub fn depth(&self) -> usize {
        self.layers.len() - 1
    }

    /// Generates an inclusion proof. Exactly one index is accepted since the
    /// on-chain execution path proves one message per report.
    pub fn prove(&self, indices: &[usize]) -> Result<Proof, MerkleError> {
        let [index] = indices else {
            return Err(MerkleError::UnsupportedIndexCount(indices.len()));
        };
        self.prove_index(*index)
    }

    fn prove_index(&self, index: usize) -> Result<Proof, MerkleError> {
        if index >= self.leaf_count() {
            return Err(MerkleError::IndexOutOfBounds {
                index,
                leaves: self.leaf_count(),
            });
        }

        let mut proof = Proof::default();
        let mut position = index;
        for layer in &self.layers[..self.depth()] {
            if let Some(sibling) = layer.get(position ^ 1) {
                proof.hashes.push(*sibling);
                proof.source_flags.push(false);
            }
            position /= 2;
        }
        Ok(proof)
    }
}

/// Multi-proof as consumed by the OffRamp.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub hashes: Vec<B256>,
    // one per hashing step; true: second operand comes from leaves or computed hashes
    pub source_flags: Vec<bool>,
}

impl Proof {
    /// Rebuilds a proof from its on-chain form.
    pub fn from_flag_bits(hashes: Vec<B256>, flag_bits: U256, leaf_count: usize) -> Self {
        let steps = (leaf_count + hashes.len()).saturating_sub(1).min(MAX_PROOF_DEPTH);
        let source_flags = (0..steps).map(|i| flag_bits.bit(i)).collect();
        Self { hashes, source_flags }
    }

    /// Packs the source flags into the on-chain bitset, bit i for step i.
    pub fn flag_bits(&self) -> U256 {
        self.source_flags
            .iter()
            .enumerate()
            .filter(|(_, from_hashes)| **from_hashes)
            .fold(U256::ZERO, |bits, (i, _)| bits | (U256::from(1u8) << i))
    }

    /// Recomputes the root the way the on-chain verifier does, or `None` when
    /// the proof is malformed for `leaves`.
    pub fn compute_root(&self, leaves: &[B256]) -> Option<B256> {
        let steps = (leaves.len() + self.hashes.len()).checked_sub(1)?;
        if leaves.is_empty() || steps > MAX_PROOF_DEPTH || steps != self.source_flags.len() {
            return None;
        }
        if steps == 0 {
            return leaves.first().copied();
        }

        let mut computed: Vec<B256> = Vec::with_capacity(steps);
        let (mut leaf_pos, mut hash_pos, mut proof_pos) = (0, 0, 0);
        let mut next_node = |computed: &[B256]| {
            if leaf_pos < leaves.len() {
                leaf_pos += 1;
                leaves.get(leaf_pos - 1).copied()
            } else {
                hash_pos += 1;
                computed.get(hash_pos - 1).copied()
            }
        };
        for from_nodes in &self.source_flags {
            let a = next_node(&computed)?;
            let b = if *from_nodes {
                next_node(&computed)?
            } else {
                proof_pos += 1;
                *self.hashes.get(proof_pos - 1)?
            };
            computed.push(hash_internal(&a, &b));
        }
        if leaf_pos != leaves.len() || hash_pos != steps - 1 || proof_pos != self.hashes.len() {
            return None;
        }
        computed.last().copied()
    }

    pub fn verify(&self, leaf: B256, root: B256) -> bool {
        self.compute_root(&[leaf]) == Some(root)
    }
}
