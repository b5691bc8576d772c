//! Leaf hashing for EVM2EVM messages.
//!
//! A leaf commits to the lane (source selector, destination selector, OnRamp)
//! through the metadata hash, so the same message on another lane never yields
//! the same leaf.

use alloy_primitives::{Address, B256, keccak256};
use alloy_sol_types::SolValue;

use crate::abi::EVM2EVMMessage;

/// Domain separator prepended to every leaf preimage.
pub const LEAF_DOMAIN_SEPARATOR: B256 = B256::ZERO;

/// Version tag mixed into the lane metadata hash.
pub const MESSAGE_HASH_VERSION: &str = "EVM2EVMMessageHashV2";

/// Hashes messages of a single lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LeafHasher {
    metadata_hash: B256,
}

impl LeafHasher {
    pub fn new(source_chain_selector: u64, dest_chain_selector: u64, on_ramp: Address) -> Self {
        let metadata_hash = keccak256(
            (
                keccak256(MESSAGE_HASH_VERSION.as_bytes()),
                source_chain_selector,
                dest_chain_selector,
                on_ramp,
            )
                .abi_encode_params(),
        );
        Self { metadata_hash }
    }

    /// The lane metadata hash shared by every leaf of this lane.
    pub fn metadata_hash(&self) -> B256 {
        self.metadata_hash
    }

    pub fn hash(&self, message: &EVM2EVMMessage) -> B256 {
        let fixed_size_fields = (
            message.sender,
            message.receiver,
            message.sequenceNumber,
            message.gasLimit,
            message.strict,
            message.nonce,
            message.feeToken,
            message.feeTokenAmount,
        )
            .abi_encode_params();

        keccak256(
            (
                LEAF_DOMAIN_SEPARATOR,
                self.metadata_hash,
                keccak256(fixed_size_fields),
                keccak256(&message.data),
                keccak256(message.tokenAmounts.abi_encode()),
                keccak256(message.sourceTokenData.abi_encode()),
            )
                .abi_encode_params(),
        )
    }
}

/// One-shot form of [`LeafHasher::hash`].
pub fn hash_leaf(
    message: &EVM2EVMMessage,
    source_chain_selector: u64,
    dest_chain_selector: u64,
    on_ramp: Address,
) -> B256 {
    LeafHasher::new(source_chain_selector, dest_chain_selector, on_ramp).hash(message)
}
