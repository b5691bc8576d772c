use alloy_primitives::B256;
use ccip_types::{CommitReport, LeafHasher, MerkleTree, Proof, SentMessage};
use tracing::{debug, info};

use crate::error::IntegrityError;

/// An inclusion proof for one message, checked against the committed root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvenMessage {
    pub message: SentMessage,
    pub leaf: B256,
    pub root: B256,
    pub proof: Proof,
}

/// Hashes the interval's messages, rebuilds the tree and proves `sequence_number`.
///
/// `messages` must be the report's full interval, ordered by sequence number.
pub fn prove_message(
    hasher: &LeafHasher,
    report: &CommitReport,
    messages: &[SentMessage],
    sequence_number: u64,
) -> Result<ProvenMessage, IntegrityError> {
    let leaves: Vec<B256> = messages.iter().map(|sent| hasher.hash(&sent.message)).collect();
    let tree = MerkleTree::new(leaves)?;
    debug!("rebuilt tree over {} leaves, depth {}", tree.leaf_count(), tree.depth());

    if tree.root() != report.merkle_root {
        return Err(IntegrityError::RootMismatch {
            computed: tree.root(),
            committed: report.merkle_root,
        });
    }

    let index = messages
        .iter()
        .position(|sent| sent.sequence_number() == sequence_number)
        .ok_or(IntegrityError::IncompleteInterval {
            min: report.interval_min,
            max: report.interval_max,
            found: messages.len(),
            missing: sequence_number,
        })?;
    let proof = tree.prove(&[index])?;
    let leaf = tree.leaves()[index];

    if !proof.verify(leaf, tree.root()) {
        return Err(IntegrityError::InvalidProof(tree.root()));
    }
    info!(
        "proof for sequence number {sequence_number}: leaf {index} of {}, {} sibling(s), flag bits {}",
        tree.leaf_count(),
        proof.hashes.len(),
        proof.flag_bits()
    );

    Ok(ProvenMessage {
        message: messages[index].clone(),
        leaf,
        root: tree.root(),
        proof,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, Bytes, U256, address};
    use ccip_types::abi::EVM2EVMMessage;
    use ccip_types::hasher::hash_leaf;

    const ON_RAMP: Address = address!("0x00000000000000000000000000000000000000a1");

    fn hasher() -> LeafHasher {
        LeafHasher::new(3379446385462418246, 7759470850252068959, ON_RAMP)
    }

    fn sent(seq: u64) -> SentMessage {
        SentMessage::new(
            EVM2EVMMessage {
                sourceChainSelector: 3379446385462418246,
                sender: Address::repeat_byte(1),
                receiver: Address::repeat_byte(2),
                sequenceNumber: seq,
                gasLimit: U256::from(100_000),
                strict: false,
                nonce: seq,
                feeToken: Address::ZERO,
                feeTokenAmount: U256::ZERO,
                data: Bytes::from(seq.to_be_bytes().to_vec()),
                tokenAmounts: vec![],
                sourceTokenData: vec![],
                messageId: B256::with_last_byte(seq as u8),
            },
            ON_RAMP,
        )
    }

    fn committed(min: u64, max: u64) -> (CommitReport, Vec<SentMessage>) {
        let messages: Vec<_> = (min..=max).map(sent).collect();
        let leaves = messages.iter().map(|m| hasher().hash(&m.message)).collect();
        let root = MerkleTree::new(leaves).unwrap().root();
        (CommitReport::new(min, max, root), messages)
    }

    #[test]
    fn test_proves_every_message_of_interval() {
        let (report, messages) = committed(11, 17);
        for seq in 11..=17 {
            let proven = prove_message(&hasher(), &report, &messages, seq).unwrap();
            assert_eq!(proven.message.sequence_number(), seq);
            assert_eq!(proven.root, report.merkle_root);
            assert_eq!(
                proven.leaf,
                hash_leaf(&proven.message.message, 3379446385462418246, 7759470850252068959, ON_RAMP)
            );
            assert!(proven.proof.verify(proven.leaf, report.merkle_root));
        }
    }

    #[test]
    fn test_root_mismatch() {
        let (mut report, messages) = committed(1, 4);
        report.merkle_root.0[0] ^= 0x80;
        assert!(matches!(
            prove_message(&hasher(), &report, &messages, 2),
            Err(IntegrityError::RootMismatch { .. })
        ));
    }

    #[test]
    fn test_wrong_lane_does_not_match() {
        let (report, messages) = committed(1, 4);
        let other_lane = LeafHasher::new(1, 2, ON_RAMP);
        assert!(matches!(
            prove_message(&other_lane, &report, &messages, 2),
            Err(IntegrityError::RootMismatch { .. })
        ));
    }

    #[test]
    fn test_no_messages() {
        let report = CommitReport::new(1, 1, B256::ZERO);
        assert!(matches!(
            prove_message(&hasher(), &report, &[], 1),
            Err(IntegrityError::Merkle(_))
        ));
    }
}
