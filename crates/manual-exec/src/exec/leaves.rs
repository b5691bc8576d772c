use std::collections::BTreeMap;

use alloy_primitives::Address;
use ccip_chain::{ChainClient, LogQuery, LogScanner, ScanControl};
use ccip_types::{CommitReport, EventDecoder, SendRequestedDecoder, SentMessage};
use tracing::{debug, info};

use crate::error::{ChainSide, IntegrityError, ManualExecError};

/// Rebuilds the ordered message sequence of a commit report from the OnRamp's logs.
pub struct LeafCollector<'a, D = SendRequestedDecoder> {
    source: &'a dyn ChainClient,
    on_ramp: Address,
    page_size: u64,
    decoder: D,
}

impl<'a> LeafCollector<'a> {
    pub fn new(source: &'a dyn ChainClient, on_ramp: Address, page_size: u64) -> Self {
        Self::with_decoder(source, on_ramp, page_size, SendRequestedDecoder)
    }
}

impl<'a, D: EventDecoder<Event = SentMessage>> LeafCollector<'a, D> {
    pub fn with_decoder(source: &'a dyn ChainClient, on_ramp: Address, page_size: u64, decoder: D) -> Self {
        Self {
            source,
            on_ramp,
            page_size,
            decoder,
        }
    }

    /// Scans `[from_block, to_block]` until every message of `report` is seen
    /// or a later sequence number shows up.
    pub async fn collect(
        &self,
        report: &CommitReport,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<SentMessage>, ManualExecError> {
        let query = LogQuery::new(self.on_ramp, self.decoder.signature(), from_block, to_block);
        let expected = report.size();
        let mut collected = BTreeMap::new();

        let pages = LogScanner::new(self.source, self.page_size)
            .scan(&query, &self.decoder, |sent| {
                let seq = sent.sequence_number();
                if seq > report.interval_max {
                    return ScanControl::Stop;
                }
                if report.contains(seq) {
                    if collected.contains_key(&seq) {
                        debug!("duplicate send event for sequence number {seq}, keeping the first");
                    } else {
                        collected.insert(seq, sent);
                    }
                }
                if collected.len() as u64 == expected {
                    ScanControl::Stop
                } else {
                    ScanControl::Continue
                }
            })
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Source, e))?;

        info!(
            "collected {} of {expected} message(s) for interval [{}, {}] over {pages} page(s)",
            collected.len(),
            report.interval_min,
            report.interval_max
        );
        ordered_leaves(report, collected).map_err(ManualExecError::from)
    }
}

/// Checks that `messages` (keyed by sequence number) cover the report's interval exactly.
pub fn ordered_leaves(
    report: &CommitReport,
    messages: BTreeMap<u64, SentMessage>,
) -> Result<Vec<SentMessage>, IntegrityError> {
    let found = messages.len();
    let mut expected = report.interval_min..=report.interval_max;
    let mut ordered = Vec::with_capacity(found);

    for (seq, message) in messages.into_iter().filter(|(seq, _)| report.contains(*seq)) {
        match expected.next() {
            Some(next) if next == seq => ordered.push(message),
            Some(missing) => {
                return Err(IntegrityError::IncompleteInterval {
                    min: report.interval_min,
                    max: report.interval_max,
                    found,
                    missing,
                });
            }
            None => break,
        }
    }
    if let Some(missing) = expected.next() {
        return Err(IntegrityError::IncompleteInterval {
            min: report.interval_min,
            max: report.interval_max,
            found,
            missing,
        });
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, Bytes, U256, address};
    use ccip_chain::MockChainClient;
    use ccip_types::ChainLog;
    use ccip_types::abi::{CCIPSendRequested, EVM2EVMMessage};

    const ON_RAMP: Address = address!("0x00000000000000000000000000000000000000a1");

    fn message(seq: u64, nonce: u64) -> EVM2EVMMessage {
        EVM2EVMMessage {
            sourceChainSelector: 1,
            sender: Address::ZERO,
            receiver: Address::ZERO,
            sequenceNumber: seq,
            gasLimit: U256::ZERO,
            strict: false,
            nonce,
            feeToken: Address::ZERO,
            feeTokenAmount: U256::ZERO,
            data: Bytes::new(),
            tokenAmounts: vec![],
            sourceTokenData: vec![],
            messageId: B256::with_last_byte(seq as u8),
        }
    }

    fn send(seq: u64) -> ChainLog {
        ChainLog::from_event(ON_RAMP, &CCIPSendRequested { message: message(seq, seq) })
    }

    /// Message `seq` is sent in block `10 * seq`.
    fn source(seqs: impl IntoIterator<Item = u64>) -> MockChainClient {
        seqs.into_iter()
            .fold(MockChainClient::new(1).with_blocks(300, 0, 12), |chain, seq| {
                chain.with_transaction(B256::with_last_byte(seq as u8), seq * 10, vec![send(seq)])
            })
    }

    fn sent(seq: u64) -> SentMessage {
        SentMessage::new(message(seq, seq), ON_RAMP)
    }

    #[tokio::test]
    async fn test_collects_interval_in_order() {
        let source = source(1..=20);
        let report = CommitReport::new(5, 9, B256::ZERO);
        let leaves = LeafCollector::new(&source, ON_RAMP, 25).collect(&report, 0, 299).await.unwrap();

        let seqs: Vec<_> = leaves.iter().map(SentMessage::sequence_number).collect();
        assert_eq!(seqs, vec![5, 6, 7, 8, 9]);
        // seq 9 lives in block 90, the scan stops in the page [75, 99]
        assert_eq!(source.log_queries().last().map(|q| q.to_block), Some(99));
    }

    #[tokio::test]
    async fn test_stops_on_later_sequence_number() {
        // 7 never made it on chain, 8 marks the end of the interval
        let source = source([5, 6, 8, 9]);
        let report = CommitReport::new(5, 7, B256::ZERO);
        let err = LeafCollector::new(&source, ON_RAMP, 1_000).collect(&report, 0, 299).await.unwrap_err();
        assert!(matches!(
            err,
            ManualExecError::Integrity(IntegrityError::IncompleteInterval { found: 2, missing: 7, .. })
        ));
    }

    #[tokio::test]
    async fn test_lookback_too_short_is_incomplete() {
        let source = source(1..=10);
        let report = CommitReport::new(1, 10, B256::ZERO);
        let err = LeafCollector::new(&source, ON_RAMP, 1_000).collect(&report, 45, 299).await.unwrap_err();
        assert!(matches!(
            err,
            ManualExecError::Integrity(IntegrityError::IncompleteInterval { found: 6, missing: 1, .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_send_keeps_first() {
        let mut replay = message(6, 99);
        replay.data = Bytes::from_static(b"replayed");
        let source = source(5..=7).with_transaction(
            B256::repeat_byte(0xdd),
            65,
            vec![ChainLog::from_event(ON_RAMP, &CCIPSendRequested { message: replay })],
        );
        let report = CommitReport::new(5, 7, B256::ZERO);
        let leaves = LeafCollector::new(&source, ON_RAMP, 1_000).collect(&report, 0, 299).await.unwrap();
        assert_eq!(leaves.len(), 3);
        assert_eq!(leaves[1].message.nonce, 6);
    }

    #[test]
    fn test_ordered_leaves_detects_gap() {
        let report = CommitReport::new(1, 4, B256::ZERO);
        let messages: BTreeMap<_, _> = [1, 2, 4].into_iter().map(|seq| (seq, sent(seq))).collect();
        assert_eq!(
            ordered_leaves(&report, messages),
            Err(IntegrityError::IncompleteInterval {
                min: 1,
                max: 4,
                found: 3,
                missing: 3
            })
        );
    }

    #[test]
    fn test_ordered_leaves_complete() {
        let report = CommitReport::new(3, 5, B256::ZERO);
        let messages: BTreeMap<_, _> = (3..=5).map(|seq| (seq, sent(seq))).collect();
        let ordered = ordered_leaves(&report, messages).unwrap();
        assert_eq!(ordered.iter().map(|m| m.sequence_number()).collect::<Vec<_>>(), vec![3, 4, 5]);
    }
}
