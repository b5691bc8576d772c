use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, U256, address};
use alloy_sol_types::{SolCall, SolValue};
use ccip_chain::{ChainClient, ChainError, LogQuery, LogScanner, MockChainClient, ScanControl, call_contract};
use ccip_types::abi::{ExecutionStateChanged, getMerkleRootCall};
use ccip_types::{ChainLog, EventDecoder, ExecutionStateChangedDecoder};

const OFF_RAMP: Address = address!("0x00000000000000000000000000000000000000f0");

fn state_changed(seq: u64, state: u8) -> ChainLog {
    ChainLog::from_event(
        OFF_RAMP,
        &ExecutionStateChanged {
            sequenceNumber: seq,
            messageId: B256::with_last_byte(seq as u8),
            state,
            returnData: Bytes::new(),
        },
    )
}

/// One execution event every 10 blocks, in blocks 5, 15, ..., 95.
fn chain() -> MockChainClient {
    (0..10).fold(MockChainClient::new(1337).with_blocks(100, 1_000, 12), |chain, i| {
        chain.with_transaction(B256::with_last_byte(i as u8 + 1), 5 + i * 10, vec![state_changed(i, 2)])
    })
}

#[tokio::test]
async fn test_scan_pages_whole_range() {
    let chain = chain();
    let scanner = LogScanner::new(&chain, 25);
    let query = LogQuery::new(OFF_RAMP, ExecutionStateChangedDecoder.signature(), 0, 99);

    let mut seen = vec![];
    let pages = scanner
        .scan(&query, &ExecutionStateChangedDecoder, |change| {
            seen.push(change.sequence_number);
            ScanControl::Continue
        })
        .await
        .unwrap();

    assert_eq!(pages, 4);
    assert_eq!(seen, (0..10).collect::<Vec<_>>());
    let ranges: Vec<_> = chain.log_queries().iter().map(|q| (q.from_block, q.to_block)).collect();
    assert_eq!(ranges, vec![(0, 24), (25, 49), (50, 74), (75, 99)]);
}

#[tokio::test]
async fn test_scan_stops_paging_on_first_match() {
    let chain = chain();
    let scanner = LogScanner::new(&chain, 20);
    let query = LogQuery::new(OFF_RAMP, ExecutionStateChangedDecoder.signature(), 0, 99);

    let mut found = None;
    let pages = scanner
        .scan(&query, &ExecutionStateChangedDecoder, |change| {
            if change.sequence_number == 3 {
                found = Some(change);
                return ScanControl::Stop;
            }
            ScanControl::Continue
        })
        .await
        .unwrap();

    assert_eq!(found.map(|c| c.block_number), Some(Some(35)));
    assert_eq!(pages, 2);
    assert_eq!(chain.log_queries().len(), 2);
}

#[tokio::test]
async fn test_scan_filters_indexed_topics() {
    let chain = chain();
    let scanner = LogScanner::new(&chain, 1_000);
    let (seq_topic, id_topic) = ExecutionStateChangedDecoder::topics_for(7, B256::with_last_byte(7));
    let query = LogQuery::new(OFF_RAMP, ExecutionStateChangedDecoder.signature(), 0, 99)
        .with_topic1(seq_topic)
        .with_topic2(id_topic);

    let mut seen = vec![];
    scanner
        .scan(&query, &ExecutionStateChangedDecoder, |change| {
            seen.push(change);
            ScanControl::Continue
        })
        .await
        .unwrap();

    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].sequence_number, 7);
    assert!(seen[0].is_success());
}

#[tokio::test]
async fn test_send_mines_block_and_emits_hook_logs() {
    let chain = MockChainClient::new(1)
        .with_blocks(10, 0, 12)
        .on_send(|_| vec![state_changed(42, 2)]);

    let hash = chain.send_transaction(OFF_RAMP, Bytes::from_static(&[1, 2, 3])).await.unwrap();
    let receipt = chain
        .wait_for_receipt(hash, Duration::from_secs(1), Duration::from_millis(10))
        .await
        .unwrap();

    assert!(receipt.status);
    assert_eq!(receipt.block_number, Some(10));
    assert_eq!(receipt.logs.len(), 1);
    assert_eq!(receipt.logs[0].transaction_hash, Some(hash));
    assert_eq!(chain.block_number().await.unwrap(), 10);
    assert_eq!(chain.header(10).await.unwrap().timestamp, 120);
    assert_eq!(chain.sent_transactions()[0].to, OFF_RAMP);
}

#[tokio::test]
async fn test_reverting_send_has_failed_receipt() {
    let chain = MockChainClient::new(1)
        .with_blocks(2, 0, 12)
        .on_send(|_| vec![state_changed(1, 2)])
        .reverting_sends();

    let hash = chain.send_transaction(OFF_RAMP, Bytes::new()).await.unwrap();
    let receipt = chain.transaction_receipt(hash).await.unwrap().unwrap();
    assert!(!receipt.status);
    assert!(receipt.logs.is_empty());
}

#[tokio::test]
async fn test_wait_for_receipt_times_out() {
    let chain = MockChainClient::new(1);
    let err = chain
        .wait_for_receipt(B256::repeat_byte(1), Duration::from_millis(30), Duration::from_millis(5))
        .await
        .unwrap_err();
    assert!(matches!(err, ChainError::ReceiptTimeout { .. }));
}

#[tokio::test]
async fn test_typed_call() {
    let root = B256::repeat_byte(0xaa);
    let call = getMerkleRootCall { root };
    let chain = MockChainClient::new(1).with_call_response(OFF_RAMP, call.abi_encode(), U256::from(1_700_000_000u64).abi_encode());

    let committed_at = call_contract(&chain, OFF_RAMP, &call).await.unwrap();
    assert_eq!(committed_at, U256::from(1_700_000_000u64));

    let unknown = getMerkleRootCall { root: B256::ZERO };
    assert!(matches!(
        call_contract(&chain, OFF_RAMP, &unknown).await,
        Err(ChainError::Rpc { method: "eth_call", .. })
    ));
}

#[tokio::test]
async fn test_header_probes_are_counted() {
    let chain = MockChainClient::new(1).with_blocks(5, 100, 1);
    chain.header(0).await.unwrap();
    chain.header(4).await.unwrap();
    assert!(matches!(chain.header(5).await, Err(ChainError::BlockNotFound(5))));
    assert_eq!(chain.header_probes(), 3);
    chain.reset_header_probes();
    assert_eq!(chain.header_probes(), 0);
}
