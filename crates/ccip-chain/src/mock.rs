//! In-memory chain for tests and dry runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use alloy_primitives::{Address, B256, Bytes, keccak256};
use async_trait::async_trait;
use ccip_types::ChainLog;

use crate::client::ChainClient;
use crate::error::ChainError;
use crate::types::{BlockHeader, LogQuery, TxReceipt};

/// Produces the logs a submitted transaction emits.
pub type SendHook = Box<dyn Fn(&SentTransaction) -> Vec<ChainLog> + Send + Sync>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentTransaction {
    pub hash: B256,
    pub to: Address,
    pub input: Bytes,
    pub block_number: u64,
}

#[derive(Default)]
struct ChainState {
    // block number -> timestamp
    headers: BTreeMap<u64, u64>,
    logs: Vec<ChainLog>,
    receipts: HashMap<B256, TxReceipt>,
    sent: Vec<SentTransaction>,
    header_probes: usize,
    log_queries: Vec<LogQuery>,
}

impl ChainState {
    fn latest(&self) -> u64 {
        self.headers.last_key_value().map_or(0, |(number, _)| *number)
    }
}

/// [`ChainClient`] backed by in-memory headers, logs, receipts and canned call results.
///
/// Submitted transactions are mined into a new block immediately; the logs
/// they emit come from the [`SendHook`] registered with [`MockChainClient::on_send`].
pub struct MockChainClient {
    chain_id: u64,
    block_time: u64,
    calls: HashMap<(Address, Bytes), Bytes>,
    revert_sends: bool,
    on_send: Option<SendHook>,
    state: Mutex<ChainState>,
}

impl MockChainClient {
    pub fn new(chain_id: u64) -> Self {
        Self {
            chain_id,
            block_time: 12,
            calls: HashMap::new(),
            revert_sends: false,
            on_send: None,
            state: Mutex::new(ChainState::default()),
        }
    }

    /// Adds blocks `0..count` spaced `block_time` seconds apart.
    pub fn with_blocks(mut self, count: u64, genesis_timestamp: u64, block_time: u64) -> Self {
        self.block_time = block_time;
        let state = self.state_mut();
        for number in 0..count {
            state.headers.insert(number, genesis_timestamp + number * block_time);
        }
        self
    }

    pub fn with_header(mut self, number: u64, timestamp: u64) -> Self {
        self.state_mut().headers.insert(number, timestamp);
        self
    }

    pub fn with_log(mut self, log: ChainLog) -> Self {
        self.state_mut().logs.push(log);
        self
    }

    /// Records a successful transaction mined in `block_number` that emitted `logs`.
    pub fn with_transaction(mut self, hash: B256, block_number: u64, logs: Vec<ChainLog>) -> Self {
        let logs = stamp(logs, hash, block_number);
        let state = self.state_mut();
        state.logs.extend(logs.iter().cloned());
        state.receipts.insert(
            hash,
            TxReceipt {
                transaction_hash: hash,
                block_number: Some(block_number),
                status: true,
                gas_used: 21_000,
                logs,
            },
        );
        self
    }

    /// Answers read-only calls to `to` with exactly this calldata.
    pub fn with_call_response(mut self, to: Address, input: impl Into<Bytes>, output: impl Into<Bytes>) -> Self {
        self.calls.insert((to, input.into()), output.into());
        self
    }

    pub fn on_send(mut self, hook: impl Fn(&SentTransaction) -> Vec<ChainLog> + Send + Sync + 'static) -> Self {
        self.on_send = Some(Box::new(hook));
        self
    }

    /// Every submitted transaction gets a reverted receipt.
    pub fn reverting_sends(mut self) -> Self {
        self.revert_sends = true;
        self
    }

    pub fn sent_transactions(&self) -> Vec<SentTransaction> {
        self.state().sent.clone()
    }

    /// Number of `header` calls served so far.
    pub fn header_probes(&self) -> usize {
        self.state().header_probes
    }

    pub fn reset_header_probes(&self) {
        self.state().header_probes = 0;
    }

    pub fn log_queries(&self) -> Vec<LogQuery> {
        self.state().log_queries.clone()
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn state_mut(&mut self) -> &mut ChainState {
        self.state.get_mut().unwrap_or_else(PoisonError::into_inner)
    }
}

fn stamp(logs: Vec<ChainLog>, hash: B256, block_number: u64) -> Vec<ChainLog> {
    logs.into_iter()
        .enumerate()
        .map(|(index, log)| log.with_block(block_number).with_transaction(hash, index as u64))
        .collect()
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.chain_id)
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        Ok(self.state().latest())
    }

    async fn header(&self, number: u64) -> Result<BlockHeader, ChainError> {
        let mut state = self.state();
        state.header_probes += 1;
        let timestamp = *state.headers.get(&number).ok_or(ChainError::BlockNotFound(number))?;
        Ok(BlockHeader { number, timestamp })
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, ChainError> {
        Ok(self.state().receipts.get(&hash).cloned())
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<ChainLog>, ChainError> {
        let mut state = self.state();
        state.log_queries.push(query.clone());
        let mut logs: Vec<_> = state.logs.iter().filter(|log| query.matches(log)).cloned().collect();
        logs.sort_by_key(|log| (log.block_number, log.log_index));
        Ok(logs)
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainError> {
        self.calls
            .get(&(to, input))
            .cloned()
            .ok_or_else(|| ChainError::rpc("eth_call", "execution reverted"))
    }

    async fn send_transaction(&self, to: Address, input: Bytes) -> Result<B256, ChainError> {
        let mut state = self.state();
        let block_number = state.latest() + 1;
        let timestamp = state.headers.get(&state.latest()).map_or(0, |ts| ts + self.block_time);
        state.headers.insert(block_number, timestamp);

        let mut preimage = input.to_vec();
        preimage.extend_from_slice(&(state.sent.len() as u64).to_be_bytes());
        let hash = keccak256(preimage);

        let sent = SentTransaction {
            hash,
            to,
            input,
            block_number,
        };
        let logs = match (&self.on_send, self.revert_sends) {
            (Some(hook), false) => stamp(hook(&sent), hash, block_number),
            _ => vec![],
        };
        state.logs.extend(logs.iter().cloned());
        state.receipts.insert(
            hash,
            TxReceipt {
                transaction_hash: hash,
                block_number: Some(block_number),
                status: !self.revert_sends,
                gas_used: 21_000,
                logs,
            },
        );
        state.sent.push(sent);
        Ok(hash)
    }
}
