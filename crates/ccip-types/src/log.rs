use alloy_primitives::{Address, B256, Bytes, LogData};
use alloy_sol_types::SolEvent;

/// A chain log reduced to what the decoders and scanners need.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<B256>,
    pub log_index: Option<u64>,
}

impl ChainLog {
    pub fn new(address: Address, topics: Vec<B256>, data: Bytes) -> Self {
        Self {
            address,
            topics,
            data,
            ..Default::default()
        }
    }

    /// Builds the log an emitting contract would produce for `event`.
    pub fn from_event<E: SolEvent>(address: Address, event: &E) -> Self {
        let data = event.encode_log_data();
        Self::new(address, data.topics().to_vec(), data.data)
    }

    pub fn with_block(mut self, block_number: u64) -> Self {
        self.block_number = Some(block_number);
        self
    }

    pub fn with_transaction(mut self, transaction_hash: B256, log_index: u64) -> Self {
        self.transaction_hash = Some(transaction_hash);
        self.log_index = Some(log_index);
        self
    }

    pub fn topic0(&self) -> Option<&B256> {
        self.topics.first()
    }

    pub fn log_data(&self) -> LogData {
        LogData::new_unchecked(self.topics.clone(), self.data.clone())
    }
}
