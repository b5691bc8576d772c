use alloy_primitives::{Address, B256};
use alloy_rpc_types::Filter;
use ccip_types::ChainLog;

/// The part of a block header the tool cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockHeader {
    pub number: u64,
    pub timestamp: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    /// false when the transaction reverted
    pub status: bool,
    pub gas_used: u64,
    pub logs: Vec<ChainLog>,
}

/// Log filter over one contract and one event, inclusive block range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogQuery {
    pub address: Address,
    pub event_signature: B256,
    pub from_block: u64,
    pub to_block: u64,
    pub topic1: Option<B256>,
    pub topic2: Option<B256>,
}

impl LogQuery {
    pub fn new(address: Address, event_signature: B256, from_block: u64, to_block: u64) -> Self {
        Self {
            address,
            event_signature,
            from_block,
            to_block,
            topic1: None,
            topic2: None,
        }
    }

    pub fn with_topic1(mut self, topic: B256) -> Self {
        self.topic1 = Some(topic);
        self
    }

    pub fn with_topic2(mut self, topic: B256) -> Self {
        self.topic2 = Some(topic);
        self
    }

    /// Same filter restricted to `[from_block, to_block]`.
    pub fn with_range(&self, from_block: u64, to_block: u64) -> Self {
        Self {
            from_block,
            to_block,
            ..self.clone()
        }
    }

    /// Client side evaluation of the filter, used by the in-memory chain.
    pub fn matches(&self, log: &ChainLog) -> bool {
        let in_range = log
            .block_number
            .is_some_and(|n| self.from_block <= n && n <= self.to_block);
        let topic_matches = |index: usize, wanted: Option<B256>| {
            wanted.is_none_or(|wanted| log.topics.get(index) == Some(&wanted))
        };

        log.address == self.address
            && in_range
            && topic_matches(0, Some(self.event_signature))
            && topic_matches(1, self.topic1)
            && topic_matches(2, self.topic2)
    }

    pub fn to_filter(&self) -> Filter {
        let mut filter = Filter::new()
            .address(self.address)
            .event_signature(self.event_signature)
            .from_block(self.from_block)
            .to_block(self.to_block);
        if let Some(topic) = self.topic1 {
            filter = filter.topic1(topic);
        }
        if let Some(topic) = self.topic2 {
            filter = filter.topic2(topic);
        }
        filter
    }
}
