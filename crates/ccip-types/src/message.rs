use std::fmt::{Display, Formatter, Result as FmtResult};

use alloy_primitives::{Address, B256, Bytes};

use crate::abi::EVM2EVMMessage;

/// A message read from an OnRamp `CCIPSendRequested` log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentMessage {
    pub message: EVM2EVMMessage,
    // the OnRamp that emitted the log, part of the leaf domain
    pub on_ramp: Address,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<B256>,
    pub log_index: Option<u64>,
}

impl SentMessage {
    pub fn new(message: EVM2EVMMessage, on_ramp: Address) -> Self {
        Self {
            message,
            on_ramp,
            block_number: None,
            transaction_hash: None,
            log_index: None,
        }
    }

    pub fn sequence_number(&self) -> u64 {
        self.message.sequenceNumber
    }

    pub fn message_id(&self) -> B256 {
        self.message.messageId
    }

    pub fn token_count(&self) -> usize {
        self.message.tokenAmounts.len()
    }
}

impl Display for SentMessage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "seq={} id={} sender={} receiver={} tokens={}",
            self.sequence_number(),
            self.message_id(),
            self.message.sender,
            self.message.receiver,
            self.token_count()
        )
    }
}

/// A CommitStore report: the inclusive sequence number interval and the merkle root over its leaves.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitReport {
    pub interval_min: u64,
    pub interval_max: u64,
    pub merkle_root: B256,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<B256>,
}

impl CommitReport {
    pub fn new(interval_min: u64, interval_max: u64, merkle_root: B256) -> Self {
        Self {
            interval_min,
            interval_max,
            merkle_root,
            block_number: None,
            transaction_hash: None,
        }
    }

    pub fn contains(&self, sequence_number: u64) -> bool {
        self.interval_min <= sequence_number && sequence_number <= self.interval_max
    }

    /// Number of messages the report commits to.
    pub fn size(&self) -> u64 {
        self.interval_max - self.interval_min + 1
    }

    /// Position of a sequence number in the report's leaf sequence.
    pub fn leaf_index(&self, sequence_number: u64) -> Option<usize> {
        self.contains(sequence_number)
            .then(|| (sequence_number - self.interval_min) as usize)
    }
}

impl Display for CommitReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "interval=[{}, {}] root={}",
            self.interval_min, self.interval_max, self.merkle_root
        )
    }
}

/// OffRamp execution states, as stored in the contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionState {
    Untouched,
    InProgress,
    Success,
    Failure,
}

impl ExecutionState {
    pub fn from_u8(state: u8) -> Option<Self> {
        match state {
            0 => Some(Self::Untouched),
            1 => Some(Self::InProgress),
            2 => Some(Self::Success),
            3 => Some(Self::Failure),
            _ => None,
        }
    }
}

impl Display for ExecutionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            Self::Untouched => "UNTOUCHED",
            Self::InProgress => "IN_PROGRESS",
            Self::Success => "SUCCESS",
            Self::Failure => "FAILURE",
        };
        f.write_str(name)
    }
}

/// A decoded `ExecutionStateChanged` log.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionStateChange {
    pub sequence_number: u64,
    pub message_id: B256,
    pub state: u8,
    pub return_data: Bytes,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<B256>,
}

impl ExecutionStateChange {
    pub fn execution_state(&self) -> Option<ExecutionState> {
        ExecutionState::from_u8(self.state)
    }

    pub fn is_success(&self) -> bool {
        self.execution_state() == Some(ExecutionState::Success)
    }
}
