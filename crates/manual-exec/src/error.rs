use std::fmt::{Display, Formatter, Result as FmtResult};

use alloy_primitives::B256;
use ccip_chain::ChainError;
use ccip_types::MerkleError;
use thiserror::Error;

/// Which side of the lane a chain call went to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChainSide {
    Source,
    Destination,
}

impl Display for ChainSide {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Source => f.write_str("source"),
            Self::Destination => f.write_str("destination"),
        }
    }
}

/// Every configuration problem found in one validation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfigErrors(pub Vec<String>);

impl ConfigErrors {
    pub fn single(problem: impl Into<String>) -> Self {
        Self(vec![problem.into()])
    }

    pub fn push(&mut self, problem: impl Into<String>) {
        self.0.push(problem.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl Display for ConfigErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} configuration error(s)", self.0.len())?;
        for problem in &self.0 {
            write!(f, "\n  - {problem}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConfigErrors {}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotFound {
    #[error("message not found in source transaction {tx}: {reason}")]
    Message { tx: B256, reason: String },

    #[error("source transaction {0} has no receipt")]
    Receipt(B256),

    #[error("sequence number {0} not found in any commit report")]
    CommitReport(u64),

    #[error("no ExecutionStateChanged event found for sequence number {0}")]
    StateChange(u64),

    #[error("{side} block {number} not found")]
    Block { side: ChainSide, number: u64 },

    #[error("no destination block at or before timestamp {0}")]
    DestinationBlock(u64),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntegrityError {
    #[error("interval [{min}, {max}] is incomplete: collected {found} message(s), sequence number {missing} missing")]
    IncompleteInterval { min: u64, max: u64, found: usize, missing: u64 },

    #[error("root doesn't match: rebuilt {computed}, committed {committed}")]
    RootMismatch { computed: B256, committed: B256 },

    #[error("merkle root {0} is not known to the commit store")]
    RootNotCommitted(B256),

    #[error("generated proof does not verify against root {0}")]
    InvalidProof(B256),

    #[error("malformed log on {side} chain: {reason}")]
    MalformedLog { side: ChainSide, reason: String },

    #[error(transparent)]
    Merkle(#[from] MerkleError),
}

#[derive(Debug, Error)]
pub enum ManualExecError {
    #[error(transparent)]
    Config(#[from] ConfigErrors),

    #[error("{side} chain unreachable: {source}")]
    Connectivity {
        side: ChainSide,
        #[source]
        source: ChainError,
    },

    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error(transparent)]
    Integrity(#[from] IntegrityError),

    #[error("execution failed: {reason}; consider raising gas_limit_override (currently {gas_limit})")]
    Execution { reason: String, gas_limit: u64 },
}

impl ManualExecError {
    /// Classifies a chain client failure.
    pub fn chain(side: ChainSide, err: ChainError) -> Self {
        match err {
            ChainError::BlockNotFound(number) => NotFound::Block { side, number }.into(),
            ChainError::Decode(e) => IntegrityError::MalformedLog {
                side,
                reason: e.to_string(),
            }
            .into(),
            source => Self::Connectivity { side, source },
        }
    }

    pub fn execution(reason: impl Into<String>, gas_limit: u64) -> Self {
        Self::Execution {
            reason: reason.into(),
            gas_limit,
        }
    }
}
