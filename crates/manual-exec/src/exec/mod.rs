//! The manual execution pipeline.
//!
//! locate message → resolve destination start → find commit report →
//! collect interval → prove → on-chain pre-checks → submit → confirm → verify.
//! Every stage takes the previous stage's output by value or reference and
//! returns a typed result.

pub mod commit;
pub mod correlator;
pub mod leaves;
pub mod locator;
pub mod prove;
pub mod submitter;

use alloy_primitives::{B256, U256};
use ccip_chain::{ChainClient, call_contract};
use ccip_types::abi::{getExecutionStateCall, getMerkleRootCall};
use ccip_types::selectors::{chain_name, chain_selector};
use ccip_types::{CommitReport, ExecutionState, LeafHasher, SentMessage};
use tracing::{info, warn};

use crate::config::{DestStart, ExecArgs};
use crate::error::{ChainSide, ConfigErrors, IntegrityError, ManualExecError, NotFound};

pub use commit::CommitReportFinder;
pub use correlator::BlockCorrelator;
pub use leaves::LeafCollector;
pub use locator::{LocatedMessage, MessageLocator};
pub use prove::{ProvenMessage, prove_message};
pub use submitter::{ExecutionPayload, ExecutionSubmitter, Verified};

/// Source and destination chain selectors of the lane.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Lane {
    pub source_chain_selector: u64,
    pub dest_chain_selector: u64,
}

/// What a successful run did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub sequence_number: u64,
    pub message_id: B256,
    pub merkle_root: B256,
    /// Execution transaction sent by this run, `None` if the message was already executed.
    pub transaction_hash: Option<B256>,
    pub block_number: Option<u64>,
}

impl ExecutionOutcome {
    pub fn already_executed(&self) -> bool {
        self.transaction_hash.is_none()
    }
}

pub struct ManualExecution<'a> {
    source: &'a dyn ChainClient,
    dest: &'a dyn ChainClient,
    args: &'a ExecArgs,
}

impl<'a> ManualExecution<'a> {
    pub fn new(source: &'a dyn ChainClient, dest: &'a dyn ChainClient, args: &'a ExecArgs) -> Self {
        Self { source, dest, args }
    }

    pub async fn run(&self) -> Result<ExecutionOutcome, ManualExecError> {
        let lane = self.resolve_lane().await?;
        let located = self.locate_message().await?;
        let seq = located.sequence_number();
        info!("executing {}", located.sent);

        let dest_start = self.dest_start_block(&located).await?;
        let dest_latest = self.dest_latest().await?;
        let report = CommitReportFinder::new(self.dest, self.args.commit_store, self.args.log_page_size)
            .find(seq, dest_start, dest_latest)
            .await?;

        let messages = self.collect_interval(&report, &located).await?;
        let hasher = LeafHasher::new(lane.source_chain_selector, lane.dest_chain_selector, located.sent.on_ramp);
        let proven = prove_message(&hasher, &report, &messages, seq)?;

        self.ensure_root_committed(proven.root).await?;

        let submitter = ExecutionSubmitter::new(
            self.dest,
            self.args.off_ramp,
            self.args.log_page_size,
            self.args.receipt_timeout,
            self.args.receipt_poll_interval,
        );
        let verified = if self.execution_state(seq).await? == Some(ExecutionState::Success) {
            warn!("sequence number {seq} is already executed, skipping submission");
            submitter
                .verify_existing(seq, located.message_id(), self.args.gas_limit_override, dest_start)
                .await?
        } else {
            let payload = ExecutionPayload::build(&proven, self.args.gas_limit_override, &self.args.token_gas_overrides);
            let submitted = submitter.submit(payload).await?;
            let confirmed = submitter.confirm(submitted).await?;
            submitter.verify(confirmed, dest_start).await?
        };

        let outcome = ExecutionOutcome {
            sequence_number: verified.sequence_number,
            message_id: verified.message_id,
            merkle_root: proven.root,
            transaction_hash: verified.receipt.as_ref().map(|r| r.transaction_hash),
            block_number: verified
                .receipt
                .as_ref()
                .and_then(|r| r.block_number)
                .or(verified.state_change.block_number),
        };
        info!(
            "message executed: seq={} id={} tx={} block={}",
            outcome.sequence_number,
            outcome.message_id,
            verified
                .state_change
                .transaction_hash
                .map_or_else(|| "unknown".to_string(), |h| h.to_string()),
            outcome.block_number.map_or_else(|| "unknown".to_string(), |b| b.to_string()),
        );
        Ok(outcome)
    }

    /// Maps both chain ids to CCIP selectors.
    pub async fn resolve_lane(&self) -> Result<Lane, ManualExecError> {
        let source_id = self
            .source
            .chain_id()
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Source, e))?;
        let dest_id = self
            .dest
            .chain_id()
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Destination, e))?;

        let mut errors = ConfigErrors::default();
        let source_chain_selector = chain_selector(source_id);
        let dest_chain_selector = chain_selector(dest_id);
        if source_chain_selector.is_none() {
            errors.push(format!("source chain id {source_id} has no known chain selector"));
        }
        if dest_chain_selector.is_none() {
            errors.push(format!("destination chain id {dest_id} has no known chain selector"));
        }
        match (source_chain_selector, dest_chain_selector) {
            (Some(source_chain_selector), Some(dest_chain_selector)) => {
                info!(
                    "lane {} -> {}",
                    chain_name(source_id).unwrap_or("unknown"),
                    chain_name(dest_id).unwrap_or("unknown")
                );
                Ok(Lane {
                    source_chain_selector,
                    dest_chain_selector,
                })
            }
            _ => Err(errors.into()),
        }
    }

    pub async fn locate_message(&self) -> Result<LocatedMessage, ManualExecError> {
        let tx = self.args.source_chain_tx;
        let receipt = self
            .source
            .transaction_receipt(tx)
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Source, e))?
            .ok_or(NotFound::Receipt(tx))?;
        MessageLocator::new(self.args.message_id, self.args.send_log_index).locate(&receipt)
    }

    /// First destination block scanned for the commit report and the execution events.
    pub async fn dest_start_block(&self, located: &LocatedMessage) -> Result<u64, ManualExecError> {
        match self.args.dest_start {
            DestStart::Block(block) => Ok(block),
            DestStart::DeployedAt(deployed_at) => {
                let sent_at = self
                    .source
                    .header(located.source_block)
                    .await
                    .map_err(|e| ManualExecError::chain(ChainSide::Source, e))?
                    .timestamp;
                let latest = self.dest_latest().await?;
                let block = BlockCorrelator::new(self.dest)
                    .approximate(sent_at, deployed_at, latest)
                    .await?;
                info!("destination start block {block} approximated from send time {sent_at}");
                Ok(block)
            }
        }
    }

    async fn collect_interval(
        &self,
        report: &CommitReport,
        located: &LocatedMessage,
    ) -> Result<Vec<SentMessage>, ManualExecError> {
        let from = located.source_block.saturating_sub(self.args.source_lookback_blocks);
        let to = self
            .source
            .block_number()
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Source, e))?;
        LeafCollector::new(self.source, located.sent.on_ramp, self.args.log_page_size)
            .collect(report, from, to)
            .await
    }

    async fn ensure_root_committed(&self, root: B256) -> Result<(), ManualExecError> {
        let committed_at: U256 = call_contract(self.dest, self.args.commit_store, &getMerkleRootCall { root })
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Destination, e))?;
        if committed_at.is_zero() {
            return Err(IntegrityError::RootNotCommitted(root).into());
        }
        Ok(())
    }

    async fn execution_state(&self, sequence_number: u64) -> Result<Option<ExecutionState>, ManualExecError> {
        let state = call_contract(
            self.dest,
            self.args.off_ramp,
            &getExecutionStateCall {
                sequenceNumber: sequence_number,
            },
        )
        .await
        .map_err(|e| ManualExecError::chain(ChainSide::Destination, e))?;
        info!("on-chain execution state of {sequence_number}: {state}");
        Ok(ExecutionState::from_u8(state))
    }

    async fn dest_latest(&self) -> Result<u64, ManualExecError> {
        self.dest
            .block_number()
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Destination, e))
    }
}
