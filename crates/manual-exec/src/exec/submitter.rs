//! Execution payload assembly, submission and confirmation.
//!
//! The flow is a typestate chain: [`ExecutionPayload`] → [`Submitted`] →
//! [`Confirmed`] → [`Verified`]. Each transition consumes the previous state,
//! and any failure ends the run.

use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, U256};
use alloy_sol_types::SolCall;
use ccip_chain::{ChainClient, LogQuery, LogScanner, ScanControl, TxReceipt};
use ccip_types::abi::{ExecutionReport, GasLimitOverride, manuallyExecuteCall};
use ccip_types::{EventDecoder, ExecutionStateChange, ExecutionStateChangedDecoder, ExecutionState};
use tracing::{debug, info, warn};

use crate::error::{ChainSide, ManualExecError, NotFound};
use crate::exec::prove::ProvenMessage;

/// A single-message execution report with its gas overrides, ready to submit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutionPayload {
    pub sequence_number: u64,
    pub message_id: B256,
    pub report: ExecutionReport,
    pub gas_limit_overrides: Vec<GasLimitOverride>,
    pub gas_limit: u64,
}

impl ExecutionPayload {
    /// `token_gas_overrides` apply only when there is one per token of the
    /// message; otherwise every token gets zero.
    pub fn build(proven: &ProvenMessage, gas_limit: u64, token_gas_overrides: &[u32]) -> Self {
        let message = &proven.message.message;
        let token_count = message.tokenAmounts.len();

        let token_gas = if token_gas_overrides.len() == token_count {
            token_gas_overrides.to_vec()
        } else {
            if !token_gas_overrides.is_empty() {
                warn!(
                    "ignoring {} token gas override(s), message carries {token_count} token(s)",
                    token_gas_overrides.len()
                );
            }
            vec![0; token_count]
        };

        let report = ExecutionReport {
            messages: vec![message.clone()],
            offchainTokenData: vec![vec![Bytes::new(); token_count]],
            proofs: proven.proof.hashes.clone(),
            proofFlagBits: proven.proof.flag_bits(),
        };

        Self {
            sequence_number: message.sequenceNumber,
            message_id: message.messageId,
            report,
            gas_limit_overrides: vec![GasLimitOverride {
                receiverExecutionGasLimit: U256::from(gas_limit),
                tokenGasOverrides: token_gas,
            }],
            gas_limit,
        }
    }

    /// `manuallyExecute` calldata.
    pub fn calldata(&self) -> Bytes {
        manuallyExecuteCall {
            report: self.report.clone(),
            gasLimitOverrides: self.gas_limit_overrides.clone(),
        }
        .abi_encode()
        .into()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submitted {
    pub payload: ExecutionPayload,
    pub transaction_hash: B256,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmed {
    pub payload: ExecutionPayload,
    pub receipt: TxReceipt,
}

/// Terminal state: the OffRamp recorded a successful execution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verified {
    pub sequence_number: u64,
    pub message_id: B256,
    pub state_change: ExecutionStateChange,
    /// `None` when the message had already been executed before this run.
    pub receipt: Option<TxReceipt>,
}

pub struct ExecutionSubmitter<'a> {
    dest: &'a dyn ChainClient,
    off_ramp: Address,
    page_size: u64,
    receipt_timeout: Duration,
    poll_interval: Duration,
}

impl<'a> ExecutionSubmitter<'a> {
    pub fn new(
        dest: &'a dyn ChainClient,
        off_ramp: Address,
        page_size: u64,
        receipt_timeout: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            dest,
            off_ramp,
            page_size,
            receipt_timeout,
            poll_interval,
        }
    }

    pub async fn submit(&self, payload: ExecutionPayload) -> Result<Submitted, ManualExecError> {
        info!(
            "submitting manuallyExecute for sequence number {} to {}",
            payload.sequence_number, self.off_ramp
        );
        let transaction_hash = self
            .dest
            .send_transaction(self.off_ramp, payload.calldata())
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Destination, e))?;
        info!("execution transaction sent: {transaction_hash}");
        Ok(Submitted {
            payload,
            transaction_hash,
        })
    }

    pub async fn confirm(&self, submitted: Submitted) -> Result<Confirmed, ManualExecError> {
        let receipt = self
            .dest
            .wait_for_receipt(submitted.transaction_hash, self.receipt_timeout, self.poll_interval)
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Destination, e))?;
        if !receipt.status {
            return Err(ManualExecError::execution(
                format!("transaction {} reverted", submitted.transaction_hash),
                submitted.payload.gas_limit,
            ));
        }
        debug!(
            "execution transaction mined in block {:?}, gas used {}",
            receipt.block_number, receipt.gas_used
        );
        Ok(Confirmed {
            payload: submitted.payload,
            receipt,
        })
    }

    /// Checks that the OffRamp logged exactly one successful execution of the message.
    pub async fn verify(&self, confirmed: Confirmed, from_block: u64) -> Result<Verified, ManualExecError> {
        let payload = confirmed.payload;
        let state_change = self
            .successful_execution(payload.sequence_number, payload.message_id, payload.gas_limit, from_block)
            .await?;
        Ok(Verified {
            sequence_number: payload.sequence_number,
            message_id: payload.message_id,
            state_change,
            receipt: Some(confirmed.receipt),
        })
    }

    /// Verification for a message the OffRamp already reports as executed.
    pub async fn verify_existing(
        &self,
        sequence_number: u64,
        message_id: B256,
        gas_limit: u64,
        from_block: u64,
    ) -> Result<Verified, ManualExecError> {
        let state_change = self
            .successful_execution(sequence_number, message_id, gas_limit, from_block)
            .await?;
        Ok(Verified {
            sequence_number,
            message_id,
            state_change,
            receipt: None,
        })
    }

    async fn successful_execution(
        &self,
        sequence_number: u64,
        message_id: B256,
        gas_limit: u64,
        from_block: u64,
    ) -> Result<ExecutionStateChange, ManualExecError> {
        let decoder = ExecutionStateChangedDecoder;
        let latest = self
            .dest
            .block_number()
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Destination, e))?;
        let (seq_topic, id_topic) = ExecutionStateChangedDecoder::topics_for(sequence_number, message_id);
        let query = LogQuery::new(self.off_ramp, decoder.signature(), from_block, latest)
            .with_topic1(seq_topic)
            .with_topic2(id_topic);

        let mut changes = vec![];
        LogScanner::new(self.dest, self.page_size)
            .scan(&query, &decoder, |change| {
                debug!(
                    "execution state of {sequence_number} changed to {} in block {:?}",
                    change.state, change.block_number
                );
                changes.push(change);
                ScanControl::Continue
            })
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Destination, e))?;

        let last_state = match changes.last() {
            Some(change) => change.state,
            None => return Err(NotFound::StateChange(sequence_number).into()),
        };
        let mut successes: Vec<_> = changes.into_iter().filter(ExecutionStateChange::is_success).collect();
        match successes.len() {
            1 => Ok(successes.remove(0)),
            0 => {
                let state = ExecutionState::from_u8(last_state)
                    .map_or_else(|| format!("unknown state {last_state}"), |s| s.to_string());
                Err(ManualExecError::execution(
                    format!("message {sequence_number} ended in state {state}"),
                    gas_limit,
                ))
            }
            n => Err(ManualExecError::execution(
                format!("expected one successful execution of {sequence_number}, observed {n}"),
                gas_limit,
            )),
        }
    }
}
