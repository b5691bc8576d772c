use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes};
use alloy_sol_types::SolCall;
use async_trait::async_trait;
use ccip_types::ChainLog;
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::error::ChainError;
use crate::types::{BlockHeader, LogQuery, TxReceipt};

/// Read and submit capability against one chain.
#[async_trait]
pub trait ChainClient: Send + Sync {
    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Latest block height.
    async fn block_number(&self) -> Result<u64, ChainError>;

    async fn header(&self, number: u64) -> Result<BlockHeader, ChainError>;

    /// Returns `None` while the transaction is unknown or pending.
    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, ChainError>;

    async fn logs(&self, query: &LogQuery) -> Result<Vec<ChainLog>, ChainError>;

    /// Read-only contract call against the latest state.
    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainError>;

    /// Signs and broadcasts a transaction, returning its hash.
    async fn send_transaction(&self, to: Address, input: Bytes) -> Result<B256, ChainError>;

    /// Polls for the receipt of `hash` until it shows up or `timeout` elapses.
    async fn wait_for_receipt(
        &self,
        hash: B256,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<TxReceipt, ChainError> {
        let started = Instant::now();
        loop {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                return Ok(receipt);
            }
            if started.elapsed() >= timeout {
                return Err(ChainError::ReceiptTimeout {
                    hash,
                    waited: started.elapsed(),
                });
            }
            debug!("receipt for {hash} not available yet");
            sleep(poll_interval).await;
        }
    }
}

/// Typed read-only call of a `sol!` function.
pub async fn call_contract<C: SolCall>(client: &dyn ChainClient, to: Address, call: &C) -> Result<C::Return, ChainError> {
    let output = client.call(to, call.abi_encode().into()).await?;
    C::abi_decode_returns(&output).map_err(|e| ChainError::ReturnDecode {
        function: C::SIGNATURE,
        reason: e.to_string(),
    })
}
