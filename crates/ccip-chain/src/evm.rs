use std::str::FromStr;

use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, B256, Bytes};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types::{BlockNumberOrTag, Log, TransactionReceipt, TransactionRequest};
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use ccip_types::ChainLog;
use tracing::debug;
use url::Url;

use crate::client::ChainClient;
use crate::error::ChainError;
use crate::types::{BlockHeader, LogQuery, TxReceipt};

pub type DefaultProvider = DynProvider;

/// [`ChainClient`] over a JSON-RPC endpoint.
#[derive(Clone)]
pub struct EvmChainClient {
    provider: DefaultProvider,
    url: Url,
    sender: Option<Address>,
}

impl EvmChainClient {
    /// Read-only client.
    pub fn connect(rpc_url: &str) -> Result<Self, ChainError> {
        let url = parse_url(rpc_url)?;
        let provider = ProviderBuilder::new().connect_http(url.clone()).erased();
        Ok(Self {
            provider,
            url,
            sender: None,
        })
    }

    /// Client that signs submitted transactions with `private_key` (hex, with or without 0x).
    pub fn connect_with_signer(rpc_url: &str, private_key: &str) -> Result<Self, ChainError> {
        let url = parse_url(rpc_url)?;
        let signer = PrivateKeySigner::from_str(private_key).map_err(|e| ChainError::InvalidKey(e.to_string()))?;
        let sender = signer.address();
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url.clone())
            .erased();
        Ok(Self {
            provider,
            url,
            sender: Some(sender),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn sender(&self) -> Option<Address> {
        self.sender
    }

    pub fn provider(&self) -> &DefaultProvider {
        &self.provider
    }
}

#[async_trait]
impl ChainClient for EvmChainClient {
    async fn chain_id(&self) -> Result<u64, ChainError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| ChainError::rpc("eth_chainId", e))
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map_err(|e| ChainError::rpc("eth_blockNumber", e))
    }

    async fn header(&self, number: u64) -> Result<BlockHeader, ChainError> {
        let block = self
            .provider
            .get_block_by_number(BlockNumberOrTag::Number(number))
            .await
            .map_err(|e| ChainError::rpc("eth_getBlockByNumber", e))?
            .ok_or(ChainError::BlockNotFound(number))?;
        Ok(BlockHeader {
            number: block.header.number,
            timestamp: block.header.timestamp,
        })
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<TxReceipt>, ChainError> {
        let receipt = self
            .provider
            .get_transaction_receipt(hash)
            .await
            .map_err(|e| ChainError::rpc("eth_getTransactionReceipt", e))?;
        Ok(receipt.as_ref().map(to_receipt))
    }

    async fn logs(&self, query: &LogQuery) -> Result<Vec<ChainLog>, ChainError> {
        debug!(
            "eth_getLogs address={} blocks=[{}, {}]",
            query.address, query.from_block, query.to_block
        );
        let logs = self
            .provider
            .get_logs(&query.to_filter())
            .await
            .map_err(|e| ChainError::rpc("eth_getLogs", e))?;
        Ok(logs.iter().map(to_chain_log).collect())
    }

    async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, ChainError> {
        let tx = TransactionRequest::default().with_to(to).with_input(input);
        self.provider
            .call(tx)
            .await
            .map_err(|e| ChainError::rpc("eth_call", e))
    }

    async fn send_transaction(&self, to: Address, input: Bytes) -> Result<B256, ChainError> {
        let sender = self.sender.ok_or(ChainError::NoSigner)?;
        let tx = TransactionRequest::default()
            .with_from(sender)
            .with_to(to)
            .with_input(input);
        let pending = self
            .provider
            .send_transaction(tx)
            .await
            .map_err(|e| ChainError::rpc("eth_sendRawTransaction", e))?;
        Ok(*pending.tx_hash())
    }
}

fn parse_url(rpc_url: &str) -> Result<Url, ChainError> {
    Url::parse(rpc_url).map_err(|e| ChainError::InvalidUrl {
        url: rpc_url.to_string(),
        reason: e.to_string(),
    })
}

fn to_chain_log(log: &Log) -> ChainLog {
    ChainLog {
        address: log.address(),
        topics: log.topics().to_vec(),
        data: log.data().data.clone(),
        block_number: log.block_number,
        transaction_hash: log.transaction_hash,
        log_index: log.log_index,
    }
}

fn to_receipt(receipt: &TransactionReceipt) -> TxReceipt {
    TxReceipt {
        transaction_hash: receipt.transaction_hash,
        block_number: receipt.block_number,
        status: receipt.status(),
        gas_used: receipt.gas_used,
        logs: receipt.inner.logs().iter().map(to_chain_log).collect(),
    }
}
