use std::fmt::Display;
use std::time::Duration;

use alloy_primitives::B256;
use ccip_types::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("invalid rpc url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid signer key: {0}")]
    InvalidKey(String),

    #[error("rpc call {method} failed: {reason}")]
    Rpc { method: &'static str, reason: String },

    #[error("block {0} not found")]
    BlockNotFound(u64),

    #[error("no receipt for transaction {hash} after {waited:?}")]
    ReceiptTimeout { hash: B256, waited: Duration },

    #[error("client has no signer configured")]
    NoSigner,

    #[error("failed to decode return data of {function}: {reason}")]
    ReturnDecode { function: &'static str, reason: String },

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ChainError {
    pub fn rpc(method: &'static str, err: impl Display) -> Self {
        Self::Rpc {
            method,
            reason: err.to_string(),
        }
    }
}
