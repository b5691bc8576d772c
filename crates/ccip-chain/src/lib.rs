pub mod client;
pub mod error;
pub mod evm;
pub mod mock;
pub mod scan;
pub mod types;

pub use client::{ChainClient, call_contract};
pub use error::ChainError;
pub use evm::{DefaultProvider, EvmChainClient};
pub use mock::MockChainClient;
pub use scan::{LogScanner, ScanControl};
pub use types::{BlockHeader, LogQuery, TxReceipt};
