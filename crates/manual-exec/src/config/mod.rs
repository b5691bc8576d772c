use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use alloy_primitives::{Address, B256};
use alloy_signer_local::PrivateKeySigner;
use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::error::ConfigErrors;

pub const DEFAULT_CONFIG_PATH: &str = "./config.json";
pub const DEFAULT_SOURCE_LOOKBACK_BLOCKS: u64 = 5_000;
pub const DEFAULT_LOG_PAGE_SIZE: u64 = 2_000;
pub const DEFAULT_RECEIPT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_RECEIPT_POLL_INTERVAL_SECS: u64 = 2;

/// Operator supplied configuration, as read from the JSON file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// RPC endpoint of the chain the message was sent from.
    pub src_rpc: String,

    /// RPC endpoint of the chain the message is executed on.
    pub dest_rpc: String,

    /// Hex private key of the account that submits the execution.
    pub dest_owner_key: String,

    /// CommitStore contract on the destination chain.
    pub commit_store: String,

    /// OffRamp contract on the destination chain.
    pub off_ramp: String,

    /// Hash of the source transaction that emitted the message.
    pub source_chain_tx: String,

    /// Message id, selects the message when the transaction sent several.
    pub ccip_msg_id: Option<String>,

    /// First destination block to scan for commit reports.
    pub dest_start_block: Option<u64>,

    /// Destination deployment height, lower bound for the block search when
    /// `dest_start_block` is not set.
    pub dest_deployed_at: Option<u64>,

    /// Gas limit handed to the receiver during execution.
    pub gas_limit_override: u64,

    /// Log index of the send event, alternative to `ccip_msg_id`.
    pub send_log_index: Option<u64>,

    /// Per token gas overrides, applied when the count matches the message's tokens.
    pub token_gas_overrides: Option<Vec<u32>>,

    /// How far before the send block to look for the other messages of the interval.
    pub source_lookback_blocks: u64,

    /// Block window of every eth_getLogs request.
    pub log_page_size: u64,

    pub receipt_timeout_secs: u64,

    pub receipt_poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            src_rpc: String::new(),
            dest_rpc: String::new(),
            dest_owner_key: String::new(),
            commit_store: String::new(),
            off_ramp: String::new(),
            source_chain_tx: String::new(),
            ccip_msg_id: None,
            dest_start_block: None,
            dest_deployed_at: None,
            gas_limit_override: 0,
            send_log_index: None,
            token_gas_overrides: None,
            source_lookback_blocks: DEFAULT_SOURCE_LOOKBACK_BLOCKS,
            log_page_size: DEFAULT_LOG_PAGE_SIZE,
            receipt_timeout_secs: DEFAULT_RECEIPT_TIMEOUT_SECS,
            receipt_poll_interval_secs: DEFAULT_RECEIPT_POLL_INTERVAL_SECS,
        }
    }
}

/// Where the destination scans start.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DestStart {
    /// Explicit start height.
    Block(u64),
    /// Search for the block matching the send time, no lower than this height.
    DeployedAt(u64),
}

/// Validated, typed form of [`Config`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecArgs {
    pub src_rpc: Url,
    pub dest_rpc: Url,
    pub dest_owner_key: String,
    pub commit_store: Address,
    pub off_ramp: Address,
    pub source_chain_tx: B256,
    pub message_id: Option<B256>,
    pub dest_start: DestStart,
    pub gas_limit_override: u64,
    pub send_log_index: Option<u64>,
    pub token_gas_overrides: Vec<u32>,
    pub source_lookback_blocks: u64,
    pub log_page_size: u64,
    pub receipt_timeout: Duration,
    pub receipt_poll_interval: Duration,
}

impl Config {
    /// Reads the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigErrors> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigErrors::single(format!("config file not found at {}", path.display())));
        }

        info!("Reading config file at {}", path.display());
        let json = fs::read_to_string(path)
            .map_err(|e| ConfigErrors::single(format!("failed to read {}: {e}", path.display())))?;
        serde_json::from_str(&json)
            .map_err(|e| ConfigErrors::single(format!("failed to parse {}: {e}", path.display())))
    }

    /// Checks every field and reports all problems at once.
    pub fn validate(&self) -> Result<ExecArgs, ConfigErrors> {
        let mut errors = ConfigErrors::default();

        let src_rpc = parse_url("src_rpc", &self.src_rpc, &mut errors);
        let dest_rpc = parse_url("dest_rpc", &self.dest_rpc, &mut errors);

        if self.dest_owner_key.is_empty() {
            errors.push("dest_owner_key is required");
        } else if PrivateKeySigner::from_str(&self.dest_owner_key).is_err() {
            errors.push("dest_owner_key is not a valid hex private key");
        }

        let commit_store = parse_address("commit_store", &self.commit_store, &mut errors);
        let off_ramp = parse_address("off_ramp", &self.off_ramp, &mut errors);
        let source_chain_tx = parse_hash("source_chain_tx", &self.source_chain_tx, &mut errors);
        let message_id = match self.ccip_msg_id.as_deref().filter(|id| !id.is_empty()) {
            Some(id) => parse_hash("ccip_msg_id", id, &mut errors),
            None => None,
        };

        let start_block = self.dest_start_block.filter(|n| *n > 0);
        let deployed_at = self.dest_deployed_at.filter(|n| *n > 0);
        // an explicit start block wins; the deployment height only seeds the search
        let dest_start = match (start_block, deployed_at) {
            (Some(block), _) => Some(DestStart::Block(block)),
            (None, Some(block)) => Some(DestStart::DeployedAt(block)),
            (None, None) => {
                errors.push("one of dest_start_block or dest_deployed_at must be greater than zero");
                None
            }
        };

        if self.gas_limit_override == 0 {
            errors.push("gas_limit_override must be greater than zero");
        }
        if self.log_page_size == 0 {
            errors.push("log_page_size must be greater than zero");
        }
        if self.receipt_timeout_secs == 0 {
            errors.push("receipt_timeout_secs must be greater than zero");
        }
        if self.receipt_poll_interval_secs == 0 {
            errors.push("receipt_poll_interval_secs must be greater than zero");
        }

        match (src_rpc, dest_rpc, commit_store, off_ramp, source_chain_tx, dest_start) {
            (Some(src_rpc), Some(dest_rpc), Some(commit_store), Some(off_ramp), Some(source_chain_tx), Some(dest_start))
                if errors.is_empty() =>
            {
                Ok(ExecArgs {
                    src_rpc,
                    dest_rpc,
                    dest_owner_key: self.dest_owner_key.clone(),
                    commit_store,
                    off_ramp,
                    source_chain_tx,
                    message_id,
                    dest_start,
                    gas_limit_override: self.gas_limit_override,
                    send_log_index: self.send_log_index,
                    token_gas_overrides: self.token_gas_overrides.clone().unwrap_or_default(),
                    source_lookback_blocks: self.source_lookback_blocks,
                    log_page_size: self.log_page_size,
                    receipt_timeout: Duration::from_secs(self.receipt_timeout_secs),
                    receipt_poll_interval: Duration::from_secs(self.receipt_poll_interval_secs),
                })
            }
            _ => Err(errors),
        }
    }
}

fn parse_url(field: &str, value: &str, errors: &mut ConfigErrors) -> Option<Url> {
    if value.is_empty() {
        errors.push(format!("{field} is required"));
        return None;
    }
    Url::parse(value)
        .map_err(|e| errors.push(format!("{field} is not a valid url: {e}")))
        .ok()
}

fn parse_address(field: &str, value: &str, errors: &mut ConfigErrors) -> Option<Address> {
    Address::from_str(value)
        .map_err(|_| errors.push(format!("{field} is not a valid address: {value:?}")))
        .ok()
}

fn parse_hash(field: &str, value: &str, errors: &mut ConfigErrors) -> Option<B256> {
    B256::from_str(value)
        .map_err(|_| errors.push(format!("{field} is not a valid 32 byte hex value: {value:?}")))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn valid() -> Config {
        Config {
            src_rpc: "http://127.0.0.1:8545".into(),
            dest_rpc: "http://127.0.0.1:9545".into(),
            dest_owner_key: KEY.into(),
            commit_store: "0x00000000000000000000000000000000000000c0".into(),
            off_ramp: "0x00000000000000000000000000000000000000f0".into(),
            source_chain_tx: format!("0x{}", "ab".repeat(32)),
            dest_start_block: Some(100),
            gas_limit_override: 200_000,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        let args = valid().validate().unwrap();
        assert_eq!(args.dest_start, DestStart::Block(100));
        assert_eq!(args.source_chain_tx, B256::repeat_byte(0xab));
        assert_eq!(args.message_id, None);
        assert_eq!(args.log_page_size, DEFAULT_LOG_PAGE_SIZE);
        assert_eq!(args.receipt_timeout, Duration::from_secs(DEFAULT_RECEIPT_TIMEOUT_SECS));
        assert!(args.token_gas_overrides.is_empty());
    }

    #[test]
    fn test_deployed_at_used_without_start_block() {
        let config = Config {
            dest_start_block: None,
            dest_deployed_at: Some(42),
            ..valid()
        };
        assert_eq!(config.validate().unwrap().dest_start, DestStart::DeployedAt(42));

        // zero counts as unset
        let config = Config {
            dest_start_block: Some(0),
            dest_deployed_at: Some(42),
            ..valid()
        };
        assert_eq!(config.validate().unwrap().dest_start, DestStart::DeployedAt(42));
    }

    #[test]
    fn test_start_block_takes_precedence() {
        let both = Config {
            dest_start_block: Some(100),
            dest_deployed_at: Some(42),
            ..valid()
        };
        assert_eq!(both.validate().unwrap().dest_start, DestStart::Block(100));

        let neither = Config {
            dest_start_block: None,
            ..valid()
        };
        assert_eq!(neither.validate().unwrap_err().len(), 1);
    }

    #[test]
    fn test_all_problems_reported_together() {
        let config = Config {
            src_rpc: String::new(),
            dest_rpc: "not a url".into(),
            dest_owner_key: "xyz".into(),
            commit_store: "0x1234".into(),
            source_chain_tx: String::new(),
            ccip_msg_id: Some("0xdead".into()),
            gas_limit_override: 0,
            ..valid()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 7, "{errors}");
        assert!(errors.0.iter().any(|e| e.starts_with("src_rpc is required")));
        assert!(errors.0.iter().any(|e| e.starts_with("gas_limit_override")));
        assert!(errors.0.iter().any(|e| e.starts_with("ccip_msg_id")));
    }

    #[test]
    fn test_empty_message_id_is_unset() {
        let config = Config {
            ccip_msg_id: Some(String::new()),
            ..valid()
        };
        assert_eq!(config.validate().unwrap().message_id, None);
    }

    #[test]
    fn test_load_applies_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "src_rpc": "http://127.0.0.1:8545",
                "dest_rpc": "http://127.0.0.1:9545",
                "dest_owner_key": "{KEY}",
                "commit_store": "0x00000000000000000000000000000000000000c0",
                "off_ramp": "0x00000000000000000000000000000000000000f0",
                "source_chain_tx": "0x{tx}",
                "dest_deployed_at": 7,
                "gas_limit_override": 300000,
                "token_gas_overrides": [1000, 2000]
            }}"#,
            tx = "cd".repeat(32)
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.source_lookback_blocks, DEFAULT_SOURCE_LOOKBACK_BLOCKS);
        assert_eq!(config.receipt_poll_interval_secs, DEFAULT_RECEIPT_POLL_INTERVAL_SECS);

        let args = config.validate().unwrap();
        assert_eq!(args.dest_start, DestStart::DeployedAt(7));
        assert_eq!(args.token_gas_overrides, vec![1000, 2000]);
        assert_eq!(args.gas_limit_override, 300_000);
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let missing = Config::load(dir.path().join("config.json")).unwrap_err();
        assert!(missing.0[0].starts_with("config file not found"));

        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();
        let broken = Config::load(&path).unwrap_err();
        assert!(broken.0[0].starts_with("failed to parse"));
    }
}
