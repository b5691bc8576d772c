//! Types shared by the CCIP manual execution tooling: the lane contract ABI,
//! event decoders, leaf hashing and the commit merkle tree.

pub mod abi;
pub mod events;
pub mod hasher;
pub mod log;
pub mod merkle;
pub mod message;
pub mod selectors;

pub use events::{DecodeError, EventDecoder, ExecutionStateChangedDecoder, ReportAcceptedDecoder, SendRequestedDecoder};
pub use hasher::{LeafHasher, hash_leaf};
pub use log::ChainLog;
pub use merkle::{MerkleError, MerkleTree, Proof};
pub use message::{CommitReport, ExecutionState, ExecutionStateChange, SentMessage};
pub use selectors::chain_selector;
