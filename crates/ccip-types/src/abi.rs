//! Solidity interface of the lane contracts (OnRamp, CommitStore, OffRamp).
//!
//! The layouts below are owned by the deployed contracts; leaf hashes, event
//! signatures and the `manuallyExecute` calldata all depend on them matching
//! byte for byte.

use alloy_sol_types::sol;

sol! {
    #[derive(Debug, PartialEq, Eq)]
    struct EVMTokenAmount {
        address token;
        uint256 amount;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct EVM2EVMMessage {
        uint64 sourceChainSelector;
        address sender;
        address receiver;
        uint64 sequenceNumber;
        uint256 gasLimit;
        bool strict;
        uint64 nonce;
        address feeToken;
        uint256 feeTokenAmount;
        bytes data;
        EVMTokenAmount[] tokenAmounts;
        bytes[] sourceTokenData;
        bytes32 messageId;
    }

    /// Emitted by the OnRamp for every accepted send.
    #[derive(Debug)]
    event CCIPSendRequested(EVM2EVMMessage message);

    #[derive(Debug, PartialEq, Eq)]
    struct TokenPriceUpdate {
        address sourceToken;
        uint224 usdPerToken;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct GasPriceUpdate {
        uint64 destChainSelector;
        uint224 usdPerUnitGas;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct PriceUpdates {
        TokenPriceUpdate[] tokenPriceUpdates;
        GasPriceUpdate[] gasPriceUpdates;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct Interval {
        uint64 min;
        uint64 max;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct CommitReport {
        PriceUpdates priceUpdates;
        Interval interval;
        bytes32 merkleRoot;
    }

    /// Emitted by the CommitStore when a report (interval + root) is accepted.
    #[derive(Debug)]
    event ReportAccepted(CommitReport report);

    /// Emitted by the OffRamp on every execution attempt.
    #[derive(Debug)]
    event ExecutionStateChanged(
        uint64 indexed sequenceNumber,
        bytes32 indexed messageId,
        uint8 state,
        bytes returnData
    );

    #[derive(Debug, PartialEq, Eq)]
    struct ExecutionReport {
        EVM2EVMMessage[] messages;
        bytes[][] offchainTokenData;
        bytes32[] proofs;
        uint256 proofFlagBits;
    }

    #[derive(Debug, PartialEq, Eq)]
    struct GasLimitOverride {
        uint256 receiverExecutionGasLimit;
        uint32[] tokenGasOverrides;
    }

    /// OffRamp entry point for operator driven execution.
    #[derive(Debug)]
    function manuallyExecute(ExecutionReport report, GasLimitOverride[] gasLimitOverrides) external;

    /// CommitStore lookup, returns the block timestamp at which the root was committed (0 if unknown).
    #[derive(Debug)]
    function getMerkleRoot(bytes32 root) external view returns (uint256);

    /// OffRamp lookup of the current execution state of a sequence number.
    #[derive(Debug)]
    function getExecutionState(uint64 sequenceNumber) external view returns (uint8);
}
