//! Decoders for the three lane events the manual execution flow reads.
//!
//! Each decoder knows the topic0 of its event and turns a raw [`ChainLog`] into
//! a domain type. Scanners are generic over [`EventDecoder`] so they can be run
//! against synthetic logs.

use alloy_primitives::B256;
use alloy_sol_types::SolEvent;
use thiserror::Error;

use crate::abi::{CCIPSendRequested, ExecutionStateChanged, ReportAccepted};
use crate::log::ChainLog;
use crate::message::{CommitReport, ExecutionStateChange, SentMessage};

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to decode {event} log: {source}")]
    Abi {
        event: &'static str,
        #[source]
        source: alloy_sol_types::Error,
    },
    #[error("commit report has an inverted interval [{min}, {max}]")]
    InvalidInterval { min: u64, max: u64 },
}

/// Decoding capability for a single event type.
pub trait EventDecoder {
    type Event;

    /// Human readable event signature, used in logs and errors.
    fn name(&self) -> &'static str;

    /// The event's topic0.
    fn signature(&self) -> B256;

    fn decode(&self, log: &ChainLog) -> Result<Self::Event, DecodeError>;

    /// Whether the log carries this decoder's topic0.
    fn matches(&self, log: &ChainLog) -> bool {
        log.topic0() == Some(&self.signature())
    }
}

/// OnRamp `CCIPSendRequested`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SendRequestedDecoder;

impl EventDecoder for SendRequestedDecoder {
    type Event = SentMessage;

    fn name(&self) -> &'static str {
        CCIPSendRequested::SIGNATURE
    }

    fn signature(&self) -> B256 {
        CCIPSendRequested::SIGNATURE_HASH
    }

    fn decode(&self, log: &ChainLog) -> Result<SentMessage, DecodeError> {
        let event = CCIPSendRequested::decode_log_data(&log.log_data()).map_err(|source| DecodeError::Abi {
            event: self.name(),
            source,
        })?;
        Ok(SentMessage {
            message: event.message,
            on_ramp: log.address,
            block_number: log.block_number,
            transaction_hash: log.transaction_hash,
            log_index: log.log_index,
        })
    }
}

/// CommitStore `ReportAccepted`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReportAcceptedDecoder;

impl EventDecoder for ReportAcceptedDecoder {
    type Event = CommitReport;

    fn name(&self) -> &'static str {
        ReportAccepted::SIGNATURE
    }

    fn signature(&self) -> B256 {
        ReportAccepted::SIGNATURE_HASH
    }

    fn decode(&self, log: &ChainLog) -> Result<CommitReport, DecodeError> {
        let event = ReportAccepted::decode_log_data(&log.log_data()).map_err(|source| DecodeError::Abi {
            event: self.name(),
            source,
        })?;
        let interval = event.report.interval;
        if interval.max < interval.min {
            return Err(DecodeError::InvalidInterval {
                min: interval.min,
                max: interval.max,
            });
        }
        Ok(CommitReport {
            interval_min: interval.min,
            interval_max: interval.max,
            merkle_root: event.report.merkleRoot,
            block_number: log.block_number,
            transaction_hash: log.transaction_hash,
        })
    }
}

/// OffRamp `ExecutionStateChanged`.
#[derive(Clone, Copy, Debug, Default)]
pub struct ExecutionStateChangedDecoder;

impl ExecutionStateChangedDecoder {
    /// Topic filters selecting the changes of one message: (sequenceNumber, messageId).
    pub fn topics_for(sequence_number: u64, message_id: B256) -> (B256, B256) {
        (B256::left_padding_from(&sequence_number.to_be_bytes()), message_id)
    }
}

impl EventDecoder for ExecutionStateChangedDecoder {
    type Event = ExecutionStateChange;

    fn name(&self) -> &'static str {
        ExecutionStateChanged::SIGNATURE
    }

    fn signature(&self) -> B256 {
        ExecutionStateChanged::SIGNATURE_HASH
    }

    fn decode(&self, log: &ChainLog) -> Result<ExecutionStateChange, DecodeError> {
        let event = ExecutionStateChanged::decode_log_data(&log.log_data()).map_err(|source| DecodeError::Abi {
            event: self.name(),
            source,
        })?;
        Ok(ExecutionStateChange {
            sequence_number: event.sequenceNumber,
            message_id: event.messageId,
            state: event.state,
            return_data: event.returnData,
            block_number: log.block_number,
            transaction_hash: log.transaction_hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::abi::{CommitReport as AbiCommitReport, EVM2EVMMessage, Interval, PriceUpdates};
    use alloy_primitives::{Address, Bytes, U256, address, b256};

    const ON_RAMP: Address = address!("0x1111111111111111111111111111111111111111");

    fn sample_message(seq: u64) -> EVM2EVMMessage {
        EVM2EVMMessage {
            sourceChainSelector: 16015286601757825753,
            sender: address!("0x2222222222222222222222222222222222222222"),
            receiver: address!("0x3333333333333333333333333333333333333333"),
            sequenceNumber: seq,
            gasLimit: U256::from(200_000),
            strict: false,
            nonce: seq,
            feeToken: Address::ZERO,
            feeTokenAmount: U256::from(1_000),
            data: Bytes::from_static(b"hello"),
            tokenAmounts: vec![],
            sourceTokenData: vec![],
            messageId: B256::with_last_byte(seq as u8),
        }
    }

    #[test]
    fn test_send_requested_decode() {
        let event = CCIPSendRequested {
            message: sample_message(42),
        };
        let log = ChainLog::from_event(ON_RAMP, &event).with_block(100);
        let decoder = SendRequestedDecoder;
        assert!(decoder.matches(&log));

        let sent = decoder.decode(&log).unwrap();
        assert_eq!(sent.sequence_number(), 42);
        assert_eq!(sent.on_ramp, ON_RAMP);
        assert_eq!(sent.block_number, Some(100));
        assert_eq!(sent.message, sample_message(42));
    }

    #[test]
    fn test_report_accepted_decode() {
        let root = b256!("0xabababababababababababababababababababababababababababababababab");
        let event = ReportAccepted {
            report: AbiCommitReport {
                priceUpdates: PriceUpdates {
                    tokenPriceUpdates: vec![],
                    gasPriceUpdates: vec![],
                },
                interval: Interval { min: 5, max: 9 },
                merkleRoot: root,
            },
        };
        let log = ChainLog::from_event(Address::ZERO, &event);
        let report = ReportAcceptedDecoder.decode(&log).unwrap();
        assert_eq!(report.interval_min, 5);
        assert_eq!(report.interval_max, 9);
        assert_eq!(report.merkle_root, root);
    }

    #[test]
    fn test_report_accepted_rejects_inverted_interval() {
        let event = ReportAccepted {
            report: AbiCommitReport {
                priceUpdates: PriceUpdates {
                    tokenPriceUpdates: vec![],
                    gasPriceUpdates: vec![],
                },
                interval: Interval { min: 9, max: 5 },
                merkleRoot: B256::ZERO,
            },
        };
        let log = ChainLog::from_event(Address::ZERO, &event);
        assert!(matches!(
            ReportAcceptedDecoder.decode(&log),
            Err(DecodeError::InvalidInterval { min: 9, max: 5 })
        ));
    }

    #[test]
    fn test_execution_state_changed_topics() {
        let message_id = B256::repeat_byte(0x44);
        let event = ExecutionStateChanged {
            sequenceNumber: 7,
            messageId: message_id,
            state: 2,
            returnData: Bytes::new(),
        };
        let log = ChainLog::from_event(Address::ZERO, &event);
        let (seq_topic, id_topic) = ExecutionStateChangedDecoder::topics_for(7, message_id);
        assert_eq!(log.topics[1], seq_topic);
        assert_eq!(log.topics[2], id_topic);

        let change = ExecutionStateChangedDecoder.decode(&log).unwrap();
        assert!(change.is_success());
        assert_eq!(change.sequence_number, 7);
    }

    #[test]
    fn test_decoder_rejects_foreign_log() {
        let event = ExecutionStateChanged {
            sequenceNumber: 1,
            messageId: B256::ZERO,
            state: 3,
            returnData: Bytes::new(),
        };
        let log = ChainLog::from_event(Address::ZERO, &event);
        assert!(!SendRequestedDecoder.matches(&log));
        assert!(SendRequestedDecoder.decode(&log).is_err());
    }
}
