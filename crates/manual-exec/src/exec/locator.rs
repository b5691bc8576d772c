use alloy_primitives::B256;
use ccip_chain::TxReceipt;
use ccip_types::{EventDecoder, SendRequestedDecoder, SentMessage};
use tracing::{debug, warn};

use crate::error::{ChainSide, IntegrityError, ManualExecError, NotFound};

/// The message to execute, with the source height it was sent at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedMessage {
    pub sent: SentMessage,
    pub source_block: u64,
}

impl LocatedMessage {
    pub fn sequence_number(&self) -> u64 {
        self.sent.sequence_number()
    }

    pub fn message_id(&self) -> B256 {
        self.sent.message_id()
    }
}

/// Picks the target message out of a source transaction receipt.
///
/// Selection order: configured message id, then configured log index, then
/// the first send event of the transaction.
#[derive(Clone, Debug)]
pub struct MessageLocator<D = SendRequestedDecoder> {
    decoder: D,
    message_id: Option<B256>,
    log_index: Option<u64>,
}

impl MessageLocator {
    pub fn new(message_id: Option<B256>, log_index: Option<u64>) -> Self {
        Self::with_decoder(SendRequestedDecoder, message_id, log_index)
    }
}

impl<D: EventDecoder<Event = SentMessage>> MessageLocator<D> {
    pub fn with_decoder(decoder: D, message_id: Option<B256>, log_index: Option<u64>) -> Self {
        Self {
            decoder,
            message_id,
            log_index,
        }
    }

    pub fn locate(&self, receipt: &TxReceipt) -> Result<LocatedMessage, ManualExecError> {
        let tx = receipt.transaction_hash;
        let not_found = |reason: String| ManualExecError::from(NotFound::Message { tx, reason });

        let candidates = receipt
            .logs
            .iter()
            .filter(|log| self.decoder.matches(log))
            .filter(|log| log.transaction_hash.is_none_or(|hash| hash == tx))
            .map(|log| {
                self.decoder.decode(log).map_err(|e| IntegrityError::MalformedLog {
                    side: ChainSide::Source,
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        debug!("transaction {tx} emitted {} send event(s)", candidates.len());

        let sent = if let Some(id) = self.message_id {
            candidates
                .into_iter()
                .find(|sent| sent.message_id() == id)
                .ok_or_else(|| not_found(format!("no message with id {id}")))?
        } else if let Some(index) = self.log_index {
            candidates
                .into_iter()
                .find(|sent| sent.log_index == Some(index))
                .ok_or_else(|| not_found(format!("no send event at log index {index}")))?
        } else {
            let count = candidates.len();
            let first = candidates
                .into_iter()
                .next()
                .ok_or_else(|| not_found(format!("no {} log", self.decoder.name())))?;
            if count > 1 {
                warn!(
                    "transaction {tx} sent {count} messages, using the first (seq {}); set ccip_msg_id to pick another",
                    first.sequence_number()
                );
            }
            first
        };

        let source_block = sent
            .block_number
            .or(receipt.block_number)
            .ok_or_else(|| not_found("transaction is not mined".to_string()))?;

        Ok(LocatedMessage { sent, source_block })
    }
}
