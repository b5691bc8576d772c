//! Paged log scanning.
//!
//! RPC providers cap the block range of `eth_getLogs`, so every scan walks its
//! range in fixed size windows, oldest first, decoding each log as it goes.

use ccip_types::EventDecoder;
use tracing::debug;

use crate::client::ChainClient;
use crate::error::ChainError;
use crate::types::LogQuery;

/// Whether a scan should keep paging after a visited event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScanControl {
    Continue,
    Stop,
}

/// Splits the inclusive range `[from, to]` into windows of at most `page_size` blocks.
pub fn pages(from: u64, to: u64, page_size: u64) -> impl Iterator<Item = (u64, u64)> {
    let size = page_size.max(1);
    std::iter::successors((from <= to).then_some(from), move |start| {
        start.checked_add(size).filter(|next| *next <= to)
    })
    .map(move |start| (start, start.saturating_add(size - 1).min(to)))
}

pub struct LogScanner<'a> {
    client: &'a dyn ChainClient,
    page_size: u64,
}

impl<'a> LogScanner<'a> {
    pub fn new(client: &'a dyn ChainClient, page_size: u64) -> Self {
        Self {
            client,
            page_size: page_size.max(1),
        }
    }

    /// Decodes every log matching `query`, oldest first, handing each event to
    /// `visit`. Returns the number of pages fetched.
    pub async fn scan<D, F>(&self, query: &LogQuery, decoder: &D, mut visit: F) -> Result<usize, ChainError>
    where
        D: EventDecoder,
        F: FnMut(D::Event) -> ScanControl,
    {
        let mut fetched = 0;
        for (from, to) in pages(query.from_block, query.to_block, self.page_size) {
            let mut logs = self.client.logs(&query.with_range(from, to)).await?;
            fetched += 1;
            logs.sort_by_key(|log| (log.block_number, log.log_index));
            debug!("{}: {} log(s) in blocks [{from}, {to}]", decoder.name(), logs.len());

            for log in logs.iter().filter(|log| decoder.matches(log)) {
                if visit(decoder.decode(log)?) == ScanControl::Stop {
                    return Ok(fetched);
                }
            }
        }
        Ok(fetched)
    }
}
