use alloy_primitives::Address;
use ccip_chain::{ChainClient, LogQuery, LogScanner, ScanControl};
use ccip_types::{CommitReport, EventDecoder, ReportAcceptedDecoder};
use tracing::{debug, info};

use crate::error::{ChainSide, ManualExecError, NotFound};

/// Finds the commit report covering a sequence number on the destination chain.
pub struct CommitReportFinder<'a, D = ReportAcceptedDecoder> {
    dest: &'a dyn ChainClient,
    commit_store: Address,
    page_size: u64,
    decoder: D,
}

impl<'a> CommitReportFinder<'a> {
    pub fn new(dest: &'a dyn ChainClient, commit_store: Address, page_size: u64) -> Self {
        Self::with_decoder(dest, commit_store, page_size, ReportAcceptedDecoder)
    }
}

impl<'a, D: EventDecoder<Event = CommitReport>> CommitReportFinder<'a, D> {
    pub fn with_decoder(dest: &'a dyn ChainClient, commit_store: Address, page_size: u64, decoder: D) -> Self {
        Self {
            dest,
            commit_store,
            page_size,
            decoder,
        }
    }

    /// Returns the oldest report in `[from_block, to_block]` whose interval
    /// contains `sequence_number`.
    pub async fn find(
        &self,
        sequence_number: u64,
        from_block: u64,
        to_block: u64,
    ) -> Result<CommitReport, ManualExecError> {
        let query = LogQuery::new(self.commit_store, self.decoder.signature(), from_block, to_block);
        let mut found = None;

        LogScanner::new(self.dest, self.page_size)
            .scan(&query, &self.decoder, |report| {
                debug!("commit report {report}");
                if report.contains(sequence_number) {
                    found = Some(report);
                    return ScanControl::Stop;
                }
                ScanControl::Continue
            })
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Destination, e))?;

        let report = found.ok_or(NotFound::CommitReport(sequence_number))?;
        info!(
            "sequence number {sequence_number} committed in {report} at block {:?}",
            report.block_number
        );
        Ok(report)
    }
}
