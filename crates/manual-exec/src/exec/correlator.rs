use ccip_chain::{BlockHeader, ChainClient};
use tracing::debug;

use crate::error::{ChainSide, ManualExecError, NotFound};

/// Binary search stops once a header is this close to the target time.
pub const TIMESTAMP_TOLERANCE_SECS: u64 = 60;

/// Step of the backward walk that follows the binary search.
pub const BACKWARD_STEP_BLOCKS: u64 = 10;

/// Finds the destination block that lines up with a source chain timestamp.
///
/// The result errs early: its timestamp is never after the target, so log
/// scans starting there cannot miss events emitted after the send.
pub struct BlockCorrelator<'a> {
    dest: &'a dyn ChainClient,
}

impl<'a> BlockCorrelator<'a> {
    pub fn new(dest: &'a dyn ChainClient) -> Self {
        Self { dest }
    }

    /// Approximates the height whose timestamp matches `target_timestamp`
    /// within `[lower, upper]`.
    pub async fn approximate(&self, target_timestamp: u64, lower: u64, upper: u64) -> Result<u64, ManualExecError> {
        let (mut low, mut high) = (lower, upper.max(lower));
        let mut candidate = self.header(midpoint(low, high)).await?;

        while low <= high && candidate.timestamp.abs_diff(target_timestamp) >= TIMESTAMP_TOLERANCE_SECS {
            if candidate.timestamp > target_timestamp {
                match candidate.number.checked_sub(1) {
                    Some(below) => high = below,
                    None => break,
                }
            } else {
                low = candidate.number + 1;
            }
            if low > high {
                break;
            }
            candidate = self.header(midpoint(low, high)).await?;
        }
        debug!(
            "binary search settled on block {} (ts {}, target {target_timestamp})",
            candidate.number, candidate.timestamp
        );

        while candidate.timestamp > target_timestamp {
            let number = candidate
                .number
                .checked_sub(BACKWARD_STEP_BLOCKS)
                .ok_or(NotFound::DestinationBlock(target_timestamp))?;
            candidate = self.header(number).await?;
        }

        Ok(candidate.number)
    }

    async fn header(&self, number: u64) -> Result<BlockHeader, ManualExecError> {
        self.dest
            .header(number)
            .await
            .map_err(|e| ManualExecError::chain(ChainSide::Destination, e))
    }
}

fn midpoint(low: u64, high: u64) -> u64 {
    low + (high - low) / 2
}
