use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt, stream};

use crate::debug_log;
use crate::error::{Error, Result};
use crate::types::{Block, BlockRange, TransactionRecord};

/// A node that can hand out blocks by number.
#[async_trait]
pub trait BlockSource: Send + Sync {
    /// Human readable location of the source, used in messages.
    fn endpoint(&self) -> &str;

    /// Verify the source is reachable and return the latest block number.
    async fn check_connection(&self) -> Result<u64>;

    /// Fetch a block together with its transactions.
    async fn get_block(&self, number: u64) -> Result<Block>;
}

/// Progress hook called as `(blocks_done, blocks_total)`.
pub type ProgressCallback = Box<dyn Fn(u64, u64) + Send + Sync>;

/// Fetch every block of `range` and flatten their transactions, in block
/// order. At most `concurrency` requests are in flight at once.
pub async fn collect_transactions(
    source: &dyn BlockSource,
    range: BlockRange,
    concurrency: usize,
    progress: Option<ProgressCallback>,
) -> Result<Vec<TransactionRecord>> {
    let total = range.block_count();
    let mut done = 0u64;
    let mut transactions = Vec::new();

    let mut blocks = stream::iter(range.iter())
        .map(|number| source.get_block(number))
        .buffered(concurrency.max(1));

    if let Some(progress) = &progress {
        progress(0, total);
    }

    while let Some(block) = blocks.try_next().await? {
        transactions.extend(block.into_records());
        done += 1;
        if let Some(progress) = &progress {
            progress(done, total);
        }
    }

    debug_log::log(
        "FETCH",
        "complete",
        &format!(
            "{} blocks, {} transactions from {}",
            total,
            transactions.len(),
            source.endpoint()
        ),
    );

    Ok(transactions)
}

/// Check the source is up and that the requested range exists on it.
pub async fn verify_range(source: &dyn BlockSource, range: BlockRange) -> Result<u64> {
    let head = source.check_connection().await?;
    if range.end > head {
        return Err(Error::BlockNotYetProduced {
            end: range.end,
            head,
        });
    }
    Ok(head)
}

/// Convert block timestamps to the signed form the bucketizer takes.
pub fn timestamps(transactions: &[TransactionRecord]) -> Result<Vec<i64>> {
    transactions
        .iter()
        .map(|tx| i64::try_from(tx.timestamp).map_err(|_| Error::TimestampOverflow(tx.timestamp)))
        .collect()
}
