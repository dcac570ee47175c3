use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub timestamp: u64,
    pub block_number: u64,
    pub to_address: Option<String>, // None for contract creation
    pub from_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTransaction {
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub number: u64,
    pub timestamp: u64,
    pub transactions: Vec<BlockTransaction>,
}

impl Block {
    /// One record per transaction, each stamped with the block's time.
    pub fn into_records(self) -> impl Iterator<Item = TransactionRecord> {
        let Block {
            number,
            timestamp,
            transactions,
        } = self;
        transactions.into_iter().map(move |tx| TransactionRecord {
            timestamp,
            block_number: number,
            to_address: tx.to,
            from_address: tx.from,
        })
    }
}

/// Inclusive range of block numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlockRange {
    pub start: u64,
    pub end: u64,
}

impl BlockRange {
    pub fn new(start: u64, end: u64) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn block_count(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    pub fn iter(&self) -> std::ops::RangeInclusive<u64> {
        self.start..=self.end
    }
}
