use crate::bucket::{Bucketizer, MinuteKey};
use crate::debug_log;
use crate::error::Result;
use crate::frequency::FrequencyTable;

/// Transaction counts for every time granularity.
#[derive(Debug, Clone, Default)]
pub struct Histograms {
    pub years: FrequencyTable<i32>,
    pub months: FrequencyTable<u32>,
    pub weekdays: FrequencyTable<u32>,
    pub hours: FrequencyTable<u32>,
    pub minutes: FrequencyTable<MinuteKey>,
    pub transactions: u64,
}

impl Histograms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one transaction in each of the five tables.
    pub fn observe(&mut self, bucketizer: &Bucketizer, timestamp: i64) -> Result<()> {
        let keys = bucketizer.bucket(timestamp)?;
        self.years.observe(keys.year);
        self.months.observe(keys.month);
        self.weekdays.observe(keys.weekday);
        self.hours.observe(keys.hour);
        self.minutes.observe(keys.minute);
        self.transactions += 1;
        Ok(())
    }

    /// Fold the counts of a separately aggregated chunk into this one.
    pub fn merge(&mut self, other: Histograms) {
        self.years.merge(other.years);
        self.months.merge(other.months);
        self.weekdays.merge(other.weekdays);
        self.hours.merge(other.hours);
        self.minutes.merge(other.minutes);
        self.transactions += other.transactions;
    }

    pub fn is_empty(&self) -> bool {
        self.transactions == 0
    }
}

/// Bucket every timestamp, in order, into a fresh set of tables.
pub fn aggregate<I>(timestamps: I, bucketizer: &Bucketizer) -> Result<Histograms>
where
    I: IntoIterator<Item = i64>,
{
    let mut histograms = Histograms::new();
    for timestamp in timestamps {
        histograms.observe(bucketizer, timestamp)?;
    }

    debug_log::log(
        "AGGREGATE",
        "done",
        &format!(
            "{} transactions, {} years, {} hours, {} minutes",
            histograms.transactions,
            histograms.years.len(),
            histograms.hours.len(),
            histograms.minutes.len()
        ),
    );

    Ok(histograms)
}
