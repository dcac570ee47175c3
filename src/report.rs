use serde::Serialize;

use crate::aggregate::Histograms;
use crate::calendar::{TimeUnit, relabel};
use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;

/// Per-unit rows and peak, ready for display.
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    pub unit: TimeUnit,
    pub rows: Vec<(String, u64)>,
    /// `None` when no transactions were observed.
    pub peak: Option<String>,
    /// Every key tied at the peak count, including `peak` itself.
    pub ties: Vec<String>,
}

impl UnitReport {
    fn from_table<K>(
        unit: TimeUnit,
        table: &FrequencyTable<K>,
        label: impl Fn(&K) -> String,
    ) -> Result<Self>
    where
        K: Eq + std::hash::Hash + Clone,
    {
        let peak = match table.peak() {
            Ok(key) => Some(label(key)),
            Err(Error::EmptyTable) => None,
            Err(e) => return Err(e),
        };

        Ok(Self {
            unit,
            rows: table.iter().map(|(k, count)| (label(k), count)).collect(),
            peak,
            ties: table.peaks().into_iter().map(&label).collect(),
        })
    }

    pub fn is_tied(&self) -> bool {
        self.ties.len() > 1
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportContext {
    pub start_block: u64,
    pub end_block: u64,
    pub timezone: String,
    pub pad_minutes: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub transactions: u64,
    pub start_block: u64,
    pub end_block: u64,
    pub timezone: String,
    pub units: Vec<UnitReport>,
}

impl Report {
    pub fn unit(&self, unit: TimeUnit) -> Option<&UnitReport> {
        self.units.iter().find(|u| u.unit == unit)
    }

    pub fn is_empty(&self) -> bool {
        self.transactions == 0
    }
}

/// Relabel the calendar tables and find the peak of each granularity.
pub fn build_report(histograms: Histograms, context: &ReportContext) -> Result<Report> {
    let Histograms {
        years,
        months,
        weekdays,
        hours,
        minutes,
        transactions,
    } = histograms;

    let months = relabel(months, TimeUnit::Month)?;
    let weekdays = relabel(weekdays, TimeUnit::Weekday)?;
    let pad = context.pad_minutes;

    let units = vec![
        UnitReport::from_table(TimeUnit::Year, &years, |y| y.to_string())?,
        UnitReport::from_table(TimeUnit::Month, &months, |m| m.to_string())?,
        UnitReport::from_table(TimeUnit::Weekday, &weekdays, |d| d.to_string())?,
        UnitReport::from_table(TimeUnit::Hour, &hours, |h| h.to_string())?,
        UnitReport::from_table(TimeUnit::Minute, &minutes, |m| {
            if pad { m.padded() } else { m.to_string() }
        })?,
    ];

    Ok(Report {
        transactions,
        start_block: context.start_block,
        end_block: context.end_block,
        timezone: context.timezone.clone(),
        units,
    })
}
