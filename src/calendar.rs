//! Calendar labels for numeric month and weekday keys.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::frequency::FrequencyTable;

const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// The five granularities transactions are bucketed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Year,
    Month,
    Weekday,
    Hour,
    Minute,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 5] = [
        TimeUnit::Year,
        TimeUnit::Month,
        TimeUnit::Weekday,
        TimeUnit::Hour,
        TimeUnit::Minute,
    ];

    /// Column heading used in console tables and peak lines.
    pub fn title(self) -> &'static str {
        match self {
            TimeUnit::Year => "Year",
            TimeUnit::Month => "Month",
            TimeUnit::Weekday => "Day",
            TimeUnit::Hour => "Hour",
            TimeUnit::Minute => "Minute",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for TimeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "year" => Ok(TimeUnit::Year),
            "month" => Ok(TimeUnit::Month),
            "weekday" | "day" => Ok(TimeUnit::Weekday),
            "hour" => Ok(TimeUnit::Hour),
            "minute" => Ok(TimeUnit::Minute),
            _ => Err(Error::InvalidDomain(s.to_string())),
        }
    }
}

/// Label for a weekday index where 0 is Monday.
pub fn weekday_label(index: u32) -> Option<&'static str> {
    WEEKDAYS.get(index as usize).copied()
}

/// Label for a month number in 1..=12.
pub fn month_label(month: u32) -> Option<&'static str> {
    month
        .checked_sub(1)
        .and_then(|i| MONTHS.get(i as usize).copied())
}

/// Replace the numeric keys of a month or weekday table with their calendar
/// labels. Counts and order are kept.
pub fn relabel(table: FrequencyTable<u32>, unit: TimeUnit) -> Result<FrequencyTable<&'static str>> {
    let lookup: fn(u32) -> Option<&'static str> = match unit {
        TimeUnit::Month => month_label,
        TimeUnit::Weekday => weekday_label,
        other => return Err(Error::InvalidDomain(other.to_string())),
    };

    table.try_map_keys(|value| lookup(value).ok_or(Error::InvalidCalendarValue { unit, value }))
}
