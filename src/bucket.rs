use std::fmt;

use chrono::{Datelike, TimeZone, Timelike};
use chrono_tz::Tz;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::utils::get_local_timezone;

/// Hour and minute of a local time, e.g. 09:05.
///
/// `Display` renders the unpadded key `"9:5"`; [`MinuteKey::padded`] renders
/// `"9:05"`. Both name the same bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct MinuteKey {
    pub hour: u32,
    pub minute: u32,
}

impl MinuteKey {
    pub fn padded(&self) -> String {
        format!("{}:{:02}", self.hour, self.minute)
    }
}

impl fmt::Display for MinuteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.hour, self.minute)
    }
}

/// The five buckets a single timestamp falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketKeys {
    pub year: i32,
    /// 1..=12
    pub month: u32,
    /// 0 = Monday .. 6 = Sunday
    pub weekday: u32,
    /// 0..=23
    pub hour: u32,
    pub minute: MinuteKey,
}

/// Splits unix timestamps into calendar buckets in a fixed timezone.
#[derive(Debug, Clone, Copy)]
pub struct Bucketizer {
    tz: Tz,
}

impl Bucketizer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Use the named IANA zone, or the host's zone when `name` is `None`.
    pub fn from_name(name: Option<&str>) -> Result<Self> {
        match name {
            Some(name) => parse_timezone(name).map(Self::new),
            None => Ok(Self::new(host_timezone())),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn bucket(&self, timestamp: i64) -> Result<BucketKeys> {
        let local = self
            .tz
            .timestamp_opt(timestamp, 0)
            .single()
            .ok_or(Error::InvalidTimestamp(timestamp))?;

        let hour = local.hour();
        Ok(BucketKeys {
            year: local.year(),
            month: local.month(),
            weekday: local.weekday().num_days_from_monday(),
            hour,
            minute: MinuteKey {
                hour,
                minute: local.minute(),
            },
        })
    }
}

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| Error::UnknownTimezone(name.to_string()))
}

/// The host's timezone, falling back to UTC when it is unknown to chrono-tz.
pub fn host_timezone() -> Tz {
    timezone_or_utc(&get_local_timezone())
}

fn timezone_or_utc(name: &str) -> Tz {
    parse_timezone(name).unwrap_or_else(|_| {
        crate::utils::warn_once(format!(
            "⚠️  Host timezone {name} is not recognised, using UTC"
        ));
        Tz::UTC
    })
}
