use thiserror::Error;

use crate::calendar::TimeUnit;

/// Errors raised while retrieving blocks or aggregating their timestamps.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not connect to {url}: {message}")]
    Connection { url: String, message: String },

    #[error("Invalid block range: start block {start} is greater than end block {end}")]
    InvalidRange { start: u64, end: u64 },

    #[error("End block {end} is beyond the current chain head {head}")]
    BlockNotYetProduced { end: u64, head: u64 },

    #[error("Invalid value of time unit {0}!")]
    InvalidDomain(String),

    #[error("{value} is not a valid {unit} value")]
    InvalidCalendarValue { unit: TimeUnit, value: u32 },

    #[error("Cannot find a peak in an empty frequency table")]
    EmptyTable,

    #[error("Timestamp {0} cannot be represented as a calendar date")]
    InvalidTimestamp(i64),

    #[error("Block timestamp {0} does not fit a signed 64-bit value")]
    TimestampOverflow(u64),

    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),

    #[error("{method} failed with code {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    #[error("Block {0} was not returned by the node")]
    MissingBlock(u64),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Failed to serialize request: {0}")]
    Serialization(String),
}

impl Error {
    pub fn connection(url: impl Into<String>, message: impl ToString) -> Self {
        Self::Connection {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedResponse(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
