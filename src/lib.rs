//! Transaction activity histograms for a range of blockchain blocks.
//!
//! Block timestamps are bucketed by year, month, weekday, hour and
//! minute-of-hour in a chosen timezone, and the busiest bucket of each
//! granularity is reported.

pub mod aggregate;
pub mod bucket;
pub mod calendar;
pub mod chart;
pub mod config;
pub mod debug_log;
pub mod display;
pub mod error;
pub mod frequency;
pub mod report;
mod reqwest_simd_json;
pub mod rpc;
pub mod source;
pub mod types;
pub mod utils;
