//! Historical exchange-rate timeline
//!
//! Builds a complete per-day currency→rate table for a date range from two
//! independently published rate-table families, then answers O(1) same-day
//! quote lookups.
//!
//! # Components
//!
//! - **quote**: Quote value type, raw rate-document records, locale-decimal parsing
//! - **directory**: table-publication directory parsing and range filtering
//! - **timeline**: the day-by-day table builder and lookup surface

pub mod directory;
pub mod quote;
pub mod timeline;

pub use directory::{parse_directory, TableFamily, TablePublication};
pub use quote::{Quote, RateRecord, RateTable};
pub use timeline::{InMemoryTableSource, RateTimeline, TableSource};
