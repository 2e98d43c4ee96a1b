//! Data model for 13F filings: holding lines and filing snapshots

mod holding;
mod snapshot;

pub use holding::{Classification, HoldingRecord};
pub use snapshot::{FilingSnapshot, FilingType};
