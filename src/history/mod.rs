//! Filing history persistence
//!
//! The tracker needs the chronologically previous snapshot for a manager to
//! diff a new filing against, plus a ledger of already-processed accession
//! numbers so reruns stay idempotent.

mod file_store;

pub use file_store::FileHistoryStore;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::diff::ClassificationResult;
use crate::model::{FilingSnapshot, FilingType};

/// Store of processed filings and snapshots.
///
/// Lookups must observe writes made earlier in the same run for the same
/// manager; no cross-manager coordination is required.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Chronologically nearest snapshot strictly before `before`, or None
    async fn previous_snapshot(
        &self,
        manager_name: &str,
        before: NaiveDate,
    ) -> Result<Option<FilingSnapshot>>;

    /// Persist a snapshot; a snapshot with the same manager and report date
    /// replaces the stored one (amendments supersede, they do not chain)
    async fn save_snapshot(&self, snapshot: &FilingSnapshot) -> Result<()>;

    /// Persist a classification result alongside the snapshot history
    async fn save_report(&self, result: &ClassificationResult) -> Result<()>;

    async fn is_processed(&self, accession_number: &str) -> bool;

    async fn mark_processed(&self, accession_number: &str) -> Result<()>;
}

/// Rolling per-manager filing history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundSummary {
    pub manager_name: String,
    pub filings: Vec<FilingSummaryEntry>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingSummaryEntry {
    pub filing_date: NaiveDate,
    pub filing_type: FilingType,
    pub total_value: i64,
    pub holdings_count: usize,
}

/// Everything the store knows, in one exportable document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub export_date: DateTime<Utc>,
    pub fund_summaries: Vec<FundSummary>,
    pub processed_filings: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct StoreStatistics {
    pub total_processed: usize,
    pub managers: usize,
    pub disk_bytes: u64,
}
