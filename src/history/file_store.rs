//! File-backed history store
//!
//! Layout under the data directory:
//! - filings/<manager>/<YYYY-MM-DD>.json  - one snapshot per report date
//! - reports/<manager>/<YYYY-MM-DD>.json  - classification results
//! - summaries/<manager>.json             - rolling filing history
//! - backups/<manager>/                   - snapshot backups, pruned
//! - state/processed_filings.json         - accession-number ledger

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::config::DataSettings;
use crate::data_paths::DataPaths;
use crate::diff::ClassificationResult;
use crate::history::{
    ExportDocument, FilingSummaryEntry, FundSummary, HistoryStore, StoreStatistics,
};
use crate::model::FilingSnapshot;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct ProcessedLedger {
    processed_filings: Vec<String>,
    last_updated: Option<DateTime<Utc>>,
}

pub struct FileHistoryStore {
    paths: DataPaths,
    backup_enabled: bool,
    max_backups: usize,
    processed: RwLock<HashSet<String>>,
}

impl FileHistoryStore {
    pub async fn open(paths: DataPaths, settings: &DataSettings) -> Result<Self> {
        paths
            .ensure_directories()
            .context("Failed to create data directories")?;

        let ledger_path = paths.state().join("processed_filings.json");
        let processed: HashSet<String> = match fs::read_to_string(&ledger_path).await {
            Ok(text) => match serde_json::from_str::<ProcessedLedger>(&text) {
                Ok(ledger) => ledger.processed_filings.into_iter().collect(),
                Err(e) => {
                    warn!("Unreadable processed-filings ledger, starting empty: {e}");
                    HashSet::new()
                }
            },
            Err(_) => HashSet::new(),
        };

        info!(
            "History store opened with {} processed filings",
            processed.len()
        );

        Ok(Self {
            paths,
            backup_enabled: settings.backup_enabled,
            max_backups: settings.max_backups,
            processed: RwLock::new(processed),
        })
    }

    fn ledger_path(&self) -> PathBuf {
        self.paths.state().join("processed_filings.json")
    }

    fn snapshot_path(&self, manager_name: &str, date: NaiveDate) -> PathBuf {
        self.paths
            .manager_filings(manager_name)
            .join(format!("{date}.json"))
    }

    pub async fn load_snapshot(
        &self,
        manager_name: &str,
        date: NaiveDate,
    ) -> Result<Option<FilingSnapshot>> {
        let path = self.snapshot_path(manager_name, date);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        let snapshot = serde_json::from_str(&content)
            .with_context(|| format!("Corrupt snapshot {}", path.display()))?;
        Ok(Some(snapshot))
    }

    pub async fn fund_summary(&self, manager_name: &str) -> Result<Option<FundSummary>> {
        let path = self.paths.manager_summary(manager_name);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).await?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub async fn export_all(&self) -> Result<ExportDocument> {
        let mut fund_summaries = Vec::new();
        let mut entries = fs::read_dir(self.paths.summaries()).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let content = fs::read_to_string(&path).await?;
            match serde_json::from_str::<FundSummary>(&content) {
                Ok(summary) => fund_summaries.push(summary),
                Err(e) => warn!("Skipping corrupt summary {}: {e}", path.display()),
            }
        }
        fund_summaries.sort_by(|a, b| a.manager_name.cmp(&b.manager_name));

        let mut processed_filings: Vec<String> =
            self.processed.read().await.iter().cloned().collect();
        processed_filings.sort();

        Ok(ExportDocument {
            export_date: Utc::now(),
            fund_summaries,
            processed_filings,
        })
    }

    /// Delete filing and backup artifacts older than the given age.
    /// Returns the number of files removed.
    pub async fn cleanup_older_than(&self, days: u64) -> Result<usize> {
        let cutoff = SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60);
        let mut removed = 0usize;

        for root in [self.paths.filings(), self.paths.reports(), self.paths.backups()] {
            removed += remove_files_older_than(&root, cutoff).await?;
        }

        info!("Cleanup removed {removed} files older than {days} days");
        Ok(removed)
    }

    pub async fn statistics(&self) -> Result<StoreStatistics> {
        let mut managers = 0usize;
        let mut entries = fs::read_dir(self.paths.summaries()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.path().extension().and_then(|s| s.to_str()) == Some("json") {
                managers += 1;
            }
        }

        Ok(StoreStatistics {
            total_processed: self.processed.read().await.len(),
            managers,
            disk_bytes: directory_size(self.paths.root()).await?,
        })
    }

    async fn persist_ledger(&self) -> Result<()> {
        let mut processed_filings: Vec<String> =
            self.processed.read().await.iter().cloned().collect();
        processed_filings.sort();

        let ledger = ProcessedLedger {
            processed_filings,
            last_updated: Some(Utc::now()),
        };
        let json = serde_json::to_string_pretty(&ledger)?;
        fs::write(self.ledger_path(), json)
            .await
            .context("Failed to write processed-filings ledger")?;
        Ok(())
    }

    async fn update_summary(&self, snapshot: &FilingSnapshot) -> Result<()> {
        let mut summary = self
            .fund_summary(&snapshot.manager_name)
            .await?
            .unwrap_or_else(|| FundSummary {
                manager_name: snapshot.manager_name.clone(),
                filings: Vec::new(),
                last_updated: Utc::now(),
            });

        let entry = FilingSummaryEntry {
            filing_date: snapshot.filing_date,
            filing_type: snapshot.filing_type,
            total_value: snapshot.total_value,
            holdings_count: snapshot.holdings_count(),
        };

        // an amendment replaces the entry for its report date
        match summary
            .filings
            .iter_mut()
            .find(|f| f.filing_date == snapshot.filing_date)
        {
            Some(existing) => *existing = entry,
            None => summary.filings.push(entry),
        }
        summary.filings.sort_by_key(|f| f.filing_date);
        summary.last_updated = Utc::now();

        let json = serde_json::to_string_pretty(&summary)?;
        fs::write(self.paths.manager_summary(&snapshot.manager_name), json)
            .await
            .context("Failed to write fund summary")?;
        Ok(())
    }

    async fn backup_snapshot(&self, source: &Path, snapshot: &FilingSnapshot) -> Result<()> {
        let dir = self.paths.manager_backups(&snapshot.manager_name);
        fs::create_dir_all(&dir).await?;

        let filename = format!(
            "{}_{}.json",
            snapshot.filing_date,
            Utc::now().format("%Y%m%d_%H%M%S")
        );
        let backup_path = dir.join(&filename);
        fs::copy(source, &backup_path)
            .await
            .context("Failed to copy snapshot backup")?;
        debug!("Created backup {}", backup_path.display());

        self.prune_backups(&dir).await
    }

    async fn prune_backups(&self, dir: &Path) -> Result<()> {
        let mut backups: Vec<PathBuf> = Vec::new();
        let mut entries = fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                backups.push(path);
            }
        }

        if backups.len() <= self.max_backups {
            return Ok(());
        }

        // filenames start with date + timestamp, so name order is age order
        backups.sort();
        let excess = backups.len() - self.max_backups;
        for path in backups.into_iter().take(excess) {
            fs::remove_file(&path).await?;
            debug!("Removed old backup {}", path.display());
        }
        Ok(())
    }
}

#[async_trait]
impl HistoryStore for FileHistoryStore {
    async fn previous_snapshot(
        &self,
        manager_name: &str,
        before: NaiveDate,
    ) -> Result<Option<FilingSnapshot>> {
        let dir = self.paths.manager_filings(manager_name);
        if !dir.exists() {
            return Ok(None);
        }

        let mut best: Option<NaiveDate> = None;
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Ok(date) = stem.parse::<NaiveDate>() else {
                continue;
            };
            if date < before && best.map_or(true, |b| date > b) {
                best = Some(date);
            }
        }

        match best {
            Some(date) => self.load_snapshot(manager_name, date).await,
            None => Ok(None),
        }
    }

    async fn save_snapshot(&self, snapshot: &FilingSnapshot) -> Result<()> {
        let dir = self.paths.manager_filings(&snapshot.manager_name);
        fs::create_dir_all(&dir).await?;

        let path = self.snapshot_path(&snapshot.manager_name, snapshot.filing_date);
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write snapshot {}", path.display()))?;
        info!(
            "Saved snapshot {} / {}",
            snapshot.manager_name, snapshot.filing_date
        );

        if self.backup_enabled {
            if let Err(e) = self.backup_snapshot(&path, snapshot).await {
                warn!("Snapshot backup failed: {e:#}");
            }
        }

        self.update_summary(snapshot).await
    }

    async fn save_report(&self, result: &ClassificationResult) -> Result<()> {
        let dir = self.paths.manager_reports(&result.manager_name);
        fs::create_dir_all(&dir).await?;

        let path = dir.join(format!("{}.json", result.filing_date));
        let json = serde_json::to_string_pretty(result)?;
        fs::write(&path, json)
            .await
            .with_context(|| format!("Failed to write report {}", path.display()))?;
        Ok(())
    }

    async fn is_processed(&self, accession_number: &str) -> bool {
        self.processed.read().await.contains(accession_number)
    }

    async fn mark_processed(&self, accession_number: &str) -> Result<()> {
        self.processed
            .write()
            .await
            .insert(accession_number.to_string());
        self.persist_ledger().await
    }
}

async fn remove_files_older_than(root: &Path, cutoff: SystemTime) -> Result<usize> {
    let mut removed = 0usize;
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        if !dir.exists() {
            continue;
        }
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let metadata = entry.metadata().await?;
            if metadata.is_dir() {
                pending.push(path);
            } else if metadata.modified().map(|m| m < cutoff).unwrap_or(false) {
                fs::remove_file(&path).await?;
                debug!("Removed old file {}", path.display());
                removed += 1;
            }
        }
    }

    Ok(removed)
}

async fn directory_size(root: &Path) -> Result<u64> {
    let mut total = 0u64;
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        if !dir.exists() {
            continue;
        }
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_dir() {
                pending.push(entry.path());
            } else {
                total += metadata.len();
            }
        }
    }

    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FilingType, HoldingRecord};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn snapshot(manager: &str, filing_date: &str, holdings: Vec<HoldingRecord>) -> FilingSnapshot {
        FilingSnapshot::from_holdings(manager, date(filing_date), FilingType::Initial, holdings)
    }

    async fn open_store(dir: &Path) -> FileHistoryStore {
        FileHistoryStore::open(DataPaths::new(dir), &DataSettings::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_previous_snapshot_is_strictly_before() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path()).await;

        let fund = "Situational Awareness LP";
        store
            .save_snapshot(&snapshot(fund, "2025-12-31", vec![HoldingRecord::new("A", "111111111", 1, 20_000)]))
            .await
            .unwrap();
        store
            .save_snapshot(&snapshot(fund, "2026-03-31", vec![HoldingRecord::new("A", "111111111", 2, 40_000)]))
            .await
            .unwrap();

        let prev = store
            .previous_snapshot(fund, date("2026-03-31"))
            .await
            .unwrap()
            .expect("previous snapshot");
        assert_eq!(prev.filing_date, date("2025-12-31"));

        // a snapshot is never its own baseline
        let none = store
            .previous_snapshot(fund, date("2025-12-31"))
            .await
            .unwrap();
        assert!(none.is_none());
    }

    #[tokio::test]
    async fn test_previous_snapshot_picks_the_nearest_date() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path()).await;

        let fund = "Fund";
        for d in ["2025-06-30", "2025-09-30", "2025-12-31"] {
            store
                .save_snapshot(&snapshot(fund, d, vec![HoldingRecord::new("A", "111111111", 1, 20_000)]))
                .await
                .unwrap();
        }

        let prev = store
            .previous_snapshot(fund, date("2026-03-31"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(prev.filing_date, date("2025-12-31"));
    }

    #[tokio::test]
    async fn test_same_date_save_replaces_the_snapshot() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path()).await;

        let fund = "Fund";
        store
            .save_snapshot(&snapshot(fund, "2026-03-31", vec![HoldingRecord::new("A", "111111111", 1, 20_000)]))
            .await
            .unwrap();
        // amendment for the same report date supersedes
        store
            .save_snapshot(&snapshot(
                fund,
                "2026-03-31",
                vec![
                    HoldingRecord::new("A", "111111111", 1, 20_000),
                    HoldingRecord::new("B", "222222222", 2, 30_000),
                ],
            ))
            .await
            .unwrap();

        let loaded = store
            .load_snapshot(fund, date("2026-03-31"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.holdings_count(), 2);

        // the summary keeps one entry per report date
        let summary = store.fund_summary(fund).await.unwrap().unwrap();
        assert_eq!(summary.filings.len(), 1);
        assert_eq!(summary.filings[0].holdings_count, 2);
    }

    #[tokio::test]
    async fn test_processed_ledger_survives_reopen() {
        let tmp = tempfile::tempdir().unwrap();
        {
            let store = open_store(tmp.path()).await;
            store.mark_processed("0001234567-26-000123").await.unwrap();
            assert!(store.is_processed("0001234567-26-000123").await);
        }

        let reopened = open_store(tmp.path()).await;
        assert!(reopened.is_processed("0001234567-26-000123").await);
        assert!(!reopened.is_processed("0009999999-26-000001").await);
    }

    #[tokio::test]
    async fn test_managers_do_not_cross() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path()).await;

        store
            .save_snapshot(&snapshot("Fund A", "2025-12-31", vec![HoldingRecord::new("A", "111111111", 1, 20_000)]))
            .await
            .unwrap();

        let other = store
            .previous_snapshot("Fund B", date("2026-03-31"))
            .await
            .unwrap();
        assert!(other.is_none());
    }

    #[test]
    fn test_statistics_count_processed_and_managers() {
        tokio_test::block_on(async {
            let tmp = tempfile::tempdir().unwrap();
            let store = open_store(tmp.path()).await;

            store
                .save_snapshot(&snapshot("Fund A", "2025-12-31", vec![HoldingRecord::new("A", "111111111", 1, 20_000)]))
                .await
                .unwrap();
            store.mark_processed("0001234567-26-000123").await.unwrap();

            let stats = store.statistics().await.unwrap();
            assert_eq!(stats.total_processed, 1);
            assert_eq!(stats.managers, 1);
            assert!(stats.disk_bytes > 0);
        });
    }

    #[tokio::test]
    async fn test_export_includes_summaries_and_ledger() {
        let tmp = tempfile::tempdir().unwrap();
        let store = open_store(tmp.path()).await;

        store
            .save_snapshot(&snapshot("Fund A", "2025-12-31", vec![HoldingRecord::new("A", "111111111", 1, 20_000)]))
            .await
            .unwrap();
        store.mark_processed("0001234567-26-000123").await.unwrap();

        let export = store.export_all().await.unwrap();
        assert_eq!(export.fund_summaries.len(), 1);
        assert_eq!(export.processed_filings, vec!["0001234567-26-000123"]);
    }
}
