//! Filing tracker orchestration
//!
//! Drives the search → download → parse → classify → persist → notify
//! pipeline for each configured fund. One fund's failure never aborts the
//! others; per-manager state lives only in the history store.

use std::collections::HashMap;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, error, info, warn};

use crate::config::{FundTarget, Settings};
use crate::data_paths::DataPaths;
use crate::diff;
use crate::edgar::{EdgarClient, FilingRef};
use crate::filing;
use crate::history::{FileHistoryStore, HistoryStore};
use crate::model::{FilingSnapshot, FilingType};
use crate::notify::format::{self, FundRunOutcome};
use crate::notify::Notifier;

pub struct FilingTracker {
    settings: Settings,
    client: EdgarClient,
    store: FileHistoryStore,
    notifier: Notifier,
}

impl FilingTracker {
    pub async fn new(settings: Settings, data_paths: DataPaths) -> Result<Self> {
        let client = EdgarClient::new(&settings.sec_edgar)?;
        let store = FileHistoryStore::open(data_paths, &settings.data).await?;
        let notifier = Notifier::new(settings.notifications.clone());

        Ok(Self {
            settings,
            client,
            store,
            notifier,
        })
    }

    pub fn store(&self) -> &FileHistoryStore {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn client(&self) -> &EdgarClient {
        &self.client
    }

    /// Run the pipeline over every configured fund
    pub async fn run(
        &self,
        days_back: Option<u32>,
        send_summary: bool,
    ) -> Result<Vec<FundRunOutcome>> {
        if self.settings.target_funds.is_empty() {
            warn!("No target funds configured");
        }

        let mut outcomes = Vec::new();
        for fund in &self.settings.target_funds {
            info!("Processing fund: {}", fund.name);
            match self.process_fund(fund, days_back).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!("Run failed for {}: {e:#}", fund.name);
                    let body = format::error_message(
                        &format!("Processing failed for fund **{}**", fund.name),
                        &format!("{e:#}"),
                    );
                    self.notifier.send_error_notification(&body).await;
                    outcomes.push(FundRunOutcome {
                        fund_name: fund.name.clone(),
                        filings_found: 0,
                        filings_processed: 0,
                        failed: true,
                    });
                }
            }
        }

        if send_summary {
            self.notifier
                .send_run_summary(&format::run_summary_message(&outcomes))
                .await;
        }

        Ok(outcomes)
    }

    /// Search, download, classify, persist, and notify for one fund
    pub async fn process_fund(
        &self,
        fund: &FundTarget,
        days_back: Option<u32>,
    ) -> Result<FundRunOutcome> {
        let days_back = days_back.unwrap_or(self.settings.sec_edgar.days_back);

        let filings = self.search_fund_filings(fund, days_back).await?;
        if filings.is_empty() {
            info!("No new filings found for {}", fund.name);
        }

        let filings_found = filings.len();
        let mut filings_processed = 0usize;
        for filing in &filings {
            if self.store.is_processed(&filing.accession_number).await {
                debug!(
                    "Filing {} already processed, skipping",
                    filing.accession_number
                );
                continue;
            }
            match self.process_filing(fund, filing).await {
                Ok(()) => filings_processed += 1,
                Err(e) => warn!(
                    "Failed to process filing {}: {e:#}",
                    filing.accession_number
                ),
            }
        }

        Ok(FundRunOutcome {
            fund_name: fund.name.clone(),
            filings_found,
            filings_processed,
            failed: false,
        })
    }

    /// All filings for a fund across its search terms, deduplicated by
    /// accession number. Oldest first, so a backfill builds history in
    /// order and every diff sees the filing immediately before it.
    async fn search_fund_filings(
        &self,
        fund: &FundTarget,
        days_back: u32,
    ) -> Result<Vec<FilingRef>> {
        let mut by_accession: HashMap<String, FilingRef> = HashMap::new();
        for term in Settings::search_terms(fund) {
            let found = self
                .client
                .search_filings(term, &self.settings.filing_types, days_back)
                .await?;
            for filing in found {
                by_accession
                    .entry(filing.accession_number.clone())
                    .or_insert(filing);
            }
        }

        let mut filings: Vec<FilingRef> = by_accession.into_values().collect();
        filings.sort_by(|a, b| {
            a.filing_date
                .cmp(&b.filing_date)
                .then_with(|| a.accession_number.cmp(&b.accession_number))
        });
        info!("Found {} filings for {}", filings.len(), fund.name);
        Ok(filings)
    }

    async fn process_filing(&self, fund: &FundTarget, filing: &FilingRef) -> Result<()> {
        info!("Processing filing: {}", filing.accession_number);

        let content = self.client.download_filing(filing).await?;
        let parsed = filing::parse_filing(&content, &self.settings.parsing)
            .with_context(|| format!("Failed to parse filing {}", filing.accession_number))?;

        let report_date = parsed.report_date.or(filing.filing_date).ok_or_else(|| {
            anyhow!("Filing {} carries no report date", filing.accession_number)
        })?;

        let snapshot = FilingSnapshot::from_holdings(
            fund.name.clone(),
            report_date,
            FilingType::from_form_type(&filing.filing_type),
            parsed.holdings,
        );

        // amendments share their report date with the filing they amend, so
        // a strictly-before lookup always lands on the true prior filing
        let previous = self.store.previous_snapshot(&fund.name, report_date).await?;
        let result = diff::classify(previous.as_ref(), &snapshot).with_context(|| {
            format!("Classification failed for {}", filing.accession_number)
        })?;

        self.store.save_snapshot(&snapshot).await?;
        self.store.save_report(&result).await?;
        self.store.mark_processed(&filing.accession_number).await?;

        let body = format::filing_message(&fund.name, filing, &snapshot, &result);
        self.notifier
            .send_filing_notification(&fund.name, &snapshot.filing_date.to_string(), &body)
            .await;

        info!(
            "Successfully processed filing {} ({} holdings, {} changed)",
            filing.accession_number,
            snapshot.holdings_count(),
            result.changed_holdings().count(),
        );
        Ok(())
    }
}
