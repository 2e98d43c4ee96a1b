use anyhow::{anyhow, Result};
use clap::Args;
use tracing::{info, warn};

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::tracker::FilingTracker;

#[derive(Args, Clone)]
pub struct FetchArgs {
    /// Configured fund name or alias
    pub fund: String,

    /// Override the configured search window in days
    #[arg(long)]
    pub days_back: Option<u32>,
}

pub struct FetchCommand {
    args: FetchArgs,
}

impl FetchCommand {
    pub fn new(args: FetchArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: Settings, data_paths: DataPaths) -> Result<()> {
        let fund = settings
            .fund(&self.args.fund)
            .cloned()
            .ok_or_else(|| anyhow!("Fund '{}' is not configured", self.args.fund))?;

        let tracker = FilingTracker::new(settings, data_paths).await?;

        if let Some(cik) = &fund.cik {
            match tracker.client().company_info(cik).await {
                Ok(company) => info!("EDGAR lists CIK {} as {}", cik, company.name),
                Err(e) => warn!("Company lookup failed for CIK {}: {e:#}", cik),
            }
        }

        let outcome = tracker.process_fund(&fund, self.args.days_back).await?;
        info!(
            "{}: {} filings found, {} processed",
            outcome.fund_name, outcome.filings_found, outcome.filings_processed
        );
        Ok(())
    }
}
