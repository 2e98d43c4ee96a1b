use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::tracker::FilingTracker;

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Override the configured search window in days
    #[arg(long)]
    pub days_back: Option<u32>,

    /// Send a run summary notification when finished
    #[arg(long)]
    pub summary: bool,
}

pub struct RunCommand {
    args: RunArgs,
}

impl RunCommand {
    pub fn new(args: RunArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: Settings, data_paths: DataPaths) -> Result<()> {
        info!("Starting 13F filing tracker run");

        let tracker = FilingTracker::new(settings, data_paths).await?;
        let outcomes = tracker.run(self.args.days_back, self.args.summary).await?;

        let processed: usize = outcomes.iter().map(|o| o.filings_processed).sum();
        let failed = outcomes.iter().filter(|o| o.failed).count();
        info!(
            "Run complete: {} filings processed across {} funds ({} failed)",
            processed,
            outcomes.len(),
            failed
        );
        Ok(())
    }
}
