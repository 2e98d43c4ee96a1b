use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::history::FileHistoryStore;

#[derive(Args, Clone)]
pub struct CleanupArgs {
    /// Delete filing, report, and backup files older than this many days
    #[arg(long, default_value = "365")]
    pub days: u64,
}

pub struct CleanupCommand {
    args: CleanupArgs,
}

impl CleanupCommand {
    pub fn new(args: CleanupArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: Settings, data_paths: DataPaths) -> Result<()> {
        let store = FileHistoryStore::open(data_paths, &settings.data).await?;
        let removed = store.cleanup_older_than(self.args.days).await?;
        info!("Removed {removed} files older than {} days", self.args.days);
        Ok(())
    }
}
