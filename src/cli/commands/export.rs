use anyhow::{Context, Result};
use chrono::Utc;
use clap::Args;
use std::path::PathBuf;
use tracing::info;

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::history::FileHistoryStore;

#[derive(Args, Clone)]
pub struct ExportArgs {
    /// Output file (default: 13f_export_<timestamp>.json)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

pub struct ExportCommand {
    args: ExportArgs,
}

impl ExportCommand {
    pub fn new(args: ExportArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: Settings, data_paths: DataPaths) -> Result<()> {
        let store = FileHistoryStore::open(data_paths, &settings.data).await?;

        let document = store.export_all().await?;
        let output = self.args.output.clone().unwrap_or_else(|| {
            PathBuf::from(format!(
                "13f_export_{}.json",
                Utc::now().format("%Y%m%d_%H%M%S")
            ))
        });

        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(&output, json)
            .with_context(|| format!("Failed to write export to {}", output.display()))?;
        info!("Data exported to {}", output.display());

        let stats = store.statistics().await?;
        info!(
            "{} processed filings across {} managers ({} bytes on disk)",
            stats.total_processed, stats.managers, stats.disk_bytes
        );
        Ok(())
    }
}
