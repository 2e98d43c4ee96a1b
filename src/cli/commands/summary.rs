use anyhow::Result;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use tracing::info;

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::history::FileHistoryStore;
use crate::model::FilingType;
use crate::notify::format::format_thousands;

#[derive(Args, Clone)]
pub struct SummaryArgs {
    /// Configured fund name or alias
    pub fund: String,
}

pub struct SummaryCommand {
    args: SummaryArgs,
}

impl SummaryCommand {
    pub fn new(args: SummaryArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: Settings, data_paths: DataPaths) -> Result<()> {
        let manager_name = settings
            .fund(&self.args.fund)
            .map(|f| f.name.clone())
            .unwrap_or_else(|| self.args.fund.clone());

        let store = FileHistoryStore::open(data_paths, &settings.data).await?;
        let Some(summary) = store.fund_summary(&manager_name).await? else {
            info!("No filing history for {manager_name}");
            return Ok(());
        };

        println!("\n{} - {} filings", summary.manager_name, summary.filings.len());

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Report Date", "Type", "Total Value", "Holdings"]);

        for filing in &summary.filings {
            let filing_type = match filing.filing_type {
                FilingType::Initial => "INITIAL",
                FilingType::Amendment => "AMENDMENT",
            };
            table.add_row(vec![
                filing.filing_date.to_string(),
                filing_type.to_string(),
                format!("${}", format_thousands(filing.total_value)),
                filing.holdings_count.to_string(),
            ]);
        }

        println!("{table}");
        println!("Last updated: {}\n", summary.last_updated.to_rfc3339());
        Ok(())
    }
}
