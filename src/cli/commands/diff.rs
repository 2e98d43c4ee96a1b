use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::diff::{classify, ClassificationResult};
use crate::history::{FileHistoryStore, HistoryStore};
use crate::model::{Classification, FilingSnapshot};
use crate::notify::format::{format_thousands, signed_dollars};

#[derive(Args, Clone)]
pub struct DiffArgs {
    /// Configured fund name (classifies the stored snapshot at --date)
    #[arg(long, requires = "date", conflicts_with = "current")]
    pub manager: Option<String>,

    /// Report date of the stored snapshot to classify
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Explicit current snapshot JSON file
    #[arg(long)]
    pub current: Option<PathBuf>,

    /// Explicit previous snapshot JSON file (omit for a first-filing diff)
    #[arg(long, requires = "current")]
    pub previous: Option<PathBuf>,

    /// Print the full result as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub struct DiffCommand {
    args: DiffArgs,
}

impl DiffCommand {
    pub fn new(args: DiffArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: Settings, data_paths: DataPaths) -> Result<()> {
        let (previous, current) = if let Some(current_path) = &self.args.current {
            let current = load_snapshot_file(current_path)?;
            let previous = self
                .args
                .previous
                .as_deref()
                .map(load_snapshot_file)
                .transpose()?;
            (previous, current)
        } else if let (Some(manager), Some(date)) = (&self.args.manager, self.args.date) {
            // resolve aliases to the configured fund name
            let manager_name = settings
                .fund(manager)
                .map(|f| f.name.clone())
                .unwrap_or_else(|| manager.clone());

            let store = FileHistoryStore::open(data_paths, &settings.data).await?;
            let current = store
                .load_snapshot(&manager_name, date)
                .await?
                .ok_or_else(|| anyhow!("No stored snapshot for {manager_name} at {date}"))?;
            let previous = store.previous_snapshot(&manager_name, date).await?;
            (previous, current)
        } else {
            return Err(anyhow!(
                "Provide either --manager with --date, or --current [--previous]"
            ));
        };

        let result = classify(previous.as_ref(), &current)?;

        if self.args.json {
            println!("{}", serde_json::to_string_pretty(&result)?);
        } else {
            print_result(&result);
        }
        Ok(())
    }
}

fn load_snapshot_file(path: &Path) -> Result<FilingSnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Not a filing snapshot: {}", path.display()))
}

fn print_result(result: &ClassificationResult) {
    let baseline = match result.previous_filing_date {
        Some(date) => format!("vs {date}"),
        None => "first tracked filing".to_string(),
    };
    println!(
        "\n{} - {} ({})",
        result.manager_name, result.filing_date, baseline
    );

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            "Security", "CUSIP", "Change", "Shares", "Δ Shares", "Value", "Δ Value",
        ]);

    for holding in &result.classified_holdings {
        let change_cell = match holding.classification {
            Some(c) => classification_cell(c),
            None => Cell::new(""),
        };
        table.add_row(vec![
            Cell::new(&holding.security_name),
            Cell::new(&holding.identifier_raw),
            change_cell,
            Cell::new(format_thousands(holding.shares)),
            Cell::new(
                holding
                    .delta_shares
                    .map(format_signed)
                    .unwrap_or_default(),
            ),
            Cell::new(format!("${}", format_thousands(holding.value))),
            Cell::new(
                holding
                    .delta_value
                    .map(signed_dollars)
                    .unwrap_or_default(),
            ),
        ]);
    }

    println!("{table}");
    println!(
        "NEW: {} | INCREASED: {} | DECREASED: {} | EXITED: {} | UNCHANGED: {}",
        result.count(Classification::New),
        result.count(Classification::Increased),
        result.count(Classification::Decreased),
        result.count(Classification::Exited),
        result.count(Classification::Unchanged),
    );
    println!("Total value change: {}\n", signed_dollars(result.total_value_delta));
}

fn format_signed(value: i64) -> String {
    if value > 0 {
        format!("+{}", format_thousands(value))
    } else {
        format_thousands(value)
    }
}

fn classification_cell(classification: Classification) -> Cell {
    let cell = Cell::new(classification.to_string());
    match classification {
        Classification::New => cell.fg(Color::Cyan),
        Classification::Increased => cell.fg(Color::Green),
        Classification::Decreased => cell.fg(Color::Yellow),
        Classification::Exited => cell.fg(Color::Red),
        Classification::Unchanged => cell.fg(Color::DarkGrey),
    }
}
