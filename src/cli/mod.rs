//! CLI module for thirteenf
//!
//! Command-line interface for the 13F filing tracker. Uses clap for argument
//! parsing and a structured command pattern, one command per file under
//! `commands/`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod commands;

use crate::config::{Settings, DEFAULT_CONFIG_PATH};
use crate::data_paths::{DataPaths, DEFAULT_DATA_DIR};
use crate::logging::{init_logging, LoggingConfig};

use commands::cleanup::{CleanupArgs, CleanupCommand};
use commands::diff::{DiffArgs, DiffCommand};
use commands::export::{ExportArgs, ExportCommand};
use commands::fetch::{FetchArgs, FetchCommand};
use commands::run::{RunArgs, RunCommand};
use commands::summary::{SummaryArgs, SummaryCommand};
use commands::test_notify::{TestNotifyArgs, TestNotifyCommand};

#[derive(Parser)]
#[command(name = "thirteenf")]
#[command(version)]
#[command(about = "SEC 13F filing tracker and holdings diff engine", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Settings file path
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Data directory path (default: ./data)
    #[arg(long, global = true, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch, classify, and record new filings for every configured fund
    Run(RunArgs),

    /// Process a single configured fund
    Fetch(FetchArgs),

    /// Classify a filing against its predecessor and print the result
    Diff(DiffArgs),

    /// Show a fund's filing history
    Summary(SummaryArgs),

    /// Export summaries and the processed-filings ledger to one JSON file
    Export(ExportArgs),

    /// Delete stored artifacts older than a cutoff
    Cleanup(CleanupArgs),

    /// Send a test message through the configured notification channels
    TestNotify(TestNotifyArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let data_paths = DataPaths::new(&self.data_dir);
        data_paths.ensure_directories()?;

        init_logging(LoggingConfig::new(data_paths.clone(), self.verbose))?;

        let settings = if self.config.exists() {
            Settings::load(&self.config)?
        } else {
            tracing::warn!(
                "Settings file {} not found, using defaults",
                self.config.display()
            );
            Settings::default()
        };

        match self.command {
            Commands::Run(args) => RunCommand::new(args).execute(settings, data_paths).await,
            Commands::Fetch(args) => FetchCommand::new(args).execute(settings, data_paths).await,
            Commands::Diff(args) => DiffCommand::new(args).execute(settings, data_paths).await,
            Commands::Summary(args) => {
                SummaryCommand::new(args).execute(settings, data_paths).await
            }
            Commands::Export(args) => ExportCommand::new(args).execute(settings, data_paths).await,
            Commands::Cleanup(args) => {
                CleanupCommand::new(args).execute(settings, data_paths).await
            }
            Commands::TestNotify(args) => {
                TestNotifyCommand::new(args).execute(settings, data_paths).await
            }
        }
    }
}
