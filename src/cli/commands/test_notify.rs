use anyhow::Result;
use clap::Args;
use tracing::info;

use crate::config::Settings;
use crate::data_paths::DataPaths;
use crate::notify::Notifier;

#[derive(Args, Clone)]
pub struct TestNotifyArgs {}

pub struct TestNotifyCommand {
    #[allow(dead_code)]
    args: TestNotifyArgs,
}

impl TestNotifyCommand {
    pub fn new(args: TestNotifyArgs) -> Self {
        Self { args }
    }

    pub async fn execute(&self, settings: Settings, _data_paths: DataPaths) -> Result<()> {
        info!("Testing notification channels");
        let notifier = Notifier::new(settings.notifications);
        notifier.test_channels().await;
        Ok(())
    }
}
