use std::path::{Path, PathBuf};

/// Default data directory (relative to current working directory)
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Subdirectory paths relative to the data directory
pub const FILINGS_DIR: &str = "filings";
pub const REPORTS_DIR: &str = "reports";
pub const SUMMARIES_DIR: &str = "summaries";
pub const BACKUPS_DIR: &str = "backups";
pub const STATE_DIR: &str = "state";
pub const LOGS_DIR: &str = "logs";

/// Helper struct to manage data paths
#[derive(Clone, Debug)]
pub struct DataPaths {
    root: PathBuf,
}

impl DataPaths {
    /// Create a new DataPaths instance with the given root directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Get the root data directory
    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Snapshot JSON files, one subdirectory per manager
    pub fn filings(&self) -> PathBuf {
        self.root.join(FILINGS_DIR)
    }

    /// Classification result JSON files, one subdirectory per manager
    pub fn reports(&self) -> PathBuf {
        self.root.join(REPORTS_DIR)
    }

    /// Per-manager filing history summaries
    pub fn summaries(&self) -> PathBuf {
        self.root.join(SUMMARIES_DIR)
    }

    /// Snapshot backups, pruned to a configured count
    pub fn backups(&self) -> PathBuf {
        self.root.join(BACKUPS_DIR)
    }

    /// Processed-filings ledger and other run state
    pub fn state(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    /// Get the logs directory
    pub fn logs(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    pub fn manager_filings(&self, manager_name: &str) -> PathBuf {
        self.filings().join(manager_slug(manager_name))
    }

    pub fn manager_reports(&self, manager_name: &str) -> PathBuf {
        self.reports().join(manager_slug(manager_name))
    }

    pub fn manager_backups(&self, manager_name: &str) -> PathBuf {
        self.backups().join(manager_slug(manager_name))
    }

    pub fn manager_summary(&self, manager_name: &str) -> PathBuf {
        self.summaries()
            .join(format!("{}.json", manager_slug(manager_name)))
    }

    /// Ensure all directories exist
    pub fn ensure_directories(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)?;
        std::fs::create_dir_all(self.filings())?;
        std::fs::create_dir_all(self.reports())?;
        std::fs::create_dir_all(self.summaries())?;
        std::fs::create_dir_all(self.backups())?;
        std::fs::create_dir_all(self.state())?;
        std::fs::create_dir_all(self.logs())?;
        Ok(())
    }
}

/// Directory-safe form of a manager name: lowercase, whitespace to
/// underscores, everything else non-alphanumeric dropped
pub fn manager_slug(manager_name: &str) -> String {
    let mut out = String::with_capacity(manager_name.len());
    for c in manager_name.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
        } else if c.is_whitespace() && !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manager_slug() {
        assert_eq!(manager_slug("Situational Awareness LP"), "situational_awareness_lp");
        assert_eq!(manager_slug("  Scion  Asset Mgmt.  "), "scion_asset_mgmt");
        assert_eq!(manager_slug("Fund (No. 2)"), "fund_no_2");
    }

    #[test]
    fn test_manager_paths_share_the_slug() {
        let paths = DataPaths::new("/tmp/thirteenf-test");
        let filings = paths.manager_filings("Scion Asset Management");
        assert!(filings.ends_with("filings/scion_asset_management"));

        let summary = paths.manager_summary("Scion Asset Management");
        assert!(summary.ends_with("summaries/scion_asset_management.json"));
    }
}
