//! Runtime settings loaded from a YAML file
//!
//! See `config/settings.yaml` for a documented sample. Every section has
//! defaults so a partial file (or none, in tests) still yields a usable
//! configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default settings file (relative to the working directory)
pub const DEFAULT_CONFIG_PATH: &str = "config/settings.yaml";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sec_edgar: EdgarSettings,
    /// EDGAR form types to track
    pub filing_types: Vec<String>,
    pub parsing: ParsingSettings,
    pub data: DataSettings,
    pub notifications: NotificationSettings,
    pub target_funds: Vec<FundTarget>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sec_edgar: EdgarSettings::default(),
            filing_types: vec!["13F-HR".to_string(), "13F-HR/A".to_string()],
            parsing: ParsingSettings::default(),
            data: DataSettings::default(),
            notifications: NotificationSettings::default(),
            target_funds: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgarSettings {
    /// Filing archive base (complete submission text files live under it)
    pub base_url: String,
    /// Company browse endpoint used for filing search
    pub search_url: String,
    /// SEC requires a descriptive User-Agent with contact information
    pub user_agent: String,
    /// Pause after every request; EDGAR caps automated clients at 10 req/s
    pub rate_limit_delay_ms: u64,
    pub retry_attempts: usize,
    /// Search window for new filings
    pub days_back: u32,
}

impl Default for EdgarSettings {
    fn default() -> Self {
        Self {
            base_url: "https://www.sec.gov/Archives/edgar/data".to_string(),
            search_url: "https://www.sec.gov/cgi-bin/browse-edgar".to_string(),
            user_agent: "thirteenf/0.1 (13F holdings tracker; ops@example.com)".to_string(),
            rate_limit_delay_ms: 350,
            retry_attempts: 3,
            days_back: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ParsingSettings {
    /// Positions below this reported value are dropped
    pub min_position_value: i64,
    /// Keep zero-share lines (exit notices) instead of filtering them
    pub include_zero_positions: bool,
}

impl Default for ParsingSettings {
    fn default() -> Self {
        Self {
            min_position_value: 10_000,
            include_zero_positions: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub backup_enabled: bool,
    /// Backups kept per manager before the oldest are pruned
    pub max_backups: usize,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            backup_enabled: true,
            max_backups: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// File GitHub issues for new filings (token/repo come from the
    /// GITHUB_TOKEN and GITHUB_REPOSITORY environment variables)
    pub github_issue_enabled: bool,
    /// Slack incoming-webhook URL; empty disables the channel
    pub slack_webhook: String,
    pub email_enabled: bool,
    pub email_recipients: Vec<String>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            github_issue_enabled: true,
            slack_webhook: String::new(),
            email_enabled: false,
            email_recipients: Vec::new(),
        }
    }
}

/// One investment manager to track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundTarget {
    /// Fund name; used as the search term and the snapshot manager name
    pub name: String,
    #[serde(default)]
    pub manager: String,
    /// EDGAR CIK when known
    #[serde(default)]
    pub cik: Option<String>,
    /// Alternate names the fund files under
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        let settings: Settings = serde_yaml::from_str(&text)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
        Ok(settings)
    }

    /// Look up a configured fund by name or alias, case-insensitively
    pub fn fund(&self, name: &str) -> Option<&FundTarget> {
        self.target_funds.iter().find(|f| {
            f.name.eq_ignore_ascii_case(name)
                || f.aliases.iter().any(|a| a.eq_ignore_ascii_case(name))
        })
    }

    /// Search terms for a fund: its name plus every alias
    pub fn search_terms(fund: &FundTarget) -> Vec<&str> {
        std::iter::once(fund.name.as_str())
            .chain(fund.aliases.iter().map(String::as_str))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_fills_defaults() {
        let yaml = r#"
target_funds:
  - name: "Situational Awareness LP"
    manager: "Leopold Aschenbrenner"
parsing:
  min_position_value: 50000
"#;
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(settings.target_funds.len(), 1);
        assert_eq!(settings.parsing.min_position_value, 50_000);
        // untouched sections keep their defaults
        assert!(settings.parsing.include_zero_positions);
        assert_eq!(settings.sec_edgar.retry_attempts, 3);
        assert!(settings.sec_edgar.user_agent.contains('@'));
        assert_eq!(settings.filing_types, vec!["13F-HR", "13F-HR/A"]);
    }

    #[test]
    fn test_fund_lookup_matches_aliases_case_insensitively() {
        let settings: Settings = serde_yaml::from_str(
            r#"
target_funds:
  - name: "Scion Asset Management"
    aliases: ["Scion Capital"]
"#,
        )
        .unwrap();

        assert!(settings.fund("scion asset management").is_some());
        assert!(settings.fund("SCION CAPITAL").is_some());
        assert!(settings.fund("Unknown Fund").is_none());
    }

    #[test]
    fn test_search_terms_include_aliases() {
        let fund = FundTarget {
            name: "Scion Asset Management".to_string(),
            manager: String::new(),
            cik: None,
            aliases: vec!["Scion Capital".to_string()],
        };

        let terms = Settings::search_terms(&fund);
        assert_eq!(terms, vec!["Scion Asset Management", "Scion Capital"]);
    }
}
