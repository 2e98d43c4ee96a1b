//! Holding record and position-change classification types

use serde::{Deserialize, Serialize};

/// How a position changed between two consecutive filings
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Classification {
    New,
    Increased,
    Decreased,
    Exited,
    Unchanged,
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Classification::New => "NEW",
            Classification::Increased => "INCREASED",
            Classification::Decreased => "DECREASED",
            Classification::Exited => "EXITED",
            Classification::Unchanged => "UNCHANGED",
        };
        f.write_str(s)
    }
}

/// One position line from a 13F information table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoldingRecord {
    /// Issuer name as reported in the filing
    pub security_name: String,
    /// Raw CUSIP as reported; may be blank or truncated, especially in amendments
    #[serde(default)]
    pub identifier_raw: String,
    /// Share or principal amount; zero means the position is reported closed
    pub shares: i64,
    /// Reported market value of the position
    pub value: i64,
    /// Put/call flag when the line is an option position
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put_call: Option<String>,
    /// Change classification, absent until the diff engine runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_shares: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta_value: Option<i64>,
}

impl HoldingRecord {
    /// Create an unclassified holding line
    pub fn new(
        security_name: impl Into<String>,
        identifier_raw: impl Into<String>,
        shares: i64,
        value: i64,
    ) -> Self {
        Self {
            security_name: security_name.into(),
            identifier_raw: identifier_raw.into(),
            shares,
            value,
            put_call: None,
            classification: None,
            delta_shares: None,
            delta_value: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_serializes_uppercase() {
        let json = serde_json::to_string(&Classification::Increased).unwrap();
        assert_eq!(json, "\"INCREASED\"");

        let back: Classification = serde_json::from_str("\"EXITED\"").unwrap();
        assert_eq!(back, Classification::Exited);
    }

    #[test]
    fn test_unclassified_holding_omits_computed_fields() {
        let holding = HoldingRecord::new("APPLE INC", "037833100", 1000, 150_000);
        let json = serde_json::to_string(&holding).unwrap();

        assert!(!json.contains("classification"));
        assert!(!json.contains("delta_shares"));
        assert!(!json.contains("put_call"));
    }
}
