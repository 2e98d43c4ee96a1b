//! Filing snapshot: one manager, one report date, the full set of holdings

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::matching::{normalize, MatchKey};
use crate::model::HoldingRecord;

/// Whether a filing is an original quarterly report or an amendment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FilingType {
    Initial,
    Amendment,
}

impl FilingType {
    /// Map an EDGAR form type string ("13F-HR", "13F-HR/A") to a filing type
    pub fn from_form_type(form_type: &str) -> Self {
        if form_type.trim().ends_with("/A") {
            FilingType::Amendment
        } else {
            FilingType::Initial
        }
    }
}

/// Complete set of holdings reported in one filing.
///
/// Built once from parsed filing input and immutable afterwards; the diff
/// engine consumes it and the history store persists it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingSnapshot {
    pub manager_name: String,
    /// Report date of the filing (the as-of date, not the submission date)
    pub filing_date: NaiveDate,
    pub filing_type: FilingType,
    pub holdings: Vec<HoldingRecord>,
    /// Sum of constituent values, recomputed at construction
    pub total_value: i64,
}

impl FilingSnapshot {
    /// Build a snapshot from parsed holdings.
    ///
    /// Lines resolving to the same match key are merged by summing shares and
    /// value; a filing must not report one security as two entries. The
    /// aggregate total is recomputed from the constituents, never trusted
    /// from the filing.
    pub fn from_holdings(
        manager_name: impl Into<String>,
        filing_date: NaiveDate,
        filing_type: FilingType,
        holdings: Vec<HoldingRecord>,
    ) -> Self {
        let mut merged: Vec<HoldingRecord> = Vec::with_capacity(holdings.len());
        let mut index: HashMap<MatchKey, usize> = HashMap::with_capacity(holdings.len());

        for holding in holdings {
            let key = normalize(&holding.identifier_raw, &holding.security_name);
            match index.get(&key) {
                Some(&at) => {
                    merged[at].shares += holding.shares;
                    merged[at].value += holding.value;
                }
                None => {
                    index.insert(key, merged.len());
                    merged.push(holding);
                }
            }
        }

        let total_value = merged.iter().map(|h| h.value).sum();

        Self {
            manager_name: manager_name.into(),
            filing_date,
            filing_type,
            holdings: merged,
            total_value,
        }
    }

    pub fn holdings_count(&self) -> usize {
        self.holdings.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_total_value_is_recomputed_from_constituents() {
        let snapshot = FilingSnapshot::from_holdings(
            "Situational Awareness LP",
            date("2026-03-31"),
            FilingType::Initial,
            vec![
                HoldingRecord::new("APPLE INC", "037833100", 1000, 150_000),
                HoldingRecord::new("MICROSOFT CORP", "594918104", 500, 210_000),
            ],
        );

        assert_eq!(snapshot.total_value, 360_000);
        assert_eq!(snapshot.holdings_count(), 2);
    }

    #[test]
    fn test_duplicate_lines_are_merged() {
        // same CUSIP reported twice must collapse into one position
        let snapshot = FilingSnapshot::from_holdings(
            "Situational Awareness LP",
            date("2026-03-31"),
            FilingType::Initial,
            vec![
                HoldingRecord::new("APPLE INC", "037833100", 1000, 150_000),
                HoldingRecord::new("APPLE INC", "037833100", 200, 30_000),
            ],
        );

        assert_eq!(snapshot.holdings_count(), 1);
        assert_eq!(snapshot.holdings[0].shares, 1200);
        assert_eq!(snapshot.holdings[0].value, 180_000);
        assert_eq!(snapshot.total_value, 180_000);
    }

    #[test]
    fn test_merge_uses_name_fallback_for_blank_identifiers() {
        let snapshot = FilingSnapshot::from_holdings(
            "Situational Awareness LP",
            date("2026-03-31"),
            FilingType::Amendment,
            vec![
                HoldingRecord::new("Nvidia Corp", "", 100, 9_000),
                HoldingRecord::new("NVIDIA CORP.", "", 50, 4_500),
            ],
        );

        assert_eq!(snapshot.holdings_count(), 1);
        assert_eq!(snapshot.holdings[0].shares, 150);
    }

    #[test]
    fn test_holdings_order_is_preserved() {
        let snapshot = FilingSnapshot::from_holdings(
            "Fund",
            date("2026-06-30"),
            FilingType::Initial,
            vec![
                HoldingRecord::new("ZEBRA TECHNOLOGIES", "989207105", 10, 3_000),
                HoldingRecord::new("APPLE INC", "037833100", 20, 4_000),
            ],
        );

        assert_eq!(snapshot.holdings[0].security_name, "ZEBRA TECHNOLOGIES");
        assert_eq!(snapshot.holdings[1].security_name, "APPLE INC");
    }

    #[test]
    fn test_filing_type_from_form_type() {
        assert_eq!(FilingType::from_form_type("13F-HR"), FilingType::Initial);
        assert_eq!(FilingType::from_form_type("13F-HR/A"), FilingType::Amendment);
        assert_eq!(FilingType::from_form_type(" 13F-NT/A "), FilingType::Amendment);
    }
}
