//! Filing diff and change-classification engine
//!
//! Compares a manager's newest snapshot against the most recent prior
//! snapshot and classifies every position as NEW / INCREASED / DECREASED /
//! EXITED / UNCHANGED with signed share and value deltas. Pure computation:
//! no I/O, no shared state, identical inputs always yield identical output.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::matching::{normalize, MatchKey};
use crate::model::{Classification, FilingSnapshot, HoldingRecord};

#[derive(Error, Debug)]
pub enum InvalidSnapshotError {
    #[error("snapshot manager mismatch: previous is '{previous}', current is '{current}'")]
    ManagerMismatch { previous: String, current: String },
    #[error("holding '{security_name}' has negative {field}")]
    NegativeField {
        security_name: String,
        field: &'static str,
    },
}

/// Classification of every position in one filing against its predecessor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub manager_name: String,
    pub filing_date: NaiveDate,
    /// Report date of the comparison baseline; None for a first filing
    pub previous_filing_date: Option<NaiveDate>,
    /// Current-snapshot order, then positions dropped since the prior filing
    pub classified_holdings: Vec<HoldingRecord>,
    pub summary_counts: BTreeMap<Classification, usize>,
    /// Current total minus previous total; the current total for a first filing
    pub total_value_delta: i64,
}

impl ClassificationResult {
    pub fn count(&self, classification: Classification) -> usize {
        self.summary_counts.get(&classification).copied().unwrap_or(0)
    }

    /// Holdings whose classification is anything other than UNCHANGED
    pub fn changed_holdings(&self) -> impl Iterator<Item = &HoldingRecord> {
        self.classified_holdings
            .iter()
            .filter(|h| h.classification != Some(Classification::Unchanged))
    }
}

/// Classify every position of `current` against `previous`.
///
/// With no prior snapshot every position is NEW. Position identity is
/// resolved through [`normalize`]; classification is decided purely on the
/// share count, value deltas are informational. Prior positions absent from
/// the current filing entirely are appended as EXITED in their prior order.
pub fn classify(
    previous: Option<&FilingSnapshot>,
    current: &FilingSnapshot,
) -> Result<ClassificationResult, InvalidSnapshotError> {
    if let Some(prev) = previous {
        if prev.manager_name != current.manager_name {
            return Err(InvalidSnapshotError::ManagerMismatch {
                previous: prev.manager_name.clone(),
                current: current.manager_name.clone(),
            });
        }
        validate_holdings(&prev.holdings)?;
    }
    validate_holdings(&current.holdings)?;

    // Working set of not-yet-matched prior positions, consumed as matches
    // land; whatever survives the loop was dropped from the current filing.
    let mut remaining: HashMap<MatchKey, &HoldingRecord> = HashMap::new();
    if let Some(prev) = previous {
        for holding in &prev.holdings {
            remaining.insert(
                normalize(&holding.identifier_raw, &holding.security_name),
                holding,
            );
        }
    }

    let mut classified: Vec<HoldingRecord> =
        Vec::with_capacity(current.holdings.len() + remaining.len());

    for cur in &current.holdings {
        let key = normalize(&cur.identifier_raw, &cur.security_name);
        let mut out = cur.clone();

        match remaining.remove(&key) {
            None => {
                out.classification = Some(Classification::New);
                out.delta_shares = Some(cur.shares);
                out.delta_value = Some(cur.value);
            }
            Some(prev) if cur.shares == 0 => {
                // explicit zero-share line reporting the position closed
                out.classification = Some(Classification::Exited);
                out.delta_shares = Some(-prev.shares);
                out.delta_value = Some(-prev.value);
            }
            Some(prev) if cur.shares == prev.shares => {
                out.classification = Some(Classification::Unchanged);
                out.delta_shares = Some(0);
                out.delta_value = Some(0);
            }
            Some(prev) => {
                out.classification = Some(if cur.shares > prev.shares {
                    Classification::Increased
                } else {
                    Classification::Decreased
                });
                out.delta_shares = Some(cur.shares - prev.shares);
                out.delta_value = Some(cur.value - prev.value);
            }
        }

        classified.push(out);
    }

    // Prior positions with no line at all in the current filing, in the
    // order they appeared in the prior snapshot.
    if let Some(prev) = previous {
        for holding in &prev.holdings {
            let key = normalize(&holding.identifier_raw, &holding.security_name);
            if remaining.remove(&key).is_some() {
                classified.push(HoldingRecord {
                    security_name: holding.security_name.clone(),
                    identifier_raw: holding.identifier_raw.clone(),
                    shares: 0,
                    value: 0,
                    put_call: holding.put_call.clone(),
                    classification: Some(Classification::Exited),
                    delta_shares: Some(-holding.shares),
                    delta_value: Some(-holding.value),
                });
            }
        }
    }

    let mut summary_counts = BTreeMap::new();
    for holding in &classified {
        if let Some(classification) = holding.classification {
            *summary_counts.entry(classification).or_insert(0) += 1;
        }
    }

    let total_value_delta = current.total_value - previous.map_or(0, |p| p.total_value);

    Ok(ClassificationResult {
        manager_name: current.manager_name.clone(),
        filing_date: current.filing_date,
        previous_filing_date: previous.map(|p| p.filing_date),
        classified_holdings: classified,
        summary_counts,
        total_value_delta,
    })
}

fn validate_holdings(holdings: &[HoldingRecord]) -> Result<(), InvalidSnapshotError> {
    for holding in holdings {
        if holding.shares < 0 {
            return Err(InvalidSnapshotError::NegativeField {
                security_name: holding.security_name.clone(),
                field: "shares",
            });
        }
        if holding.value < 0 {
            return Err(InvalidSnapshotError::NegativeField {
                security_name: holding.security_name.clone(),
                field: "value",
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::FilingType;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn snapshot(filing_date: &str, holdings: Vec<HoldingRecord>) -> FilingSnapshot {
        FilingSnapshot::from_holdings(
            "Situational Awareness LP",
            date(filing_date),
            FilingType::Initial,
            holdings,
        )
    }

    fn aapl(shares: i64, value: i64) -> HoldingRecord {
        HoldingRecord::new("APPLE INC", "037833100", shares, value)
    }

    fn goog(shares: i64, value: i64) -> HoldingRecord {
        HoldingRecord::new("ALPHABET INC", "02079K305", shares, value)
    }

    #[test]
    fn test_same_share_count_is_unchanged() {
        let prev = snapshot("2025-12-31", vec![aapl(1000, 150_000)]);
        let cur = snapshot("2026-03-31", vec![aapl(1000, 162_000)]);

        let result = classify(Some(&prev), &cur).unwrap();
        let h = &result.classified_holdings[0];
        assert_eq!(h.classification, Some(Classification::Unchanged));
        assert_eq!(h.delta_shares, Some(0));
        assert_eq!(h.delta_value, Some(0));
    }

    #[test]
    fn test_share_increase_is_increased_with_exact_delta() {
        let prev = snapshot("2025-12-31", vec![aapl(1000, 150_000)]);
        let cur = snapshot("2026-03-31", vec![aapl(1500, 240_000)]);

        let result = classify(Some(&prev), &cur).unwrap();
        let h = &result.classified_holdings[0];
        assert_eq!(h.classification, Some(Classification::Increased));
        assert_eq!(h.delta_shares, Some(500));
        assert_eq!(h.delta_value, Some(90_000));
    }

    #[test]
    fn test_share_decrease_is_decreased() {
        let prev = snapshot("2025-12-31", vec![aapl(1000, 150_000)]);
        let cur = snapshot("2026-03-31", vec![aapl(400, 64_000)]);

        let result = classify(Some(&prev), &cur).unwrap();
        let h = &result.classified_holdings[0];
        assert_eq!(h.classification, Some(Classification::Decreased));
        assert_eq!(h.delta_shares, Some(-600));
        assert_eq!(h.delta_value, Some(-86_000));
    }

    #[test]
    fn test_missing_line_is_exited_via_leftover_matching() {
        let prev = snapshot("2025-12-31", vec![aapl(1000, 150_000)]);
        let cur = snapshot("2026-03-31", vec![]);

        let result = classify(Some(&prev), &cur).unwrap();
        assert_eq!(result.classified_holdings.len(), 1);
        let h = &result.classified_holdings[0];
        assert_eq!(h.security_name, "APPLE INC");
        assert_eq!(h.shares, 0);
        assert_eq!(h.classification, Some(Classification::Exited));
        assert_eq!(h.delta_shares, Some(-1000));
        assert_eq!(h.delta_value, Some(-150_000));
    }

    #[test]
    fn test_explicit_zero_share_line_is_exited() {
        let prev = snapshot("2025-12-31", vec![aapl(1000, 150_000)]);
        let cur = snapshot("2026-03-31", vec![aapl(0, 0)]);

        let result = classify(Some(&prev), &cur).unwrap();
        let h = &result.classified_holdings[0];
        assert_eq!(h.classification, Some(Classification::Exited));
        assert_eq!(h.delta_shares, Some(-1000));
        assert_eq!(h.delta_value, Some(-150_000));
    }

    #[test]
    fn test_first_filing_everything_is_new() {
        let cur = snapshot("2026-03-31", vec![aapl(1000, 150_000), goog(500, 90_000)]);

        let result = classify(None, &cur).unwrap();
        assert!(result.previous_filing_date.is_none());
        assert_eq!(result.total_value_delta, cur.total_value);
        assert!(result
            .classified_holdings
            .iter()
            .all(|h| h.classification == Some(Classification::New)));
        assert_eq!(result.count(Classification::New), 2);
    }

    #[test]
    fn test_classification_follows_shares_not_value() {
        // shares up, value down: still INCREASED
        let prev = snapshot("2025-12-31", vec![aapl(1000, 150_000)]);
        let cur = snapshot("2026-03-31", vec![aapl(1200, 120_000)]);

        let result = classify(Some(&prev), &cur).unwrap();
        let h = &result.classified_holdings[0];
        assert_eq!(h.classification, Some(Classification::Increased));
        assert_eq!(h.delta_shares, Some(200));
        assert_eq!(h.delta_value, Some(-30_000));
    }

    #[test]
    fn test_blank_identifiers_match_by_name() {
        let prev = snapshot(
            "2025-12-31",
            vec![HoldingRecord::new("Tesla, Inc.", "", 300, 60_000)],
        );
        let cur = snapshot(
            "2026-03-31",
            vec![HoldingRecord::new("TESLA INC", "", 300, 72_000)],
        );

        let result = classify(Some(&prev), &cur).unwrap();
        assert_eq!(result.count(Classification::Unchanged), 1);
        assert_eq!(result.count(Classification::New), 0);
        assert_eq!(result.count(Classification::Exited), 0);
    }

    #[test]
    fn test_output_order_current_then_leftover_exits() {
        let prev = snapshot(
            "2025-12-31",
            vec![
                HoldingRecord::new("FIRST EXIT", "111111111", 10, 1_000),
                aapl(1000, 150_000),
                HoldingRecord::new("SECOND EXIT", "222222222", 20, 2_000),
            ],
        );
        let cur = snapshot("2026-03-31", vec![goog(500, 90_000), aapl(1000, 150_000)]);

        let result = classify(Some(&prev), &cur).unwrap();
        let names: Vec<&str> = result
            .classified_holdings
            .iter()
            .map(|h| h.security_name.as_str())
            .collect();
        // current order first, then leftovers in prior-snapshot order
        assert_eq!(
            names,
            vec!["ALPHABET INC", "APPLE INC", "FIRST EXIT", "SECOND EXIT"]
        );
    }

    #[test]
    fn test_summary_counts_cover_every_output_entry() {
        let prev = snapshot(
            "2025-12-31",
            vec![aapl(1000, 150_000), HoldingRecord::new("GONE CORP", "333333333", 5, 500)],
        );
        let cur = snapshot("2026-03-31", vec![aapl(1500, 240_000), goog(500, 90_000)]);

        let result = classify(Some(&prev), &cur).unwrap();
        let total: usize = result.summary_counts.values().sum();
        assert_eq!(total, result.classified_holdings.len());
        assert_eq!(total, 3);
        assert_eq!(result.count(Classification::Increased), 1);
        assert_eq!(result.count(Classification::New), 1);
        assert_eq!(result.count(Classification::Exited), 1);
    }

    #[test]
    fn test_total_value_delta() {
        let prev = snapshot("2025-12-31", vec![aapl(1000, 150_000)]);
        let cur = snapshot("2026-03-31", vec![aapl(1000, 180_000)]);

        let result = classify(Some(&prev), &cur).unwrap();
        assert_eq!(result.total_value_delta, 30_000);
    }

    #[test]
    fn test_idempotent() {
        let prev = snapshot("2025-12-31", vec![aapl(1000, 150_000), goog(500, 90_000)]);
        let cur = snapshot("2026-03-31", vec![aapl(900, 140_000)]);

        let a = classify(Some(&prev), &cur).unwrap();
        let b = classify(Some(&prev), &cur).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_manager_mismatch_is_rejected() {
        let prev = FilingSnapshot::from_holdings(
            "Fund A",
            date("2025-12-31"),
            FilingType::Initial,
            vec![aapl(1000, 150_000)],
        );
        let cur = FilingSnapshot::from_holdings(
            "Fund B",
            date("2026-03-31"),
            FilingType::Initial,
            vec![aapl(1000, 150_000)],
        );

        let err = classify(Some(&prev), &cur).unwrap_err();
        assert!(matches!(err, InvalidSnapshotError::ManagerMismatch { .. }));
    }

    #[test]
    fn test_negative_fields_are_rejected() {
        let cur = snapshot("2026-03-31", vec![HoldingRecord::new("BAD CORP", "444444444", -5, 100)]);
        let err = classify(None, &cur).unwrap_err();
        assert!(matches!(
            err,
            InvalidSnapshotError::NegativeField { field: "shares", .. }
        ));

        let cur = snapshot("2026-03-31", vec![HoldingRecord::new("BAD CORP", "444444444", 5, -100)]);
        let err = classify(None, &cur).unwrap_err();
        assert!(matches!(
            err,
            InvalidSnapshotError::NegativeField { field: "value", .. }
        ));
    }
}
