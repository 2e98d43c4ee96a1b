//! Human-readable message rendering
//!
//! Pure string building over classification results; dispatch lives in the
//! sibling module. Messages are Markdown, shared verbatim between GitHub
//! issues and Slack.

use chrono::Utc;

use crate::diff::ClassificationResult;
use crate::edgar::FilingRef;
use crate::model::{Classification, FilingSnapshot, HoldingRecord};

/// Holdings listed in the "Top Holdings" section of a filing message
const TOP_HOLDINGS: usize = 5;

/// Largest position changes called out in a classification summary
const TOP_MOVES: usize = 3;

/// Digit-grouped rendering, e.g. 1234567 -> "1,234,567"
pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if value < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}

/// Signed dollar rendering with an explicit plus for gains
pub fn signed_dollars(value: i64) -> String {
    if value > 0 {
        format!("+${}", format_thousands(value))
    } else if value < 0 {
        format!("-${}", format_thousands(-value))
    } else {
        "$0".to_string()
    }
}

fn signed_count(value: i64) -> String {
    if value > 0 {
        format!("+{}", format_thousands(value))
    } else {
        format_thousands(value)
    }
}

/// Render a classification result as summary text: the comparison baseline,
/// per-classification counts, the total value change, and the largest moves.
pub fn classification_summary(result: &ClassificationResult) -> String {
    let baseline = match result.previous_filing_date {
        Some(date) => format!("vs {date}"),
        None => "first tracked filing".to_string(),
    };

    let mut out = format!("**Position Changes ({baseline}):**\n");
    out.push_str(&format!(
        "- NEW: {} | INCREASED: {} | DECREASED: {} | EXITED: {} | UNCHANGED: {}\n",
        result.count(Classification::New),
        result.count(Classification::Increased),
        result.count(Classification::Decreased),
        result.count(Classification::Exited),
        result.count(Classification::Unchanged),
    ));
    out.push_str(&format!(
        "- **Total Value Change:** {}\n",
        signed_dollars(result.total_value_delta)
    ));

    let mut movers: Vec<&HoldingRecord> = result.changed_holdings().collect();
    movers.sort_by_key(|h| std::cmp::Reverse(h.delta_value.unwrap_or(0).abs()));
    for holding in movers.iter().take(TOP_MOVES) {
        let classification = holding
            .classification
            .map(|c| c.to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "- {} **{}**: {} shares ({})\n",
            classification,
            holding.security_name,
            signed_count(holding.delta_shares.unwrap_or(0)),
            signed_dollars(holding.delta_value.unwrap_or(0)),
        ));
    }

    out
}

/// Full filing notification message
pub fn filing_message(
    fund_name: &str,
    filing: &FilingRef,
    snapshot: &FilingSnapshot,
    result: &ClassificationResult,
) -> String {
    let mut message = format!(
        "\u{1F4CA} **New 13F Filing: {fund_name}**\n\n\
         **Filing Details:**\n\
         - **Report Date:** {}\n\
         - **Type:** {}\n\
         - **Accession Number:** {}\n\n\
         **Portfolio Summary:**\n\
         - **Total Value:** ${}\n\
         - **Holdings Count:** {}\n\n",
        snapshot.filing_date,
        filing.filing_type,
        filing.accession_number,
        format_thousands(snapshot.total_value),
        snapshot.holdings_count(),
    );

    message.push_str(&classification_summary(result));

    message.push_str("\n**Top Holdings:**\n");
    let mut by_value: Vec<&HoldingRecord> = snapshot.holdings.iter().collect();
    by_value.sort_by_key(|h| std::cmp::Reverse(h.value));
    for (i, holding) in by_value.iter().take(TOP_HOLDINGS).enumerate() {
        message.push_str(&format!(
            "{}. **{}** - ${} ({} shares)\n",
            i + 1,
            holding.security_name,
            format_thousands(holding.value),
            format_thousands(holding.shares),
        ));
    }
    if snapshot.holdings_count() > TOP_HOLDINGS {
        message.push_str(&format!(
            "\n... and {} more holdings\n",
            snapshot.holdings_count() - TOP_HOLDINGS
        ));
    }

    message.push_str(&format!("\n**Processed:** {}\n", Utc::now().to_rfc3339()));
    message
}

/// One fund's outcome in a scheduled run
#[derive(Debug, Clone)]
pub struct FundRunOutcome {
    pub fund_name: String,
    pub filings_found: usize,
    pub filings_processed: usize,
    pub failed: bool,
}

/// Summary message covering every fund in one scheduled run
pub fn run_summary_message(outcomes: &[FundRunOutcome]) -> String {
    let processed: usize = outcomes.iter().map(|o| o.filings_processed).sum();

    let mut message = format!(
        "\u{1F4C8} **13F Tracker Run Summary - {}**\n\n\
         **Overview:**\n\
         - **Filings Processed:** {}\n\
         - **Funds Monitored:** {}\n\n\
         **Funds:**\n",
        Utc::now().format("%Y-%m-%d"),
        processed,
        outcomes.len(),
    );

    if outcomes.is_empty() {
        message.push_str("- No funds configured\n");
    }
    for outcome in outcomes {
        if outcome.failed {
            message.push_str(&format!("- **{}**: run failed\n", outcome.fund_name));
        } else if outcome.filings_processed == 0 {
            message.push_str(&format!("- **{}**: no new filings\n", outcome.fund_name));
        } else {
            message.push_str(&format!(
                "- **{}**: {} new filing(s)\n",
                outcome.fund_name, outcome.filings_processed
            ));
        }
    }

    message.push_str(&format!("\n**Generated:** {}\n", Utc::now().to_rfc3339()));
    message
}

/// Error notification body
pub fn error_message(context: &str, error: &str) -> String {
    format!(
        "\u{274C} **13F Tracker Error**\n\n{context}\n\n```\n{error}\n```\n\nTime: {}\n",
        Utc::now().to_rfc3339()
    )
}

/// Body used by the test-notify command
pub fn test_message() -> String {
    format!(
        "\u{1F9EA} **13F Tracker Notification Test**\n\n\
         This is a test message to verify that all notification channels are\n\
         working correctly.\n\n\
         **Test Time:** {}\n",
        Utc::now().to_rfc3339()
    )
}
