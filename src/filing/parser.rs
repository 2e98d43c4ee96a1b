//! Extracts holdings from a complete 13F submission document

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ParsingSettings;
use crate::filing::xmltext::{collect_tag_blocks, find_tag_text, parse_int_loose};
use crate::model::HoldingRecord;

/// Markers that open the embedded XML information table
const XML_START_MARKERS: [&str; 4] = [
    "<?xml",
    "<XML>",
    "<informationTable",
    "<ns1:informationTable",
];

/// Markers that close it
const XML_END_MARKERS: [&str; 3] = ["</XML>", "</informationTable>", "</ns1:informationTable>"];

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("no information table found in filing")]
    MissingInformationTable,
}

/// Holdings extracted from one filing document
#[derive(Debug, Clone)]
pub struct ParsedFiling {
    /// Report date from the filing itself, when present
    pub report_date: Option<NaiveDate>,
    pub holdings: Vec<HoldingRecord>,
}

/// Parse a complete submission text file into holdings.
///
/// Positions under the minimum trackable value are dropped; zero-share lines
/// are exit notices, retained when the settings say so.
pub fn parse_filing(content: &str, settings: &ParsingSettings) -> Result<ParsedFiling, ParseError> {
    let xml = extract_xml_content(content).ok_or(ParseError::MissingInformationTable)?;

    let report_date = find_report_date(xml);

    let mut holdings = Vec::new();
    let mut dropped = 0usize;
    for block in collect_tag_blocks(xml, "infoTable") {
        match extract_holding(block, settings) {
            Some(holding) => holdings.push(holding),
            None => dropped += 1,
        }
    }

    debug!(
        holdings = holdings.len(),
        dropped,
        report_date = ?report_date,
        "Parsed information table"
    );

    Ok(ParsedFiling {
        report_date,
        holdings,
    })
}

/// Locate the XML portion of the submission text.
///
/// Submissions usually carry several XML blocks (the cover page, then the
/// information table); the span runs from the earliest open marker through
/// the last close marker so both stay visible.
fn extract_xml_content(content: &str) -> Option<&str> {
    let start = XML_START_MARKERS
        .iter()
        .filter_map(|marker| content.find(marker))
        .min()?;

    let end = XML_END_MARKERS
        .iter()
        .filter_map(|marker| {
            content[start..]
                .rfind(marker)
                .map(|i| start + i + marker.len())
        })
        .max()
        .unwrap_or_else(|| {
            warn!("No XML end marker found, using end of content");
            content.len()
        });

    Some(&content[start..end])
}

/// Report date: `periodOfReport` on modern filings, the calendar-quarter
/// field on older ones. Both MM-DD-YYYY and ISO dates occur in the wild.
fn find_report_date(xml: &str) -> Option<NaiveDate> {
    for tag in ["periodOfReport", "reportCalendarOrQuarter"] {
        if let Some(text) = find_tag_text(xml, tag) {
            for format in ["%m-%d-%Y", "%Y-%m-%d", "%m/%d/%Y"] {
                if let Ok(date) = NaiveDate::parse_from_str(&text, format) {
                    return Some(date);
                }
            }
            warn!(tag, text, "Unrecognized report date format");
        }
    }
    None
}

fn extract_holding(block: &str, settings: &ParsingSettings) -> Option<HoldingRecord> {
    let security_name = find_tag_text(block, "nameOfIssuer")?;
    let identifier_raw = find_tag_text(block, "cusip").unwrap_or_default();
    let shares = find_tag_text(block, "sshPrnamt")
        .map(|t| parse_int_loose(&t))
        .unwrap_or(0);
    let value = find_tag_text(block, "value")
        .map(|t| parse_int_loose(&t))
        .unwrap_or(0);
    let put_call = find_tag_text(block, "putCall");

    if shares == 0 && !settings.include_zero_positions {
        return None;
    }
    // zero-share lines are exit notices, exempt from the size floor
    if shares != 0 && value < settings.min_position_value {
        return None;
    }

    let mut holding = HoldingRecord::new(security_name, identifier_raw, shares, value);
    holding.put_call = put_call;
    Some(holding)
}
