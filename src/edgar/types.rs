//! EDGAR search result types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One filing located through the company browse endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilingRef {
    pub company_name: String,
    pub cik: String,
    /// EDGAR form type string, e.g. "13F-HR" or "13F-HR/A"
    pub filing_type: String,
    pub filing_url: String,
    /// Dashed accession number, e.g. "0001234567-26-000123"
    pub accession_number: String,
    /// Submission date reported by the search endpoint
    pub filing_date: Option<NaiveDate>,
}

/// Company metadata from the browse endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub cik: String,
    pub sic: Option<String>,
    pub business_description: Option<String>,
}
