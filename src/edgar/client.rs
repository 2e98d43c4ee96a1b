//! SEC EDGAR HTTP client
//!
//! EDGAR requires a descriptive User-Agent with contact information and asks
//! automated clients to stay under 10 requests per second; every request
//! path here pauses for the configured delay after completing.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::EdgarSettings;
use crate::edgar::types::{CompanyInfo, FilingRef};
use crate::filing::{collect_tag_blocks, collect_tag_texts, find_tag_text};

pub struct EdgarClient {
    client: reqwest::Client,
    search_url: String,
    archives_url: String,
    delay: Duration,
    retry_attempts: usize,
}

impl EdgarClient {
    pub fn new(settings: &EdgarSettings) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xml,application/xhtml+xml,text/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .default_headers(headers)
            .build()
            .context("Failed to build EDGAR HTTP client")?;

        Ok(Self {
            client,
            search_url: settings.search_url.clone(),
            archives_url: settings.base_url.trim_end_matches('/').to_string(),
            delay: Duration::from_millis(settings.rate_limit_delay_ms),
            retry_attempts: settings.retry_attempts.max(1),
        })
    }

    /// Search the company browse endpoint for filings of the given types
    /// within the last `days_back` days. A failed search for one filing type
    /// is logged and skipped rather than failing the whole search.
    pub async fn search_filings(
        &self,
        term: &str,
        filing_types: &[String],
        days_back: u32,
    ) -> Result<Vec<FilingRef>> {
        debug!(term, "Searching for filings");

        let mut filings = Vec::new();
        for filing_type in filing_types {
            match self.search_filing_type(term, filing_type, days_back).await {
                Ok(mut found) => filings.append(&mut found),
                Err(e) => warn!(term, filing_type, "Filing search failed: {e:#}"),
            }
            self.throttle().await;
        }

        info!("Found {} filings for {}", filings.len(), term);
        Ok(filings)
    }

    async fn search_filing_type(
        &self,
        term: &str,
        filing_type: &str,
        days_back: u32,
    ) -> Result<Vec<FilingRef>> {
        let today = Utc::now().date_naive();
        let from = today - chrono::Duration::days(i64::from(days_back));
        let dateb = today.format("%Y%m%d").to_string();
        let datea = from.format("%Y%m%d").to_string();

        let params = [
            ("action", "getcompany"),
            ("company", term),
            ("type", filing_type),
            ("dateb", dateb.as_str()),
            ("datea", datea.as_str()),
            ("owner", "exclude"),
            ("output", "xml"),
            ("count", "100"),
        ];

        let body = self
            .client
            .get(&self.search_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        Ok(parse_search_results(&body, filing_type))
    }

    /// Download the complete submission text file for a filing, with bounded
    /// retries spaced by the rate-limit delay.
    pub async fn download_filing(&self, filing: &FilingRef) -> Result<String> {
        let url = self.filing_document_url(filing)?;
        debug!(accession = %filing.accession_number, url, "Downloading filing");

        let mut last_error = anyhow!("no download attempts made");
        for attempt in 1..=self.retry_attempts {
            match self.fetch_text(&url).await {
                Ok(text) => {
                    self.throttle().await;
                    info!(
                        "Downloaded filing {} ({} bytes)",
                        filing.accession_number,
                        text.len()
                    );
                    return Ok(text);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        accession = %filing.accession_number,
                        "Filing download failed: {e:#}"
                    );
                    last_error = e;
                    tokio::time::sleep(self.delay).await;
                }
            }
        }

        Err(last_error.context(format!(
            "Failed to download filing {}",
            filing.accession_number
        )))
    }

    /// Company metadata lookup by CIK
    pub async fn company_info(&self, cik: &str) -> Result<CompanyInfo> {
        let params = [("action", "getcompany"), ("CIK", cik), ("output", "xml")];

        let body = self
            .client
            .get(&self.search_url)
            .query(&params)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        self.throttle().await;

        let name = find_tag_text(&body, "companyName")
            .ok_or_else(|| anyhow!("No company record for CIK {cik}"))?;
        Ok(CompanyInfo {
            name,
            cik: find_tag_text(&body, "CIK").unwrap_or_else(|| cik.to_string()),
            sic: find_tag_text(&body, "assignedSic"),
            business_description: find_tag_text(&body, "businessDescription"),
        })
    }

    fn filing_document_url(&self, filing: &FilingRef) -> Result<String> {
        let compact: String = filing
            .accession_number
            .chars()
            .filter(|c| c.is_ascii_digit())
            .collect();
        if compact.len() != 18 {
            return Err(anyhow!(
                "Malformed accession number: {}",
                filing.accession_number
            ));
        }
        let cik = filing.cik.trim_start_matches('0');
        if cik.is_empty() {
            return Err(anyhow!("Filing {} has no CIK", filing.accession_number));
        }
        Ok(format!(
            "{}/{}/{}/{}.txt",
            self.archives_url, cik, compact, filing.accession_number
        ))
    }

    async fn fetch_text(&self, url: &str) -> Result<String> {
        let text = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(text)
    }

    async fn throttle(&self) {
        tokio::time::sleep(self.delay).await;
    }
}

/// Parse the browse endpoint's XML output into filing references. Each
/// `companyInfo` block lists `filingHREF` entries with sibling `dateFiled`
/// elements; entries without a recognizable accession number are skipped.
fn parse_search_results(xml: &str, filing_type: &str) -> Vec<FilingRef> {
    let mut filings = Vec::new();

    for company in collect_tag_blocks(xml, "companyInfo") {
        let company_name = find_tag_text(company, "companyName").unwrap_or_default();
        let cik = find_tag_text(company, "CIK").unwrap_or_default();

        let hrefs = collect_tag_texts(company, "filingHREF");
        let dates = collect_tag_texts(company, "dateFiled");

        for (i, href) in hrefs.into_iter().enumerate() {
            let Some(accession_number) = accession_from_url(&href) else {
                debug!(href, "No accession number in filing URL, skipping");
                continue;
            };
            let filing_date = dates.get(i).and_then(|d| d.parse().ok());

            filings.push(FilingRef {
                company_name: company_name.clone(),
                cik: cik.clone(),
                filing_type: filing_type.to_string(),
                filing_url: href,
                accession_number,
                filing_date,
            });
        }
    }

    filings
}

/// Pull the accession number out of a filing URL path segment, accepting
/// both dashed and compact forms, and normalize to the dashed form.
fn accession_from_url(url: &str) -> Option<String> {
    for segment in url.split('/') {
        let candidate = segment
            .trim_end_matches("-index.htm")
            .trim_end_matches("-index.html")
            .trim_end_matches(".txt");
        if candidate.is_empty() {
            continue;
        }
        let all_accession_chars = candidate.chars().all(|c| c.is_ascii_digit() || c == '-');
        let digits = candidate.chars().filter(|c| c.is_ascii_digit()).count();
        if all_accession_chars && digits == 18 {
            return Some(format_accession(candidate));
        }
    }
    None
}

fn format_accession(raw: &str) -> String {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    format!("{}-{}-{}", &digits[..10], &digits[10..12], &digits[12..])
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_XML: &str = r#"
<companyFilings>
  <companyInfo>
    <companyName>SITUATIONAL AWARENESS LP</companyName>
    <CIK>0002030845</CIK>
    <filing>
      <dateFiled>2026-05-15</dateFiled>
      <filingHREF>https://www.sec.gov/Archives/edgar/data/2030845/000203084526000004/0002030845-26-000004-index.htm</filingHREF>
      <type>13F-HR</type>
    </filing>
    <filing>
      <dateFiled>2026-02-14</dateFiled>
      <filingHREF>https://www.sec.gov/Archives/edgar/data/2030845/000203084526000002/0002030845-26-000002-index.htm</filingHREF>
      <type>13F-HR</type>
    </filing>
  </companyInfo>
</companyFilings>
"#;

    #[test]
    fn test_parse_search_results() {
        let filings = parse_search_results(SEARCH_XML, "13F-HR");
        assert_eq!(filings.len(), 2);

        let first = &filings[0];
        assert_eq!(first.company_name, "SITUATIONAL AWARENESS LP");
        assert_eq!(first.cik, "0002030845");
        assert_eq!(first.accession_number, "0002030845-26-000004");
        assert_eq!(first.filing_date, Some("2026-05-15".parse().unwrap()));
        assert_eq!(first.filing_type, "13F-HR");
    }

    #[test]
    fn test_accession_from_url_accepts_dashed_and_compact_segments() {
        let dashed = "https://x/Archives/edgar/data/123/000203084526000004/0002030845-26-000004-index.htm";
        assert_eq!(
            accession_from_url(dashed).unwrap(),
            "0002030845-26-000004"
        );

        let compact = "https://x/Archives/edgar/data/123/000203084526000004";
        assert_eq!(
            accession_from_url(compact).unwrap(),
            "0002030845-26-000004"
        );

        assert!(accession_from_url("https://x/data/123/short").is_none());
    }

    #[test]
    fn test_filing_document_url() {
        let client = EdgarClient::new(&EdgarSettings::default()).unwrap();
        let filing = FilingRef {
            company_name: String::new(),
            cik: "0002030845".to_string(),
            filing_type: "13F-HR".to_string(),
            filing_url: String::new(),
            accession_number: "0002030845-26-000004".to_string(),
            filing_date: None,
        };

        let url = client.filing_document_url(&filing).unwrap();
        assert_eq!(
            url,
            "https://www.sec.gov/Archives/edgar/data/2030845/000203084526000004/0002030845-26-000004.txt"
        );
    }
}
