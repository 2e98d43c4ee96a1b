//! Position identity matching across filings
//!
//! Holdings are keyed by a 9-character CUSIP, but amendment filings
//! occasionally leave the identifier blank or truncated. Matching falls back
//! to a normalized issuer name so the same position does not surface as a
//! spurious NEW/EXITED pair.

use std::fmt;

/// Expected length of a well-formed CUSIP
pub const CUSIP_LEN: usize = 9;

/// Canonical identity token for one security position
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchKey(String);

impl MatchKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonicalize a raw identifier for matching.
///
/// The identifier is stripped of whitespace and non-alphanumerics and
/// uppercased; a cleaned 9-character CUSIP is used directly. Anything else
/// (blank, truncated, malformed) falls back to the normalized security name.
pub fn normalize(identifier_raw: &str, security_name: &str) -> MatchKey {
    let cleaned: String = identifier_raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    if cleaned.len() == CUSIP_LEN {
        return MatchKey(cleaned);
    }

    MatchKey(normalize_name(security_name))
}

/// Uppercase, strip punctuation, collapse runs of whitespace to one space
fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;

    for c in name.chars() {
        if c.is_whitespace() {
            if !out.is_empty() {
                pending_space = true;
            }
        } else if c.is_alphanumeric() {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.extend(c.to_uppercase());
        }
        // punctuation is dropped
    }

    out
}
