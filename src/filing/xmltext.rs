//! Lenient tag scanning over EDGAR XML
//!
//! Filers wrap the information table in inconsistent namespace prefixes and
//! attribute noise; strict XML parsing rejects enough real filings that
//! extraction works on raw text, tolerant of prefixes, attributes, and
//! case differences in tag names.

/// Element name comparison ignoring namespace prefix and case
fn name_matches(found: &str, tag: &str) -> bool {
    let local = found.rsplit(':').next().unwrap_or(found);
    local.eq_ignore_ascii_case(tag)
}

/// Content span of the next `tag` element at or after `from`.
///
/// Returns (content_start, content_end, after_close). A self-closing element
/// yields an empty content span; an unterminated element is skipped.
fn next_element(input: &str, tag: &str, from: usize) -> Option<(usize, usize, usize)> {
    let mut at = from;

    while let Some(offset) = input[at..].find('<') {
        let open = at + offset;
        let rest = &input[open + 1..];

        // skip close tags, comments, processing instructions
        if rest.starts_with('/') || rest.starts_with('!') || rest.starts_with('?') {
            at = open + 1;
            continue;
        }

        let name_end = rest
            .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
            .unwrap_or(rest.len());
        let name = &rest[..name_end];

        if !name_matches(name, tag) {
            at = open + 1;
            continue;
        }

        let gt = match input[open..].find('>') {
            Some(i) => open + i,
            None => return None,
        };

        if input[..gt].ends_with('/') {
            // self-closing
            return Some((gt + 1, gt + 1, gt + 1));
        }

        let content_start = gt + 1;
        let mut search = content_start;
        while let Some(close_offset) = input[search..].find("</") {
            let close = search + close_offset;
            let close_gt = match input[close..].find('>') {
                Some(i) => close + i,
                None => break,
            };
            let close_name = input[close + 2..close_gt].trim();
            if name_matches(close_name, tag) {
                return Some((content_start, close, close_gt + 1));
            }
            search = close_gt + 1;
        }

        // no close tag; skip this opening and keep scanning
        at = gt + 1;
    }

    None
}

/// Trimmed text content of the first `tag` element, searching nested content
pub fn find_tag_text(input: &str, tag: &str) -> Option<String> {
    let (start, end, _) = next_element(input, tag, 0)?;
    let content = input[start..end].trim();
    // empty elements and elements wrapping further elements have no direct text
    if content.is_empty() || content.starts_with('<') {
        return None;
    }
    Some(content.to_string())
}

/// Raw content blocks of every `tag` element, in document order
pub fn collect_tag_blocks<'a>(input: &'a str, tag: &str) -> Vec<&'a str> {
    let mut blocks = Vec::new();
    let mut at = 0;
    while let Some((start, end, after)) = next_element(input, tag, at) {
        blocks.push(&input[start..end]);
        at = after;
    }
    blocks
}

/// Trimmed text content of every `tag` element, in document order
pub fn collect_tag_texts(input: &str, tag: &str) -> Vec<String> {
    collect_tag_blocks(input, tag)
        .into_iter()
        .map(|b| b.trim().to_string())
        .collect()
}

/// Parse a reported number, tolerating comma grouping, currency signs, and
/// surrounding whitespace. Unparseable text degrades to 0; a leading minus
/// is kept so malformed negative data stays visible downstream.
pub fn parse_int_loose(text: &str) -> i64 {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-')
        .collect();
    cleaned.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_tag_text_plain() {
        let xml = "<nameOfIssuer>APPLE INC</nameOfIssuer>";
        assert_eq!(find_tag_text(xml, "nameOfIssuer").unwrap(), "APPLE INC");
    }

    #[test]
    fn test_find_tag_text_with_namespace_prefix_and_attributes() {
        let xml = r#"<ns1:nameOfIssuer xmlns:ns1="urn:x">APPLE INC</ns1:nameOfIssuer>"#;
        assert_eq!(find_tag_text(xml, "nameOfIssuer").unwrap(), "APPLE INC");
    }

    #[test]
    fn test_find_tag_text_searches_nested_content() {
        let xml = "<shrsOrPrnAmt><sshPrnamt>1,000</sshPrnamt><sshPrnamtType>SH</sshPrnamtType></shrsOrPrnAmt>";
        assert_eq!(find_tag_text(xml, "sshPrnamt").unwrap(), "1,000");
    }

    #[test]
    fn test_collect_tag_blocks_in_order() {
        let xml = "<infoTable><a>1</a></infoTable> junk <ns1:infoTable><a>2</a></ns1:infoTable>";
        let blocks = collect_tag_blocks(xml, "infoTable");
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains('1'));
        assert!(blocks[1].contains('2'));
    }

    #[test]
    fn test_self_closing_and_unterminated_elements() {
        let xml = "<putCall/><value>5</value>";
        assert!(find_tag_text(xml, "putCall").is_none());
        assert_eq!(find_tag_text(xml, "value").unwrap(), "5");

        let broken = "<value>5";
        assert!(find_tag_text(broken, "value").is_none());
    }

    #[test]
    fn test_parse_int_loose() {
        assert_eq!(parse_int_loose("1,234,567"), 1_234_567);
        assert_eq!(parse_int_loose(" $42 "), 42);
        assert_eq!(parse_int_loose("-1,000"), -1000);
        assert_eq!(parse_int_loose("n/a"), 0);
        assert_eq!(parse_int_loose(""), 0);
    }
}
