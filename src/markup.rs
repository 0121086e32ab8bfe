//! Page-source cleanup and review extraction.
//!
//! The review site renders review bodies twice: as `plaidHtml` payloads
//! inside inline GraphQL JSON, and as text inside rendered content divs.
//! Extraction walks both and merges the results. Inline payloads arrive
//! JSON-escaped (`&`, `\"`, `\\`), and the embedded markup is known to
//! carry truncated `\uXX` sequences that break naive decoders, so the raw
//! source goes through a scrub/decode/unescape pass before DOM parsing.

use regex::Regex;
use scraper::{Html, Selector};

use crate::types::ReelError;

/// Marker pattern for review bodies embedded in the page's inline JSON.
const INLINE_REVIEW_PATTERN: &str = r#""plaidHtml":"(.*?)","__typename":"Markdown""#;

/// Class of the rendered divs that carry review text.
const REVIEW_DIV_CLASS: &str = "ipc-html-content-inner-div";

/// Removes `\u` escape markers whose hex payload is malformed.
///
/// A marker followed by exactly four hex digits is kept for
/// [`decode_unicode_escapes`]; anything shorter is dropped together with its
/// partial digits so decoding never trips over it.
pub fn scrub_malformed_unicode_escapes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] == '\\' && i + 1 < chars.len() && matches!(chars[i + 1], 'u' | 'U') {
            let hex_len = chars[i + 2..]
                .iter()
                .take(4)
                .take_while(|c| c.is_ascii_hexdigit())
                .count();
            if hex_len < 4 {
                // drop the marker and its partial digits
                i += 2 + hex_len;
                continue;
            }
        }
        out.push(chars[i]);
        i += 1;
    }
    out
}

/// Decodes backslash escape sequences into their characters.
///
/// Handles `\uXXXX` (pairing surrogates, silently dropping unpairable ones)
/// plus the common single-character escapes (`\\`, `\"`, `\'`, `\n`, `\t`,
/// `\r`). Anything else passes through verbatim.
pub fn decode_unicode_escapes(input: &str) -> String {
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        match chars.get(i + 1) {
            Some('\\') => {
                out.push('\\');
                i += 2;
            }
            Some('"') => {
                out.push('"');
                i += 2;
            }
            Some('\'') => {
                out.push('\'');
                i += 2;
            }
            Some('n') => {
                out.push('\n');
                i += 2;
            }
            Some('t') => {
                out.push('\t');
                i += 2;
            }
            Some('r') => {
                out.push('\r');
                i += 2;
            }
            Some('u') | Some('U') => match parse_hex4(&chars, i + 2) {
                Some(unit) => {
                    i += 6;
                    if (0xD800..0xDC00).contains(&unit) {
                        // high surrogate: only usable with a low surrogate
                        // escape immediately after it
                        if chars.get(i) == Some(&'\\')
                            && matches!(chars.get(i + 1), Some('u') | Some('U'))
                        {
                            if let Some(low) = parse_hex4(&chars, i + 2) {
                                if (0xDC00..0xE000).contains(&low) {
                                    let combined = 0x10000
                                        + ((u32::from(unit) - 0xD800) << 10)
                                        + (u32::from(low) - 0xDC00);
                                    if let Some(ch) = char::from_u32(combined) {
                                        out.push(ch);
                                    }
                                    i += 6;
                                }
                            }
                        }
                        // unpairable high surrogate: dropped
                    } else if (0xDC00..0xE000).contains(&unit) {
                        // stray low surrogate: dropped
                    } else if let Some(ch) = char::from_u32(u32::from(unit)) {
                        out.push(ch);
                    }
                }
                None => {
                    out.push('\\');
                    i += 1;
                }
            },
            _ => {
                out.push('\\');
                i += 1;
            }
        }
    }
    out
}

fn parse_hex4(chars: &[char], start: usize) -> Option<u16> {
    if start + 4 > chars.len() {
        return None;
    }
    let mut value: u16 = 0;
    for &c in &chars[start..start + 4] {
        let digit = c.to_digit(16)?;
        value = value * 16 + digit as u16;
    }
    Some(value)
}

/// Cleans raw page source for DOM parsing.
///
/// Order matters: malformed escapes must go before decoding or the decode
/// pass trips over them, and escape decoding must precede entity unescaping
/// to avoid double-decoding artifacts.
pub fn preprocess(input: &str) -> String {
    let scrubbed = scrub_malformed_unicode_escapes(input);
    let decoded = decode_unicode_escapes(&scrubbed);
    let decoded = decoded.replace("\\u0026", "&");
    html_escape::decode_html_entities(&decoded).into_owned()
}

/// Captures `plaidHtml` payloads out of the raw page source.
pub fn extract_inline_reviews(raw: &str) -> Result<Vec<String>, ReelError> {
    let pattern =
        Regex::new(INLINE_REVIEW_PATTERN).map_err(|err| ReelError::Markup(err.to_string()))?;
    Ok(pattern
        .captures_iter(raw)
        .map(|captures| preprocess(&captures[1]))
        .collect())
}

/// Collects the text of every rendered review div in preprocessed markup.
pub fn extract_rendered_reviews(preprocessed: &str) -> Result<Vec<String>, ReelError> {
    let selector = Selector::parse(&format!("div.{REVIEW_DIV_CLASS}"))
        .map_err(|err| ReelError::Markup(err.to_string()))?;
    let document = Html::parse_document(preprocessed);
    Ok(document
        .select(&selector)
        .map(|div| div.text().collect::<String>())
        .collect())
}

/// Runs both extraction passes over one page capture and merges the results,
/// deduplicating by exact string equality while preserving first-seen order.
pub fn collect_reviews(page_source: &str) -> Result<Vec<String>, ReelError> {
    let mut merged = extract_inline_reviews(page_source)?;
    merged.extend(extract_rendered_reviews(&preprocess(page_source))?);

    let mut seen = std::collections::HashSet::new();
    merged.retain(|review| seen.insert(review.clone()));
    Ok(merged)
}
