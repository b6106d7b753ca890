//! Value normalisation shared by the extractors and the suggestion engine.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

static ISO_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static CANONICAL_PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d{3}\) \d{3}-\d{4}$").unwrap());

/// Parse a date written in any of the common referral formats.
///
/// US numeric order is tried before day-first: referral forms are
/// predominantly US.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim().trim_end_matches('.');
    if trimmed.is_empty() {
        return None;
    }

    const FORMATS: &[&str] = &[
        "%Y-%m-%d",
        "%m/%d/%Y",
        "%m-%d-%Y",
        "%d/%m/%Y",
        "%Y/%m/%d",
        "%B %d, %Y",
        "%b %d, %Y",
        "%B %d %Y",
        "%d %B %Y",
        "%d %b %Y",
    ];

    FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

pub fn is_iso_date(text: &str) -> bool {
    ISO_DATE.is_match(text.trim())
}

/// `YYYY-MM-DD` form of a parseable date.
pub fn iso_date(text: &str) -> Option<String> {
    parse_date(text).map(|d| d.format("%Y-%m-%d").to_string())
}

/// "JANE  doe" → "Jane Doe". Hyphen and apostrophe parts are capitalised too.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut out = String::with_capacity(word.len());
            let mut start = true;
            for ch in word.chars() {
                if start {
                    out.extend(ch.to_uppercase());
                } else {
                    out.extend(ch.to_lowercase());
                }
                start = ch == '-' || ch == '\'';
            }
            out
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn is_title_case(text: &str) -> bool {
    !text.trim().is_empty() && title_case(text) == text.trim()
}

/// `(xxx) xxx-xxxx` for ten-digit numbers (a leading country code 1 is
/// dropped). Other lengths are not reformatted.
pub fn format_phone(text: &str) -> Option<String> {
    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    let digits = match digits.len() {
        11 if digits.starts_with('1') => &digits[1..],
        10 => digits.as_str(),
        _ => return None,
    };
    Some(format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]))
}

pub fn is_canonical_phone(text: &str) -> bool {
    CANONICAL_PHONE.is_match(text.trim())
}

/// Lowercase, whitespace-collapsed form used for value comparison.
pub fn comparable(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}
