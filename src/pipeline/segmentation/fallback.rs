//! Last-resort header matching, run only when the strategy enables it.
//!
//! The detector carries no matcher by default; callers opt in with
//! `SectionDetector::with_fallback`.

use super::types::{MatchKind, SectionMatch};
use crate::models::enums::SectionType;

/// Matcher consulted after the direct and contextual passes found nothing.
pub trait FallbackMatcher: Send + Sync {
    /// `line` is the trimmed, lowercased candidate; `raw_lines` is the
    /// whole document so implementations can look around `index`.
    fn match_line(&self, line: &str, index: usize, raw_lines: &[&str]) -> Option<SectionMatch>;
}

/// Confidence of a heading-shape match.
pub const HEADING_SHAPE_CONFIDENCE: f32 = 0.35;

/// Longest line still treated as a heading.
const MAX_HEADING_CHARS: usize = 60;

/// Recognizes an upper-case, short line that contains a section label,
/// e.g. `"PATIENT MOBILITY / TRANSFERS"`.
#[derive(Debug, Clone, Default)]
pub struct HeadingShapeFallback;

impl FallbackMatcher for HeadingShapeFallback {
    fn match_line(&self, line: &str, index: usize, raw_lines: &[&str]) -> Option<SectionMatch> {
        let raw = raw_lines.get(index)?.trim();
        if raw.is_empty() || raw.chars().count() > MAX_HEADING_CHARS || !is_upper_heading(raw) {
            return None;
        }

        SectionType::all()
            .iter()
            .find(|section| line.contains(section.label()))
            .map(|section| SectionMatch {
                section_type: *section,
                confidence: HEADING_SHAPE_CONFIDENCE,
                pattern: section.label().to_string(),
                kind: MatchKind::Fallback,
            })
    }
}

/// At least one letter, and no lower-case letters.
fn is_upper_heading(raw: &str) -> bool {
    raw.chars().any(char::is_alphabetic) && !raw.chars().any(char::is_lowercase)
}
