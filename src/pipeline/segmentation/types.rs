use serde::{Deserialize, Serialize};

use crate::models::enums::SectionType;

/// How a section header was recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Direct,
    Contextual,
    Fallback,
}

/// A header candidate produced by one of the matching passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionMatch {
    pub section_type: SectionType,
    pub confidence: f32,
    pub pattern: String,
    pub kind: MatchKind,
}

/// Contiguous span of document text under one section type.
///
/// `start_line` is the header line, `end_line` is exclusive; the next
/// section's `start_line` equals this section's `end_line`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub section_type: SectionType,
    pub title_line: String,
    pub content: String,
    pub confidence: f32,
    pub matched_pattern: String,
    pub match_kind: MatchKind,
    pub start_line: usize,
    pub end_line: usize,
}
