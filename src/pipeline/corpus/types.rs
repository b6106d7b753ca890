use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::fallback;
use crate::models::enums::SectionType;

/// A literal header signal for one section type.
///
/// `confidence` carries the owning section's average statistic, not a
/// per-pattern discriminative score. Two patterns are equal when their
/// text is equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub text: String,
    pub confidence: f32,
    pub frequency: u32,
}

impl Pattern {
    pub fn new(text: impl Into<String>, confidence: f32, frequency: u32) -> Self {
        Self {
            text: text.into(),
            confidence,
            frequency,
        }
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text
    }
}

impl Eq for Pattern {}

/// Aggregate confidence statistic for one section type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionStats {
    pub section_type: SectionType,
    pub min: f32,
    pub max: f32,
    pub avg: f32,
}

impl SectionStats {
    /// Used when no labeled confidence was ever observed for a section.
    pub fn neutral(section_type: SectionType) -> Self {
        Self {
            section_type,
            min: 0.4,
            max: 0.8,
            avg: 0.6,
        }
    }
}

/// Patterns seen just before or just after a true section header.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContextualPatternSet {
    pub before: Vec<Pattern>,
    pub after: Vec<Pattern>,
}

/// Immutable table of header patterns, statistics and contextual patterns.
///
/// Keyed by `BTreeMap<SectionType, _>` so iteration follows the
/// `SectionType` declaration order and serialization is byte-stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternCorpus {
    pub sections: BTreeMap<SectionType, Vec<Pattern>>,
    pub stats: BTreeMap<SectionType, SectionStats>,
    pub contextual: BTreeMap<SectionType, ContextualPatternSet>,
}

impl PatternCorpus {
    /// Corpus holding only the hand-authored fallback patterns.
    pub fn manual() -> Self {
        let mut corpus = Self::default();
        for &section in SectionType::all() {
            let stats = SectionStats::neutral(section);
            corpus.sections.insert(section, fallback::header_patterns(section));
            corpus.stats.insert(section, stats);
            corpus.contextual.insert(
                section,
                ContextualPatternSet {
                    before: fallback::before_patterns(section),
                    after: fallback::after_patterns(section),
                },
            );
        }
        corpus
    }

    pub fn patterns(&self, section: SectionType) -> &[Pattern] {
        self.sections.get(&section).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn stats_for(&self, section: SectionType) -> Option<&SectionStats> {
        self.stats.get(&section)
    }

    pub fn contextual_for(&self, section: SectionType) -> Option<&ContextualPatternSet> {
        self.contextual.get(&section)
    }

    pub fn pattern_count(&self) -> usize {
        self.sections.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pattern_count() == 0
    }
}

/// Insert `pattern` into `list`, keeping the highest frequency when the
/// text is already present.
pub fn merge_pattern(list: &mut Vec<Pattern>, pattern: Pattern) {
    match list.iter_mut().find(|p| p.text == pattern.text) {
        Some(existing) => {
            if pattern.frequency > existing.frequency {
                *existing = pattern;
            }
        }
        None => list.push(pattern),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_equality_is_by_text() {
        assert_eq!(Pattern::new("mobility", 0.5, 3), Pattern::new("mobility", 0.9, 40));
        assert_ne!(Pattern::new("mobility", 0.5, 3), Pattern::new("gait", 0.5, 3));
    }

    #[test]
    fn merge_keeps_highest_frequency() {
        let mut list = vec![Pattern::new("medical history", 0.6, 4)];
        merge_pattern(&mut list, Pattern::new("medical history", 0.6, 9));
        merge_pattern(&mut list, Pattern::new("medical history", 0.6, 2));
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].frequency, 9);
    }

    #[test]
    fn manual_corpus_covers_every_section() {
        let corpus = PatternCorpus::manual();
        for section in SectionType::all() {
            assert!(!corpus.patterns(*section).is_empty(), "{section} has no patterns");
            assert!(corpus.stats_for(*section).is_some());
        }
        assert!(!corpus.is_empty());
    }

    #[test]
    fn missing_section_yields_empty_slice() {
        let corpus = PatternCorpus::default();
        assert!(corpus.patterns(SectionType::Goals).is_empty());
        assert!(corpus.is_empty());
    }
}
