//! Line-by-line section segmentation driven by the pattern corpus.
//!
//! Each non-blank line is tested as a potential header with up to three
//! passes, always in this order: direct (the line is, or starts with, a
//! corpus pattern), contextual (a heading-shaped line whose neighbour
//! contains a before/after pattern) and an optional fallback matcher. A
//! header closes the open section and starts a new one; every other line is
//! appended to the open section. Lines before the first header belong to no
//! section.

use std::sync::{Arc, LazyLock};

use regex::{Regex, RegexBuilder};

use super::confidence::{clamp_unit, contextual_match_confidence, direct_match_confidence};
use super::fallback::FallbackMatcher;
use super::types::{MatchKind, Section, SectionMatch};
use crate::models::enums::{PatternPriority, SectionType};
use crate::pipeline::corpus::{Pattern, PatternCorpus, SectionStats};
use crate::pipeline::strategy::Strategy;

/// Candidate lines this long or longer are never contextual headers.
pub const MAX_CONTEXT_CANDIDATE_CHARS: usize = 100;

static NUMERIC_LINE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^page \d+$").unwrap());
static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*•–]|\d+[.)]|[a-z][.)]\s)").unwrap());

/// Contextual candidates with more words than this read as prose.
pub const MAX_HEADING_WORDS: usize = 6;

/// Lowercase words allowed inside a title-case heading.
const MINOR_WORDS: &[&str] = &["a", "an", "and", "at", "by", "for", "in", "of", "on", "or", "the", "to", "with"];

/// Whether `line` could stand alone as a heading: not a list item, not a
/// `label: value` pair, no sentence punctuation at the end, few words, and
/// either upper case or title case.
pub fn is_heading_shaped(line: &str) -> bool {
    let line = line.trim();
    if line.is_empty() || LIST_MARKER.is_match(line) || line.ends_with(['.', ',', ';']) {
        return false;
    }
    if line
        .split_once(':')
        .is_some_and(|(_, value)| !value.trim().is_empty())
    {
        return false;
    }

    let words: Vec<&str> = line.split_whitespace().collect();
    if words.len() > MAX_HEADING_WORDS || !line.chars().any(char::is_alphabetic) {
        return false;
    }
    if !line.chars().any(char::is_lowercase) {
        return true;
    }
    words.iter().enumerate().all(|(i, word)| {
        match word.chars().next() {
            Some(c) if c.is_alphabetic() => {
                c.is_uppercase() || (i > 0 && MINOR_WORDS.contains(&word.to_lowercase().as_str()))
            }
            _ => true,
        }
    })
}

/// A corpus pattern prepared for matching against lowercased lines.
struct CompiledPattern {
    text: String,
    confidence: f32,
    frequency: u32,
    prefixes: [String; 3],
    numbered: Option<Regex>,
}

impl CompiledPattern {
    fn compile(pattern: &Pattern) -> Option<Self> {
        let text = pattern.text.trim().to_lowercase();
        if text.is_empty() {
            return None;
        }

        let numbered = RegexBuilder::new(&format!(r"^\d+\.?\s*{}", regex::escape(&text)))
            .case_insensitive(true)
            .build()
            .map_err(|e| tracing::warn!(pattern = %text, error = %e, "Numbered header form disabled"))
            .ok();

        Some(Self {
            prefixes: [format!("{text}:"), format!("{text} -"), format!("{text}-")],
            text,
            confidence: pattern.confidence,
            frequency: pattern.frequency,
            numbered,
        })
    }

    fn matches(&self, line: &str) -> bool {
        line == self.text
            || self.prefixes.iter().any(|p| line.starts_with(p.as_str()))
            || self.numbered.as_ref().is_some_and(|re| re.is_match(line))
    }
}

#[derive(Clone, Copy)]
enum ContextSide {
    Before,
    After,
}

/// Lowercased contextual pattern.
struct ContextPattern {
    text: String,
    confidence: f32,
}

fn compile_context(patterns: &[Pattern]) -> Vec<ContextPattern> {
    patterns
        .iter()
        .map(|p| ContextPattern {
            text: p.text.trim().to_lowercase(),
            confidence: p.confidence,
        })
        .filter(|p| !p.text.is_empty())
        .collect()
}

struct CompiledSection {
    section_type: SectionType,
    stats: Option<SectionStats>,
    patterns: Vec<CompiledPattern>,
    before: Vec<ContextPattern>,
    after: Vec<ContextPattern>,
}

/// Section being accumulated during a scan.
struct OpenSection<'a> {
    header: SectionMatch,
    title_line: String,
    start_line: usize,
    body: Vec<&'a str>,
}

impl OpenSection<'_> {
    fn close(self, end_line: usize) -> Section {
        Section {
            section_type: self.header.section_type,
            title_line: self.title_line,
            content: self.body.join("\n").trim().to_string(),
            confidence: clamp_unit(self.header.confidence),
            matched_pattern: self.header.pattern,
            match_kind: self.header.kind,
            start_line: self.start_line,
            end_line,
        }
    }
}

/// Segments extracted text into typed sections.
///
/// Holds the corpus behind an `Arc`; the detector itself is immutable and
/// can be shared across threads.
pub struct SectionDetector {
    corpus: Arc<PatternCorpus>,
    sections: Vec<CompiledSection>,
    fallback: Option<Box<dyn FallbackMatcher>>,
}

impl SectionDetector {
    pub fn new(corpus: Arc<PatternCorpus>) -> Self {
        let sections = SectionType::all()
            .iter()
            .filter_map(|&section_type| {
                let patterns: Vec<CompiledPattern> = corpus
                    .patterns(section_type)
                    .iter()
                    .filter_map(CompiledPattern::compile)
                    .collect();
                let (before, after) = corpus
                    .contextual_for(section_type)
                    .map(|ctx| (compile_context(&ctx.before), compile_context(&ctx.after)))
                    .unwrap_or_default();

                if patterns.is_empty() && before.is_empty() && after.is_empty() {
                    return None;
                }

                Some(CompiledSection {
                    section_type,
                    stats: corpus.stats_for(section_type).copied(),
                    patterns,
                    before,
                    after,
                })
            })
            .collect();

        Self {
            corpus,
            sections,
            fallback: None,
        }
    }

    /// Install the matcher used when `Strategy::fallback_enabled` is set.
    pub fn with_fallback(mut self, matcher: Box<dyn FallbackMatcher>) -> Self {
        self.fallback = Some(matcher);
        self
    }

    pub fn corpus(&self) -> &PatternCorpus {
        &self.corpus
    }

    /// Split `text` into sections. Empty input yields no sections.
    pub fn detect(&self, text: &str, strategy: &Strategy) -> Vec<Section> {
        if text.trim().is_empty() {
            tracing::warn!("Section detection skipped: empty input text");
            return Vec::new();
        }

        let raw_lines: Vec<&str> = text.lines().collect();
        let mut sections = Vec::new();
        let mut open: Option<OpenSection<'_>> = None;

        for (index, raw) in raw_lines.iter().copied().enumerate() {
            match self.detect_section_start(index, &raw_lines, strategy) {
                Some(header) => {
                    if let Some(previous) = open.take() {
                        sections.push(previous.close(index));
                    }
                    open = Some(OpenSection {
                        header,
                        title_line: raw.trim().to_string(),
                        start_line: index,
                        body: Vec::new(),
                    });
                }
                None => {
                    if let Some(current) = open.as_mut() {
                        current.body.push(raw);
                    }
                }
            }
        }

        if let Some(last) = open.take() {
            sections.push(last.close(raw_lines.len()));
        }

        tracing::debug!(
            lines = raw_lines.len(),
            sections = sections.len(),
            "Section detection complete"
        );
        sections
    }

    /// Decide whether line `index` opens a new section.
    pub fn detect_section_start(
        &self,
        index: usize,
        raw_lines: &[&str],
        strategy: &Strategy,
    ) -> Option<SectionMatch> {
        let line = raw_lines.get(index)?.trim().to_lowercase();
        if line.is_empty() {
            return None;
        }

        self.direct_match(&line, strategy.confidence_threshold)
            .or_else(|| self.contextual_match(index, raw_lines, strategy))
            .or_else(|| self.fallback_match(&line, index, raw_lines, strategy))
    }

    fn direct_match(&self, line: &str, threshold: f32) -> Option<SectionMatch> {
        for section in &self.sections {
            for pattern in &section.patterns {
                if !pattern.matches(line) {
                    continue;
                }
                let confidence = direct_match_confidence(
                    pattern.confidence,
                    pattern.frequency,
                    section.stats.as_ref(),
                );
                if confidence >= threshold {
                    return Some(SectionMatch {
                        section_type: section.section_type,
                        confidence,
                        pattern: pattern.text.clone(),
                        kind: MatchKind::Direct,
                    });
                }
                tracing::trace!(
                    section = %section.section_type,
                    pattern = %pattern.text,
                    confidence,
                    "Direct match below threshold"
                );
            }
        }
        None
    }

    fn contextual_match(
        &self,
        index: usize,
        raw_lines: &[&str],
        strategy: &Strategy,
    ) -> Option<SectionMatch> {
        let candidate = raw_lines.get(index)?.trim();
        if strategy.context_weight <= 0.0
            || candidate.chars().count() >= MAX_CONTEXT_CANDIDATE_CHARS
            || NUMERIC_LINE.is_match(candidate)
            || PAGE_MARKER.is_match(candidate)
            || !is_heading_shaped(candidate)
        {
            return None;
        }

        // A neighbouring header is not content and gives no context.
        let neighbour = |i: usize| {
            raw_lines
                .get(i)
                .filter(|l| !self.is_header_text(l))
                .map(|l| l.to_lowercase())
        };
        let previous = index.checked_sub(1).and_then(neighbour);
        let next = neighbour(index + 1);

        let before = || self.context_hit(previous.as_deref(), ContextSide::Before, strategy);
        let after = || self.context_hit(next.as_deref(), ContextSide::After, strategy);
        match strategy.pattern_priority {
            PatternPriority::ContentFirst => after().or_else(before),
            PatternPriority::Balanced | PatternPriority::SectionFirst => before().or_else(after),
        }
    }

    /// First section, in declaration order, with a `side` pattern in
    /// `neighbour` strong enough to pass the threshold.
    fn context_hit(
        &self,
        neighbour: Option<&str>,
        side: ContextSide,
        strategy: &Strategy,
    ) -> Option<SectionMatch> {
        let neighbour = neighbour?;
        for section in &self.sections {
            let patterns = match side {
                ContextSide::Before => &section.before,
                ContextSide::After => &section.after,
            };
            for pattern in patterns.iter().filter(|p| neighbour.contains(p.text.as_str())) {
                let confidence = contextual_match_confidence(pattern.confidence, strategy.context_weight);
                if confidence >= strategy.confidence_threshold {
                    return Some(SectionMatch {
                        section_type: section.section_type,
                        confidence,
                        pattern: pattern.text.clone(),
                        kind: MatchKind::Contextual,
                    });
                }
            }
        }
        None
    }

    /// Whether `raw` would open a section by direct match at any confidence.
    fn is_header_text(&self, raw: &str) -> bool {
        let line = raw.trim().to_lowercase();
        !line.is_empty() && self.direct_match(&line, 0.0).is_some()
    }

    fn fallback_match(
        &self,
        line: &str,
        index: usize,
        raw_lines: &[&str],
        strategy: &Strategy,
    ) -> Option<SectionMatch> {
        if !strategy.fallback_enabled {
            return None;
        }
        let Some(matcher) = self.fallback.as_ref() else {
            tracing::trace!("Fallback enabled but no matcher installed");
            return None;
        };

        matcher
            .match_line(line, index, raw_lines)
            .map(|mut m| {
                m.confidence = clamp_unit(m.confidence);
                m
            })
            .filter(|m| m.confidence >= strategy.confidence_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::corpus::ContextualPatternSet;
    use crate::pipeline::segmentation::fallback::HeadingShapeFallback;

    fn corpus_with(entries: &[(SectionType, &str, f32, u32)]) -> PatternCorpus {
        let mut corpus = PatternCorpus::default();
        for (section, text, confidence, frequency) in entries {
            corpus
                .sections
                .entry(*section)
                .or_default()
                .push(Pattern::new(*text, *confidence, *frequency));
        }
        corpus
    }

    fn detector(corpus: PatternCorpus) -> SectionDetector {
        SectionDetector::new(Arc::new(corpus))
    }

    fn no_fallback() -> Strategy {
        Strategy {
            fallback_enabled: false,
            ..Strategy::default()
        }
    }

    // ── Reference scenario ───────────────────────────────

    #[test]
    fn demographics_and_history_scenario() {
        let mut corpus = corpus_with(&[
            (SectionType::Demographics, "demographics", 0.8, 0),
            (SectionType::MedicalHistory, "medical history", 0.7, 0),
        ]);
        corpus.stats.insert(
            SectionType::Demographics,
            SectionStats {
                section_type: SectionType::Demographics,
                min: 0.3,
                max: 0.9,
                avg: 0.6,
            },
        );

        let text = "DEMOGRAPHICS\nJohn Smith, age 45\nMEDICAL HISTORY\nHypertension";
        let sections = detector(corpus).detect(text, &Strategy::default());

        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].section_type, SectionType::Demographics);
        assert_eq!(sections[0].content, "John Smith, age 45");
        assert_eq!(sections[0].title_line, "DEMOGRAPHICS");
        assert_eq!(sections[0].matched_pattern, "demographics");
        assert!((sections[0].confidence - 0.726 * 0.7).abs() < 1e-5);
        assert_eq!(sections[1].section_type, SectionType::MedicalHistory);
        assert_eq!(sections[1].content, "Hypertension");
    }

    // ── Direct matching forms ────────────────────────────

    #[test]
    fn header_prefix_forms_match() {
        let d = detector(corpus_with(&[(SectionType::MedicalHistory, "medical history", 0.9, 50)]));
        for line in [
            "Medical History",
            "MEDICAL HISTORY: reviewed",
            "medical history - see chart",
            "Medical History-",
            "2. Medical History",
            "3 medical history",
        ] {
            let lines = [line];
            assert!(
                d.detect_section_start(0, &lines, &no_fallback()).is_some(),
                "expected header: {line}"
            );
        }
    }

    #[test]
    fn embedded_mention_is_not_a_header() {
        let d = detector(corpus_with(&[(SectionType::MedicalHistory, "medical history", 0.9, 50)]));
        let lines = ["Reviewed medical history with daughter"];
        assert!(d.detect_section_start(0, &lines, &no_fallback()).is_none());
    }

    #[test]
    fn earlier_section_type_wins_ties() {
        let d = detector(corpus_with(&[
            (SectionType::Goals, "plan", 0.9, 50),
            (SectionType::ReferralInformation, "plan", 0.9, 50),
        ]));
        let lines = ["Plan"];
        let m = d.detect_section_start(0, &lines, &no_fallback()).unwrap();
        assert_eq!(m.section_type, SectionType::ReferralInformation);
    }

    #[test]
    fn below_threshold_match_rejected() {
        let d = detector(corpus_with(&[(SectionType::Goals, "goals", 0.2, 0)]));
        assert!(d.detect("Goals\nWalk outdoors", &no_fallback()).is_empty());
    }

    // ── Section assembly ─────────────────────────────────

    #[test]
    fn no_headers_no_sections() {
        let d = detector(PatternCorpus::manual());
        assert!(d.detect("just some text\nwith nothing useful", &no_fallback()).is_empty());
    }

    #[test]
    fn preamble_is_dropped() {
        let d = detector(corpus_with(&[(SectionType::Goals, "goals", 0.9, 50)]));
        let sections = d.detect("Fax cover sheet\nGoals\nReturn to church", &no_fallback());
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].start_line, 1);
        assert_eq!(sections[0].content, "Return to church");
    }

    #[test]
    fn spans_are_contiguous() {
        let d = detector(PatternCorpus::manual());
        let text = "Demographics\nJane Doe\n\nMobility\nUses a walker\nGoals\nIndependent bathing\n";
        let sections = d.detect(text, &no_fallback());
        assert_eq!(sections.len(), 3);
        for pair in sections.windows(2) {
            assert_eq!(pair[0].end_line, pair[1].start_line);
        }
        assert_eq!(sections.last().unwrap().end_line, text.lines().count());
    }

    #[test]
    fn empty_input_yields_nothing() {
        let d = detector(PatternCorpus::manual());
        assert!(d.detect("", &Strategy::default()).is_empty());
        assert!(d.detect("   \n\t\n", &Strategy::default()).is_empty());
    }

    // ── Contextual matching ──────────────────────────────

    fn contextual_corpus() -> PatternCorpus {
        let mut corpus = PatternCorpus::default();
        corpus.contextual.insert(
            SectionType::Mobility,
            ContextualPatternSet {
                before: vec![],
                after: vec![Pattern::new("ambulates", 0.6, 0)],
            },
        );
        corpus
    }

    fn form_strategy() -> Strategy {
        Strategy {
            context_weight: 0.7,
            fallback_enabled: false,
            ..Strategy::default()
        }
    }

    #[test]
    fn following_line_signals_header() {
        let d = detector(contextual_corpus());
        let lines = ["Transfers", "Ambulates 20 ft with rollator"];
        let m = d.detect_section_start(0, &lines, &form_strategy()).unwrap();
        assert_eq!(m.section_type, SectionType::Mobility);
        assert_eq!(m.kind, MatchKind::Contextual);
        assert!((m.confidence - 0.42).abs() < 1e-6);
    }

    #[test]
    fn zero_context_weight_disables_contextual() {
        let d = detector(contextual_corpus());
        let lines = ["Transfers", "Ambulates 20 ft"];
        let strategy = Strategy {
            context_weight: 0.0,
            ..form_strategy()
        };
        assert!(d.detect_section_start(0, &lines, &strategy).is_none());
    }

    #[test]
    fn weak_context_below_threshold() {
        let d = detector(contextual_corpus());
        let lines = ["Transfers", "Ambulates 20 ft"];
        let strategy = Strategy {
            context_weight: 0.3,
            ..form_strategy()
        };
        // 0.6 * 0.3 = 0.18 < 0.3
        assert!(d.detect_section_start(0, &lines, &strategy).is_none());
    }

    #[test]
    fn header_neighbours_give_no_context() {
        let mut corpus = corpus_with(&[(SectionType::Goals, "goals", 0.9, 50)]);
        corpus.contextual.insert(
            SectionType::Goals,
            ContextualPatternSet {
                before: vec![],
                after: vec![Pattern::new("goal", 0.7, 0)],
            },
        );
        let d = detector(corpus);

        let lines = ["Uses a walker", "Goals", "Return to independent bathing"];
        assert!(d.detect_section_start(0, &lines, &form_strategy()).is_none());

        let lines = ["Daily Routine", "Goal: bathe without help"];
        let m = d.detect_section_start(0, &lines, &form_strategy()).unwrap();
        assert_eq!(m.kind, MatchKind::Contextual);
    }

    #[test]
    fn body_lines_never_open_contextual_sections() {
        let mut corpus = PatternCorpus::default();
        corpus.contextual.insert(
            SectionType::SafetyConcerns,
            ContextualPatternSet {
                before: vec![Pattern::new("walker", 0.7, 0)],
                after: vec![],
            },
        );
        let d = detector(corpus);

        for candidate in ["No falls", "Uses rolling walker", "- Metformin", "Name: Jane Doe", "Lives alone."] {
            let lines = ["Uses rolling walker", candidate];
            assert!(d.detect_section_start(1, &lines, &form_strategy()).is_none(), "{candidate}");
        }
        let lines = ["Uses rolling walker", "Home Safety"];
        assert!(d.detect_section_start(1, &lines, &form_strategy()).is_some());
    }

    #[test]
    fn page_markers_numbers_and_long_lines_excluded() {
        let d = detector(contextual_corpus());
        let long = "x".repeat(120);
        for candidate in ["Page 3", "42", long.as_str()] {
            let lines = [candidate, "Ambulates 20 ft"];
            assert!(d.detect_section_start(0, &lines, &form_strategy()).is_none(), "{candidate}");
        }
    }

    #[test]
    fn blank_lines_never_open_sections() {
        let d = detector(contextual_corpus());
        let lines = ["", "Ambulates 20 ft"];
        assert!(d.detect_section_start(0, &lines, &form_strategy()).is_none());
    }

    #[test]
    fn direct_header_wins_under_every_priority() {
        let mut corpus = corpus_with(&[(SectionType::Mobility, "gait", 0.9, 50)]);
        corpus.contextual.insert(
            SectionType::CognitiveStatus,
            ContextualPatternSet {
                before: vec![],
                after: vec![Pattern::new("oriented", 0.7, 0)],
            },
        );
        let d = detector(corpus);
        let lines = ["Gait", "Oriented x3"];

        for priority in [
            PatternPriority::SectionFirst,
            PatternPriority::ContentFirst,
            PatternPriority::Balanced,
        ] {
            let strategy = Strategy {
                pattern_priority: priority,
                ..form_strategy()
            };
            let m = d.detect_section_start(0, &lines, &strategy).unwrap();
            assert_eq!(m.kind, MatchKind::Direct);
            assert_eq!(m.section_type, SectionType::Mobility);
        }
    }

    #[test]
    fn content_first_reads_following_line_first() {
        let mut corpus = PatternCorpus::default();
        corpus.contextual.insert(
            SectionType::Mobility,
            ContextualPatternSet {
                before: vec![Pattern::new("dressing", 0.6, 0)],
                after: vec![],
            },
        );
        corpus.contextual.insert(
            SectionType::HomeEnvironment,
            ContextualPatternSet {
                before: vec![],
                after: vec![Pattern::new("stairs", 0.6, 0)],
            },
        );
        let d = detector(corpus);
        let lines = ["Needs help with dressing", "Home Access", "Stairs to entry"];

        let balanced = d.detect_section_start(1, &lines, &form_strategy()).unwrap();
        assert_eq!(balanced.section_type, SectionType::Mobility);

        let content_first = Strategy {
            pattern_priority: PatternPriority::ContentFirst,
            ..form_strategy()
        };
        let m = d.detect_section_start(1, &lines, &content_first).unwrap();
        assert_eq!(m.section_type, SectionType::HomeEnvironment);
        assert_eq!(m.kind, MatchKind::Contextual);
    }

    #[test]
    fn heading_shape() {
        for line in [
            "Mobility",
            "Home Access",
            "IN-HOME ASSESSMENT",
            "Activities of Daily Living",
            "Safety Concerns:",
            "NKDA",
        ] {
            assert!(is_heading_shaped(line), "{line}");
        }
        for line in [
            "",
            "No falls",
            "Uses rolling walker",
            "- Metformin",
            "1. Mobility",
            "Name: Jane Doe",
            "Lives With Daughter.",
            "One Two Three Four Five Six Seven",
            "42",
        ] {
            assert!(!is_heading_shaped(line), "{line}");
        }
    }

    // ── Fallback extension point ─────────────────────────

    #[test]
    fn fallback_runs_only_when_enabled_and_installed() {
        let text = "CLIENT MOBILITY / TRANSFERS\nNeeds standby assist";
        let enabled = Strategy::default();

        let bare = detector(PatternCorpus::default());
        assert!(bare.detect(text, &enabled).is_empty());

        let with = detector(PatternCorpus::default()).with_fallback(Box::new(HeadingShapeFallback));
        let sections = with.detect(text, &enabled);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].match_kind, MatchKind::Fallback);
        assert_eq!(sections[0].section_type, SectionType::Mobility);

        assert!(with.detect(text, &no_fallback()).is_empty());
    }
}
