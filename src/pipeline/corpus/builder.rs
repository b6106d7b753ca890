//! Offline corpus construction from labeled analysis samples.
//!
//! Each sample is a JSON document of the form
//! `{ "sections": { "<section_type>": "<raw text>" }, "confidence": { "<section_type>": 0.82 } }`.
//! The first lines of every labeled section are mined for header n-grams,
//! the lines after them for contextual "after" words.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::fallback;
use super::types::{merge_pattern, ContextualPatternSet, Pattern, PatternCorpus, SectionStats};
use super::CorpusError;
use crate::models::enums::SectionType;

/// Lines at the top of a section mined for header candidates.
pub const HEADER_LINES: usize = 5;

/// Lines `HEADER_LINES..CONTEXT_LINE_END` feed the "after" contextual list.
pub const CONTEXT_LINE_END: usize = 15;

/// Words shorter than this are not tokens.
pub const MIN_WORD_CHARS: usize = 4;

pub const MIN_PATTERN_FREQUENCY: u32 = 3;
pub const MAX_PATTERNS_PER_SECTION: usize = 20;

/// Below this many mined header patterns, manual fallbacks are appended.
pub const MIN_MINED_PATTERNS: usize = 5;

pub const MIN_CONTEXT_FREQUENCY: u32 = 2;
pub const MAX_CONTEXT_PATTERNS: usize = 5;

/// Below this many mined contextual patterns, manual fallbacks are appended.
pub const MIN_MINED_CONTEXT: usize = 3;

/// One labeled analysis record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalysisSample {
    pub sections: BTreeMap<String, String>,
    #[serde(default)]
    pub confidence: BTreeMap<String, f32>,
}

/// Accumulates n-gram frequencies across samples, then freezes them into a
/// `PatternCorpus`.
#[derive(Debug, Default)]
pub struct CorpusBuilder {
    header_counts: BTreeMap<SectionType, HashMap<String, u32>>,
    after_counts: BTreeMap<SectionType, HashMap<String, u32>>,
    observed_confidence: BTreeMap<SectionType, Vec<f32>>,
    stats_override: BTreeMap<SectionType, SectionStats>,
    sample_count: usize,
}

impl CorpusBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use precomputed statistics instead of the ones observed in samples.
    pub fn with_stats(mut self, stats: impl IntoIterator<Item = SectionStats>) -> Self {
        for s in stats {
            self.stats_override.insert(s.section_type, s);
        }
        self
    }

    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Accumulate one sample. Unknown section keys are skipped.
    pub fn add_sample(&mut self, sample: &AnalysisSample) {
        self.sample_count += 1;

        for (key, raw) in &sample.sections {
            let Ok(section) = SectionType::from_str(key) else {
                tracing::warn!(section = %key, "Skipping unknown section type in sample");
                continue;
            };

            let lines: Vec<&str> = raw.lines().collect();

            let header = self.header_counts.entry(section).or_default();
            for line in lines.iter().take(HEADER_LINES) {
                for gram in ngrams(&tokenize(line)) {
                    *header.entry(gram).or_insert(0) += 1;
                }
            }

            let after = self.after_counts.entry(section).or_default();
            for line in lines.iter().take(CONTEXT_LINE_END).skip(HEADER_LINES) {
                for word in tokenize(line) {
                    *after.entry(word).or_insert(0) += 1;
                }
            }
        }

        for (key, value) in &sample.confidence {
            let Ok(section) = SectionType::from_str(key) else {
                continue;
            };
            if value.is_finite() {
                self.observed_confidence
                    .entry(section)
                    .or_default()
                    .push(value.clamp(0.0, 1.0));
            }
        }
    }

    /// Parse and accumulate one sample file. Malformed JSON aborts the build.
    pub fn add_sample_file(&mut self, path: &Path) -> Result<(), CorpusError> {
        let text = std::fs::read_to_string(path)?;
        let sample: AnalysisSample =
            serde_json::from_str(&text).map_err(|e| CorpusError::InvalidSample {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        self.add_sample(&sample);
        Ok(())
    }

    /// Accumulate every `*.json` file of `dir`, in filename order.
    /// Returns the number of files read.
    pub fn add_directory(&mut self, dir: &Path) -> Result<usize, CorpusError> {
        if !dir.is_dir() {
            return Err(CorpusError::NotFound(dir.to_path_buf()));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in &paths {
            self.add_sample_file(path)?;
        }

        tracing::debug!(dir = %dir.display(), files = paths.len(), "Sample directory read");
        Ok(paths.len())
    }

    fn stats_for(&self, section: SectionType) -> SectionStats {
        if let Some(stats) = self.stats_override.get(&section) {
            return *stats;
        }

        match self.observed_confidence.get(&section) {
            Some(values) if !values.is_empty() => {
                let min = values.iter().copied().fold(f32::INFINITY, f32::min);
                let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
                let avg = values.iter().sum::<f32>() / values.len() as f32;
                SectionStats {
                    section_type: section,
                    min,
                    max,
                    avg,
                }
            }
            _ => SectionStats::neutral(section),
        }
    }

    /// Freeze accumulated counts into a corpus covering every section type.
    pub fn build(&self) -> PatternCorpus {
        let mut corpus = PatternCorpus::default();

        for &section in SectionType::all() {
            let stats = self.stats_for(section);

            let mut patterns = ranked(
                self.header_counts.get(&section),
                MIN_PATTERN_FREQUENCY,
                MAX_PATTERNS_PER_SECTION,
                stats.avg,
            );
            if patterns.len() < MIN_MINED_PATTERNS {
                for p in fallback::header_patterns(section) {
                    merge_pattern(&mut patterns, p);
                }
            }

            let mut after = ranked(
                self.after_counts.get(&section),
                MIN_CONTEXT_FREQUENCY,
                MAX_CONTEXT_PATTERNS,
                stats.avg,
            );
            if after.len() < MIN_MINED_CONTEXT {
                for p in fallback::after_patterns(section) {
                    merge_pattern(&mut after, p);
                }
                after.truncate(MAX_CONTEXT_PATTERNS);
            }

            corpus.sections.insert(section, patterns);
            corpus.stats.insert(section, stats);
            corpus.contextual.insert(
                section,
                ContextualPatternSet {
                    before: fallback::before_patterns(section),
                    after,
                },
            );
        }

        tracing::info!(
            samples = self.sample_count,
            patterns = corpus.pattern_count(),
            "Pattern corpus built"
        );
        corpus
    }
}

/// Build a corpus from every sample in `dir`.
pub fn build_corpus_from_dir(dir: &Path) -> Result<(PatternCorpus, usize), CorpusError> {
    let mut builder = CorpusBuilder::new();
    let files = builder.add_directory(dir)?;
    Ok((builder.build(), files))
}

/// Keep counts at or above `min_frequency`, sort by frequency (desc) then
/// text, cap at `limit`.
fn ranked(
    counts: Option<&HashMap<String, u32>>,
    min_frequency: u32,
    limit: usize,
    confidence: f32,
) -> Vec<Pattern> {
    let Some(counts) = counts else {
        return Vec::new();
    };

    let mut kept: Vec<(&String, u32)> = counts
        .iter()
        .filter(|&(_, &freq)| freq >= min_frequency)
        .map(|(text, &freq)| (text, freq))
        .collect();
    kept.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    kept.into_iter()
        .take(limit)
        .map(|(text, freq)| Pattern::new(text.clone(), confidence, freq))
        .collect()
}

/// Lowercase words of at least `MIN_WORD_CHARS` characters, edge punctuation removed.
pub fn tokenize(line: &str) -> Vec<String> {
    line.to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().count() >= MIN_WORD_CHARS)
        .map(str::to_string)
        .collect()
}

/// Unigrams, bigrams and trigrams of consecutive tokens.
pub fn ngrams(words: &[String]) -> Vec<String> {
    let mut grams = Vec::with_capacity(words.len() * 3);
    for n in 1..=3 {
        for window in words.windows(n) {
            grams.push(window.join(" "));
        }
    }
    grams
}
