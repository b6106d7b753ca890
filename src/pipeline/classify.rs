//! Coarse document classification: type, layout and vocabulary complexity.
//!
//! Pure function of the input text, used only to select a detection
//! `Strategy`.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::models::enums::{DocumentStructure, DocumentType};

/// Confidence assigned when a type marker is found.
pub const MARKER_CONFIDENCE: f32 = 0.9;

/// Lines shorter than this count as form-like.
pub const SHORT_LINE_CHARS: usize = 50;

/// Share of short lines above which the document is a form.
pub const FORM_SHORT_LINE_RATIO: f64 = 0.70;

/// Vocabulary size at which complexity saturates.
pub const COMPLEXITY_VOCABULARY: f32 = 5000.0;

/// Case-sensitive literal markers, checked in order; first match wins.
pub const DEFAULT_TYPE_MARKERS: &[(&str, DocumentType)] = &[
    ("IN-HOME ASSESSMENT", DocumentType::InHomeAssessment),
    ("REFERRAL", DocumentType::Referral),
    ("DISCHARGE SUMMARY", DocumentType::DischargeSummary),
    ("PROGRESS NOTE", DocumentType::ProgressNote),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentClassification {
    pub doc_type: DocumentType,
    pub confidence: f32,
    pub structure: DocumentStructure,
    /// Character count of the input.
    pub length: usize,
    /// Unique-vocabulary ratio in `[0, 1]`.
    pub complexity: f32,
}

#[derive(Debug, Clone)]
pub struct DocumentClassifier {
    markers: Vec<(String, DocumentType)>,
}

impl Default for DocumentClassifier {
    fn default() -> Self {
        Self::with_markers(
            DEFAULT_TYPE_MARKERS
                .iter()
                .map(|(marker, doc_type)| (marker.to_string(), *doc_type)),
        )
    }
}

impl DocumentClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_markers(markers: impl IntoIterator<Item = (String, DocumentType)>) -> Self {
        Self {
            markers: markers.into_iter().collect(),
        }
    }

    /// Classify raw extracted text. Never fails; empty input yields
    /// `Unknown` / `Narrative` / complexity 0.
    pub fn classify(&self, text: &str) -> DocumentClassification {
        if text.trim().is_empty() {
            tracing::debug!("Classifying empty document text");
        }

        let (doc_type, confidence) = self.detect_type(text);
        let classification = DocumentClassification {
            doc_type,
            confidence,
            structure: detect_structure(text),
            length: text.chars().count(),
            complexity: vocabulary_complexity(text),
        };

        tracing::debug!(
            doc_type = %classification.doc_type,
            structure = %classification.structure,
            complexity = classification.complexity,
            "Document classified"
        );
        classification
    }

    fn detect_type(&self, text: &str) -> (DocumentType, f32) {
        self.markers
            .iter()
            .find(|(marker, _)| text.contains(marker.as_str()))
            .map(|(_, doc_type)| (*doc_type, MARKER_CONFIDENCE))
            .unwrap_or((DocumentType::Unknown, 0.0))
    }
}

/// Form when more than 70 % of lines are short, narrative otherwise.
pub fn detect_structure(text: &str) -> DocumentStructure {
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return DocumentStructure::Narrative;
    }

    let short = lines
        .iter()
        .filter(|l| l.chars().count() < SHORT_LINE_CHARS)
        .count();

    if short as f64 / lines.len() as f64 > FORM_SHORT_LINE_RATIO {
        DocumentStructure::Form
    } else {
        DocumentStructure::Narrative
    }
}

/// `min(1, unique lowercase words / 5000)`.
pub fn vocabulary_complexity(text: &str) -> f32 {
    let unique: HashSet<String> = text.split_whitespace().map(str::to_lowercase).collect();
    (unique.len() as f32 / COMPLEXITY_VOCABULARY).min(1.0)
}
