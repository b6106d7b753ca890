//! Detection strategy resolution.
//!
//! Maps a `DocumentClassification` to the `Strategy` the section detector
//! runs with. Pure function, table-driven, no failure mode.

use serde::{Deserialize, Serialize};

use super::classify::DocumentClassification;
use crate::models::enums::{DocumentStructure, DocumentType, PatternPriority};

// ═══════════════════════════════════════════════════════════
// Types
// ═══════════════════════════════════════════════════════════

/// Detector knobs for one run. Immutable once selected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    /// Minimum match confidence for a line to open a section.
    pub confidence_threshold: f32,
    /// Which neighbour the contextual pass reads first. Direct matching
    /// always runs before contextual.
    pub pattern_priority: PatternPriority,
    /// Weight of contextual matches; 0 disables them.
    pub context_weight: f32,
    /// Whether the fallback matcher may run.
    pub fallback_enabled: bool,
}

impl Default for Strategy {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.3,
            pattern_priority: PatternPriority::Balanced,
            context_weight: 0.5,
            fallback_enabled: true,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Resolution
// ═══════════════════════════════════════════════════════════

/// Complexity above which the fallback matcher is always enabled.
pub const HIGH_COMPLEXITY: f32 = 0.7;

/// Resolve the detection strategy for a classified document.
pub fn select_strategy(classification: &DocumentClassification) -> Strategy {
    select_strategy_from(Strategy::default(), classification)
}

/// Adjust `base` for a classified document. Fields the classification does
/// not decide keep their `base` value; fallback is only ever switched on.
pub fn select_strategy_from(base: Strategy, classification: &DocumentClassification) -> Strategy {
    let mut strategy = base;

    match classification.doc_type {
        DocumentType::InHomeAssessment => {
            strategy.confidence_threshold = 0.25;
            strategy.pattern_priority = PatternPriority::SectionFirst;
        }
        DocumentType::Referral => {
            strategy.confidence_threshold = 0.35;
            strategy.pattern_priority = PatternPriority::ContentFirst;
        }
        _ => {}
    }

    strategy.context_weight = match classification.structure {
        DocumentStructure::Form => 0.7,
        _ => 0.3,
    };

    if classification.complexity > HIGH_COMPLEXITY {
        strategy.fallback_enabled = true;
    }

    tracing::debug!(
        threshold = strategy.confidence_threshold,
        priority = %strategy.pattern_priority,
        context_weight = strategy.context_weight,
        "Detection strategy selected"
    );
    strategy
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn classification(
        doc_type: DocumentType,
        structure: DocumentStructure,
        complexity: f32,
    ) -> DocumentClassification {
        DocumentClassification {
            doc_type,
            confidence: 0.9,
            structure,
            length: 100,
            complexity,
        }
    }

    #[test]
    fn in_home_lowers_threshold_section_first() {
        let s = select_strategy(&classification(
            DocumentType::InHomeAssessment,
            DocumentStructure::Narrative,
            0.1,
        ));
        assert!((s.confidence_threshold - 0.25).abs() < f32::EPSILON);
        assert_eq!(s.pattern_priority, PatternPriority::SectionFirst);
    }

    #[test]
    fn referral_raises_threshold_content_first() {
        let s = select_strategy(&classification(
            DocumentType::Referral,
            DocumentStructure::Narrative,
            0.1,
        ));
        assert!((s.confidence_threshold - 0.35).abs() < f32::EPSILON);
        assert_eq!(s.pattern_priority, PatternPriority::ContentFirst);
    }

    #[test]
    fn unknown_keeps_defaults() {
        let s = select_strategy(&classification(
            DocumentType::Unknown,
            DocumentStructure::Narrative,
            0.1,
        ));
        assert!((s.confidence_threshold - 0.3).abs() < f32::EPSILON);
        assert_eq!(s.pattern_priority, PatternPriority::Balanced);
        assert!(s.fallback_enabled);
    }

    #[test]
    fn form_raises_context_weight() {
        let s = select_strategy(&classification(
            DocumentType::Unknown,
            DocumentStructure::Form,
            0.1,
        ));
        assert!((s.context_weight - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn narrative_lowers_context_weight() {
        let s = select_strategy(&classification(
            DocumentType::Unknown,
            DocumentStructure::Narrative,
            0.1,
        ));
        assert!((s.context_weight - 0.3).abs() < f32::EPSILON);
    }

    #[test]
    fn high_complexity_forces_fallback() {
        let base = Strategy {
            fallback_enabled: false,
            ..Strategy::default()
        };
        let complex = classification(DocumentType::Referral, DocumentStructure::Form, 0.95);
        assert!(select_strategy_from(base, &complex).fallback_enabled);

        let simple = classification(DocumentType::Referral, DocumentStructure::Form, 0.5);
        assert!(!select_strategy_from(base, &simple).fallback_enabled);

        // exactly at the limit is not above it
        let edge = classification(DocumentType::Referral, DocumentStructure::Form, HIGH_COMPLEXITY);
        assert!(!select_strategy_from(base, &edge).fallback_enabled);
    }

    #[test]
    fn default_base_matches_select_strategy() {
        let c = classification(DocumentType::InHomeAssessment, DocumentStructure::Form, 0.2);
        assert_eq!(select_strategy_from(Strategy::default(), &c), select_strategy(&c));
    }
}
