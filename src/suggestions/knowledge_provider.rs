//! Content provider for domain knowledge: vocabulary correction and
//! default values for empty fields.

use super::correction::correct_terms;
use super::rules::SuggestionRules;
use super::{Candidate, ContentProvider};
use crate::models::enums::SuggestionSource;
use crate::pipeline::extraction::StructuredRecord;

pub const CORRECTION_CONFIDENCE: f32 = 0.7;
pub const DEFAULT_VALUE_CONFIDENCE: f32 = 0.5;

pub struct KnowledgeProvider;

impl ContentProvider for KnowledgeProvider {
    fn source(&self) -> SuggestionSource {
        SuggestionSource::DomainKnowledge
    }

    fn propose(&self, record: &StructuredRecord, rules: &SuggestionRules) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for rule in &rules.vocabulary_fields {
            let Some(current) = record.get_ref(&rule.field).filter(|v| !v.is_blank()) else {
                continue;
            };
            let corrected = correct_terms(&current.value, rules.vocabulary(&rule.vocabulary));
            if corrected != current.value {
                candidates.push(Candidate {
                    target: rule.field.clone(),
                    value: corrected,
                    confidence: CORRECTION_CONFIDENCE,
                    reason: format!("Spelling corrected against {} vocabulary", rule.vocabulary),
                });
            }
        }

        for default in &rules.defaults {
            let empty = record.get_ref(&default.field).map_or(true, |v| v.is_blank());
            if empty {
                candidates.push(Candidate {
                    target: default.field.clone(),
                    value: default.value.clone(),
                    confidence: DEFAULT_VALUE_CONFIDENCE,
                    reason: default.reason.clone(),
                });
            }
        }

        candidates
    }
}
