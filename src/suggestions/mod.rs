//! Suggestion engine over an extracted `StructuredRecord`.
//!
//! Produces three kinds of findings: content suggestions for low-confidence
//! fields, cross-section validation results and missing information. Each
//! content source is an independent `ContentProvider`; providers run in
//! precedence order and the first proposal for a field wins. All tables
//! come from `SuggestionRules`, never from the engine itself.
//!
//! Accepting is id-based: suggestion ids are name-based UUIDs over
//! `(section, field, value)` and validation ids are `"{section}-{field}"`,
//! so regenerating on unchanged data yields the same ids.

pub mod correction;
pub mod format_provider;
pub mod knowledge;
pub mod knowledge_provider;
pub mod missing;
pub mod relationship_provider;
pub mod rules;
pub mod validation;

pub use rules::{load_rules, RulesError, SuggestionRules};

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::enums::{Importance, SectionType, Severity, SuggestionSource};
use crate::pipeline::extraction::{FieldRef, FieldValue, StructuredRecord};
use crate::pipeline::segmentation::confidence::clamp_unit;

// ─── Public types ────────────────────────────────────────────────────────────

/// Proposed value for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSuggestion {
    pub id: String,
    pub section: SectionType,
    pub field: String,
    pub current_value: Option<String>,
    pub suggested_value: String,
    pub confidence: f32,
    pub source: SuggestionSource,
    pub reason: String,
}

/// Cross-section inconsistency. `section`/`field` name the field the fix
/// would overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub id: String,
    pub section: SectionType,
    pub field: String,
    pub severity: Severity,
    pub message: String,
    pub suggested_fix: Option<String>,
}

/// Expected field (or whole section, `field = None`) that is absent or blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingInformation {
    pub section: SectionType,
    pub field: Option<String>,
    pub importance: Importance,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionReport {
    pub content_suggestions: Vec<ContentSuggestion>,
    pub validation_results: Vec<ValidationResult>,
    pub missing_information: Vec<MissingInformation>,
}

// ─── Internal types ──────────────────────────────────────────────────────────

/// A value proposed by a provider, before eligibility filtering.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub target: FieldRef,
    pub value: String,
    pub confidence: f32,
    pub reason: String,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// One per suggestion source. Self-contained, independently testable.
pub trait ContentProvider: Send + Sync {
    fn source(&self) -> SuggestionSource;

    /// Candidates for fields this provider has rules for. The engine
    /// discards candidates for fields that do not need review.
    fn propose(&self, record: &StructuredRecord, rules: &SuggestionRules) -> Vec<Candidate>;
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

const SUGGESTION_NAMESPACE: Uuid = Uuid::from_u128(0x6b1f_3c2e_8a47_4d0b_9e55_2f7a_c3d1_0e84);

/// Deterministic suggestion id.
pub fn suggestion_id(section: SectionType, field: &str, value: &str) -> String {
    let key = format!("{section}|{field}|{value}");
    Uuid::new_v5(&SUGGESTION_NAMESPACE, key.as_bytes()).to_string()
}

/// Validation id keyed on the targeted field.
pub fn validation_id(target: &FieldRef) -> String {
    format!("{}-{}", target.section, target.field)
}

/// Absent, blank or below-threshold fields need review; confirmed values
/// never do.
pub fn needs_review(record: &StructuredRecord, target: &FieldRef, rules: &SuggestionRules) -> bool {
    match record.get_ref(target) {
        None => true,
        Some(v) if v.is_confirmed() => false,
        Some(v) => v.is_blank() || v.confidence < rules.low_confidence_threshold,
    }
}

/// Non-blank value at or above the threshold, usable as evidence.
pub fn trusted<'a>(
    record: &'a StructuredRecord,
    field: &FieldRef,
    rules: &SuggestionRules,
) -> Option<&'a FieldValue> {
    record
        .get_ref(field)
        .filter(|v| !v.is_blank() && v.confidence >= rules.low_confidence_threshold)
}

// ─── Engine ──────────────────────────────────────────────────────────────────

pub struct SuggestionEngine {
    rules: SuggestionRules,
    providers: Vec<Box<dyn ContentProvider>>,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new(knowledge::default_rules())
    }
}

impl SuggestionEngine {
    pub fn new(rules: SuggestionRules) -> Self {
        Self {
            rules,
            providers: vec![
                Box::new(relationship_provider::RelationshipProvider),
                Box::new(format_provider::FormatProvider),
                Box::new(knowledge_provider::KnowledgeProvider),
            ],
        }
    }

    /// Date that date-relative rules treat as today.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.rules.reference_date = Some(date);
        self
    }

    pub fn rules(&self) -> &SuggestionRules {
        &self.rules
    }

    pub fn generate_suggestions(&self, record: &StructuredRecord) -> SuggestionReport {
        let report = SuggestionReport {
            content_suggestions: self.content_suggestions(record),
            validation_results: validation::validate(record, &self.rules),
            missing_information: missing::detect_missing(record, &self.rules),
        };

        tracing::debug!(
            content = report.content_suggestions.len(),
            validation = report.validation_results.len(),
            missing = report.missing_information.len(),
            "Suggestions generated"
        );
        report
    }

    pub fn content_suggestions(&self, record: &StructuredRecord) -> Vec<ContentSuggestion> {
        let mut claimed: BTreeSet<FieldRef> = BTreeSet::new();
        let mut suggestions = Vec::new();

        for provider in &self.providers {
            for candidate in provider.propose(record, &self.rules) {
                if claimed.contains(&candidate.target)
                    || !needs_review(record, &candidate.target, &self.rules)
                {
                    continue;
                }

                let value = candidate.value.trim();
                let current = record.get_ref(&candidate.target).map(|v| v.value.clone());
                if value.is_empty() || current.as_deref().map(str::trim) == Some(value) {
                    continue;
                }

                let FieldRef { section, field } = candidate.target.clone();
                suggestions.push(ContentSuggestion {
                    id: suggestion_id(section, &field, value),
                    section,
                    field,
                    current_value: current,
                    suggested_value: value.to_string(),
                    confidence: clamp_unit(candidate.confidence),
                    source: provider.source(),
                    reason: candidate.reason,
                });
                claimed.insert(candidate.target);
            }
        }
        suggestions
    }

    /// Apply the accepted ids of `report` to a copy of `record`.
    ///
    /// Content suggestions are applied first, then validation fixes. Applied
    /// values are stored as confirmed, which makes re-application a no-op.
    /// Unknown ids are ignored.
    pub fn apply(
        &self,
        record: &StructuredRecord,
        report: &SuggestionReport,
        accepted: &HashSet<String>,
    ) -> StructuredRecord {
        let mut patched = record.clone();
        let mut matched: HashSet<&str> = HashSet::new();

        for suggestion in &report.content_suggestions {
            if accepted.contains(&suggestion.id) {
                patched.set(
                    suggestion.section,
                    suggestion.field.clone(),
                    FieldValue::confirmed(suggestion.suggested_value.clone()),
                );
                matched.insert(&suggestion.id);
            }
        }

        for result in &report.validation_results {
            if !accepted.contains(&result.id) {
                continue;
            }
            matched.insert(&result.id);
            if let Some(fix) = &result.suggested_fix {
                patched.set(result.section, result.field.clone(), FieldValue::confirmed(fix.clone()));
            }
        }

        let unknown = accepted.iter().filter(|id| !matched.contains(id.as_str())).count();
        if unknown > 0 {
            tracing::debug!(unknown, "Ignoring unknown suggestion ids");
        }
        patched
    }

    /// Regenerate suggestions for `record` and apply the accepted ids.
    pub fn apply_suggestions(
        &self,
        record: &StructuredRecord,
        accepted: &HashSet<String>,
    ) -> StructuredRecord {
        let report = self.generate_suggestions(record);
        self.apply(record, &report, accepted)
    }
}
