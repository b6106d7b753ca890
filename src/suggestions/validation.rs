//! Cross-section consistency checks.
//!
//! Severity comes from the rule: high when the mismatch contradicts
//! safety-relevant data, medium for a plausible but unconfirmed mismatch,
//! low for formatting-only differences.

use std::collections::BTreeMap;

use super::rules::{CrossSectionRule, SuggestionRules};
use super::{validation_id, ValidationResult};
use crate::models::enums::Severity;
use crate::pipeline::extraction::normalize::{comparable, parse_date};
use crate::pipeline::extraction::{FieldRef, FieldValue, StructuredRecord};

pub fn validate(record: &StructuredRecord, rules: &SuggestionRules) -> Vec<ValidationResult> {
    let mut results: Vec<ValidationResult> = Vec::new();
    // Fixes proposed so far, so later rules on the same field build on them.
    let mut pending: BTreeMap<FieldRef, String> = BTreeMap::new();

    for rule in &rules.cross_section {
        let found = match rule {
            CrossSectionRule::MentionedInList {
                mention,
                list,
                vocabulary,
                severity,
            } => mentioned_in_list(
                record,
                mention,
                list,
                rules.vocabulary(vocabulary),
                *severity,
                &mut pending,
            ),
            CrossSectionRule::MustMatch {
                primary,
                secondary,
                severity,
            } => must_match(record, primary, secondary, *severity),
            CrossSectionRule::DateOrder {
                earlier,
                later,
                severity,
            } => date_order(record, earlier, later, *severity),
        };

        if let Some(result) = found {
            merge(&mut results, result);
        }
    }

    results
}

/// Combine findings that target the same field.
fn merge(results: &mut Vec<ValidationResult>, result: ValidationResult) {
    match results.iter_mut().find(|r| r.id == result.id) {
        Some(existing) => {
            existing.severity = existing.severity.max(result.severity);
            existing.message = format!("{}; {}", existing.message, result.message);
            if result.suggested_fix.is_some() {
                existing.suggested_fix = result.suggested_fix;
            }
        }
        None => results.push(result),
    }
}

fn present<'a>(record: &'a StructuredRecord, field: &FieldRef) -> Option<&'a FieldValue> {
    record.get_ref(field).filter(|v| !v.is_blank())
}

fn fixable(record: &StructuredRecord, field: &FieldRef) -> bool {
    record.get_ref(field).map_or(true, |v| !v.is_confirmed())
}

/// Lowercase words separated by single spaces, padded for whole-word search.
fn padded_words(text: &str) -> String {
    let words: String = text
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();
    format!(" {} ", comparable(&words))
}

fn contains_term(haystack: &str, term: &str) -> bool {
    let needle = padded_words(term);
    !needle.trim().is_empty() && padded_words(haystack).contains(&needle)
}

// ── Rules ────────────────────────────────────────────────

fn mentioned_in_list(
    record: &StructuredRecord,
    mention: &FieldRef,
    list: &FieldRef,
    vocabulary: &[String],
    severity: Severity,
    pending: &mut BTreeMap<FieldRef, String>,
) -> Option<ValidationResult> {
    let mentioned = present(record, mention)?;

    let mut terms: Vec<&str> = Vec::new();
    for term in vocabulary.iter().map(|t| t.trim()) {
        if contains_term(&mentioned.value, term) && !terms.contains(&term) {
            terms.push(term);
        }
    }

    let list_text = pending
        .get(list)
        .cloned()
        .or_else(|| record.get_ref(list).map(|v| v.value.trim().to_string()))
        .unwrap_or_default();
    let missing: Vec<&str> = terms
        .into_iter()
        .filter(|t| !contains_term(&list_text, t))
        .collect();
    if missing.is_empty() {
        return None;
    }

    let suggested_fix = fixable(record, list).then(|| {
        let mut items: Vec<&str> = Vec::new();
        if !list_text.is_empty() {
            items.push(&list_text);
        }
        items.extend(missing.iter().copied());
        items.join(", ")
    });
    if let Some(fix) = &suggested_fix {
        pending.insert(list.clone(), fix.clone());
    }

    Some(ValidationResult {
        id: validation_id(list),
        section: list.section,
        field: list.field.clone(),
        severity,
        message: format!("{mention} mentions {} but {list} does not list it", missing.join(", ")),
        suggested_fix,
    })
}

fn must_match(
    record: &StructuredRecord,
    primary: &FieldRef,
    secondary: &FieldRef,
    severity: Severity,
) -> Option<ValidationResult> {
    let a = present(record, primary)?;
    let b = present(record, secondary)?;
    if a.value.trim() == b.value.trim() {
        return None;
    }

    let same_date = matches!(
        (parse_date(&a.value), parse_date(&b.value)),
        (Some(x), Some(y)) if x == y
    );
    let (severity, message) = if same_date || comparable(&a.value) == comparable(&b.value) {
        (
            Severity::Low,
            format!("{primary} and {secondary} differ only in formatting"),
        )
    } else {
        (
            severity,
            format!("{primary} ('{}') does not match {secondary} ('{}')", a.value.trim(), b.value.trim()),
        )
    };

    // The lower-confidence side is overwritten; ties overwrite the secondary.
    let (source, target) = if b.confidence > a.confidence {
        (b, primary)
    } else {
        (a, secondary)
    };

    Some(ValidationResult {
        id: validation_id(target),
        section: target.section,
        field: target.field.clone(),
        severity,
        message,
        suggested_fix: fixable(record, target).then(|| source.value.trim().to_string()),
    })
}

fn date_order(
    record: &StructuredRecord,
    earlier: &FieldRef,
    later: &FieldRef,
    severity: Severity,
) -> Option<ValidationResult> {
    let first = parse_date(&present(record, earlier)?.value)?;
    let second = parse_date(&present(record, later)?.value)?;
    if first <= second {
        return None;
    }

    Some(ValidationResult {
        id: validation_id(earlier),
        section: earlier.section,
        field: earlier.field.clone(),
        severity,
        message: format!("{earlier} ({first}) is after {later} ({second})"),
        suggested_fix: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::SectionType;
    use crate::suggestions::knowledge::default_rules;

    fn record_with(entries: &[(SectionType, &str, &str, f32)]) -> StructuredRecord {
        let mut record = StructuredRecord::default();
        for (section, field, value, confidence) in entries {
            record.set(*section, *field, FieldValue::new(*value, *confidence));
        }
        record
    }

    // ── Mentioned in list ────────────────────────────────

    #[test]
    fn mobility_aid_missing_from_device_list() {
        let record = record_with(&[
            (SectionType::Mobility, "mobilityAid", "rolling walker", 0.7),
            (SectionType::AssistiveDevices, "devices", "Shower chair, grab bars", 0.7),
        ]);
        let results = validate(&record, &default_rules());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "assistive_devices-devices");
        assert_eq!(results[0].severity, Severity::Medium);
        assert_eq!(
            results[0].suggested_fix.as_deref(),
            Some("Shower chair, grab bars, walker")
        );
    }

    #[test]
    fn listed_aid_is_consistent() {
        let record = record_with(&[
            (SectionType::Mobility, "mobilityAid", "walker", 0.7),
            (SectionType::AssistiveDevices, "devices", "Rolling walker", 0.7),
        ]);
        assert!(validate(&record, &default_rules()).is_empty());
    }

    #[test]
    fn repeated_target_merges_fixes() {
        let record = record_with(&[
            (SectionType::Mobility, "mobilityAid", "walker", 0.7),
            (SectionType::Mobility, "notes", "Uses a wheelchair outdoors", 0.7),
        ]);
        let results = validate(&record, &default_rules());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].suggested_fix.as_deref(), Some("walker, wheelchair"));
    }

    #[test]
    fn confirmed_list_gets_no_fix() {
        let record = record_with(&[
            (SectionType::Mobility, "mobilityAid", "cane", 0.7),
            (SectionType::AssistiveDevices, "devices", "grab bars", 1.0),
        ]);
        let results = validate(&record, &default_rules());
        assert_eq!(results.len(), 1);
        assert!(results[0].suggested_fix.is_none());
    }

    // ── Must match ───────────────────────────────────────

    #[test]
    fn conflicting_names_are_high() {
        let record = record_with(&[
            (SectionType::Demographics, "name", "Jane Doe", 0.5),
            (SectionType::ReferralInformation, "clientName", "Joan Dow", 0.9),
        ]);
        let results = validate(&record, &default_rules());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::High);
        assert_eq!(results[0].id, "demographics-name");
        assert_eq!(results[0].suggested_fix.as_deref(), Some("Joan Dow"));
    }

    #[test]
    fn formatting_only_difference_is_low() {
        let record = record_with(&[
            (SectionType::Demographics, "dateOfBirth", "1948-03-14", 0.9),
            (SectionType::ReferralInformation, "dateOfBirth", "03/14/1948", 0.5),
        ]);
        let results = validate(&record, &default_rules());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::Low);
        assert_eq!(results[0].id, "referral_information-dateOfBirth");
    }

    // ── Date order ───────────────────────────────────────

    #[test]
    fn birth_after_referral_flagged_without_fix() {
        let record = record_with(&[
            (SectionType::Demographics, "dateOfBirth", "2025-01-01", 0.9),
            (SectionType::ReferralInformation, "referralDate", "2024-05-01", 0.9),
        ]);
        let results = validate(&record, &default_rules());
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].severity, Severity::High);
        assert!(results[0].suggested_fix.is_none());
    }

    #[test]
    fn empty_record_is_consistent() {
        assert!(validate(&StructuredRecord::default(), &default_rules()).is_empty());
    }
}
