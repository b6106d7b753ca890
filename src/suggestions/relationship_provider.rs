//! Content provider for same-document relationships: a trusted field
//! implies the value of another.

use chrono::{Datelike, NaiveDate};

use super::rules::{Relationship, SuggestionRules};
use super::{trusted, Candidate, ContentProvider};
use crate::models::enums::SuggestionSource;
use crate::pipeline::extraction::normalize::parse_date;
use crate::pipeline::extraction::StructuredRecord;

/// Share of the source field's confidence carried by the implied value.
pub const RELATIONSHIP_DISCOUNT: f32 = 0.9;

pub struct RelationshipProvider;

impl ContentProvider for RelationshipProvider {
    fn source(&self) -> SuggestionSource {
        SuggestionSource::Relationship
    }

    fn propose(&self, record: &StructuredRecord, rules: &SuggestionRules) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for relationship in &rules.relationships {
            match relationship {
                Relationship::Mirror { source, target } => {
                    let Some(value) = trusted(record, source, rules) else {
                        continue;
                    };
                    candidates.push(Candidate {
                        target: target.clone(),
                        value: value.value.trim().to_string(),
                        confidence: value.confidence * RELATIONSHIP_DISCOUNT,
                        reason: format!("Matches {source}"),
                    });
                }
                Relationship::AgeFromBirthDate {
                    birth_date,
                    target,
                    as_of,
                } => {
                    let Some(value) = trusted(record, birth_date, rules) else {
                        continue;
                    };
                    let Some(born) = parse_date(&value.value) else {
                        continue;
                    };
                    let Some(reference) = as_of.or(rules.reference_date) else {
                        tracing::trace!(field = %target, "Age rule skipped: no reference date");
                        continue;
                    };
                    let Some(age) = age_on(born, reference) else {
                        continue;
                    };
                    candidates.push(Candidate {
                        target: target.clone(),
                        value: age.to_string(),
                        confidence: value.confidence * RELATIONSHIP_DISCOUNT,
                        reason: format!("Computed from {birth_date} ({born}) as of {reference}"),
                    });
                }
            }
        }

        candidates
    }
}

/// Whole years between `born` and `as_of`; `None` when born after `as_of`.
pub fn age_on(born: NaiveDate, as_of: NaiveDate) -> Option<u32> {
    if born > as_of {
        return None;
    }
    let mut years = as_of.year() - born.year();
    if (as_of.month(), as_of.day()) < (born.month(), born.day()) {
        years -= 1;
    }
    u32::try_from(years).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::enums::SectionType;
    use crate::pipeline::extraction::{FieldRef, FieldValue};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn age_respects_birthday() {
        assert_eq!(age_on(date(1948, 3, 14), date(2024, 3, 13)), Some(75));
        assert_eq!(age_on(date(1948, 3, 14), date(2024, 3, 14)), Some(76));
        assert_eq!(age_on(date(2030, 1, 1), date(2024, 1, 1)), None);
    }

    #[test]
    fn age_from_trusted_birth_date() {
        let mut rules = SuggestionRules::empty();
        rules.relationships.push(Relationship::AgeFromBirthDate {
            birth_date: FieldRef::new(SectionType::Demographics, "dateOfBirth"),
            target: FieldRef::new(SectionType::Demographics, "age"),
            as_of: Some(date(2024, 6, 1)),
        });
        let mut record = StructuredRecord::default();
        record.set(SectionType::Demographics, "dateOfBirth", FieldValue::new("1948-03-14", 0.9));

        let candidates = RelationshipProvider.propose(&record, &rules);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].value, "76");
        assert!((candidates[0].confidence - 0.81).abs() < 1e-6);
    }

    #[test]
    fn age_uses_rules_reference_date_and_never_the_clock() {
        let mut rules = SuggestionRules::empty();
        rules.relationships.push(Relationship::AgeFromBirthDate {
            birth_date: FieldRef::new(SectionType::Demographics, "dateOfBirth"),
            target: FieldRef::new(SectionType::Demographics, "age"),
            as_of: None,
        });
        let mut record = StructuredRecord::default();
        record.set(SectionType::Demographics, "dateOfBirth", FieldValue::new("1948-03-14", 0.9));

        assert!(RelationshipProvider.propose(&record, &rules).is_empty());

        rules.reference_date = Some(date(2024, 3, 13));
        let candidates = RelationshipProvider.propose(&record, &rules);
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].value, "75");
        assert!(candidates[0].reason.ends_with("as of 2024-03-13"));
    }

    #[test]
    fn untrusted_source_ignored() {
        let mut rules = SuggestionRules::empty();
        rules.relationships.push(Relationship::Mirror {
            source: FieldRef::new(SectionType::ReferralInformation, "clientName"),
            target: FieldRef::new(SectionType::Demographics, "name"),
        });
        let mut record = StructuredRecord::default();
        record.set(SectionType::ReferralInformation, "clientName", FieldValue::new("Jane Doe", 0.4));
        assert!(RelationshipProvider.propose(&record, &rules).is_empty());
    }
}
