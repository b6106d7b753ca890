//! Built-in rule tables for referral and in-home assessment documents.
//!
//! Used when no rules file is configured. Kept out of the engine so that a
//! deployment can replace any table without touching engine code.

use std::collections::BTreeMap;

use super::rules::{
    CrossSectionRule, DefaultValue, ExpectedField, FieldFormat, FieldKind, FormatRule,
    Relationship, SuggestionRules, VocabularyRule, DEFAULT_LOW_CONFIDENCE_THRESHOLD,
};
use crate::models::enums::{SectionType, Severity};
use crate::pipeline::extraction::FieldRef;

pub const MOBILITY_AIDS: &str = "mobility_aids";
pub const MEDICATIONS: &str = "medications";
pub const CONDITIONS: &str = "conditions";

const MOBILITY_AID_TERMS: &[&str] = &[
    "cane", "crutches", "rollator", "scooter", "walker", "wheelchair",
];

const MEDICATION_TERMS: &[&str] = &[
    "allopurinol", "amlodipine", "atorvastatin", "carvedilol", "clopidogrel",
    "digoxin", "donepezil", "furosemide", "gabapentin", "hydrochlorothiazide",
    "insulin", "levothyroxine", "lisinopril", "losartan", "metformin",
    "metoprolol", "omeprazole", "pantoprazole", "prednisone", "sertraline",
    "simvastatin", "tamsulosin", "tramadol", "warfarin",
];

const CONDITION_TERMS: &[&str] = &[
    "arthritis", "dementia", "diabetes", "emphysema", "glaucoma",
    "hypertension", "hypothyroidism", "neuropathy", "osteoporosis",
    "parkinson", "stroke",
];

fn field(section: SectionType, name: &str) -> FieldRef {
    FieldRef::new(section, name)
}

fn terms(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// The built-in rule set.
pub fn default_rules() -> SuggestionRules {
    use FieldKind::*;
    use SectionType::*;

    let vocabularies = BTreeMap::from([
        (MOBILITY_AIDS.to_string(), terms(MOBILITY_AID_TERMS)),
        (MEDICATIONS.to_string(), terms(MEDICATION_TERMS)),
        (CONDITIONS.to_string(), terms(CONDITION_TERMS)),
    ]);

    let checklists = BTreeMap::from([
        (
            Demographics,
            vec![
                ExpectedField::new("name", Identity),
                ExpectedField::new("dateOfBirth", Identity),
                ExpectedField::new("gender", Descriptive),
                ExpectedField::new("phone", Contact),
                ExpectedField::new("address", Contact),
            ],
        ),
        (
            ReferralInformation,
            vec![
                ExpectedField::new("referralDate", Administrative),
                ExpectedField::new("referralSource", Administrative),
                ExpectedField::new("reason", Clinical),
            ],
        ),
        (Allergies, vec![ExpectedField::new("allergies", Safety)]),
        (Medications, vec![ExpectedField::new("medications", Clinical)]),
        (
            Mobility,
            vec![
                ExpectedField::new("mobilityAid", Descriptive),
                ExpectedField::new("fallHistory", Safety),
            ],
        ),
        (SocialSupport, vec![ExpectedField::new("emergencyContact", Contact)]),
    ]);

    SuggestionRules {
        low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
        relationships: vec![
            Relationship::Mirror {
                source: field(ReferralInformation, "clientName"),
                target: field(Demographics, "name"),
            },
            Relationship::AgeFromBirthDate {
                birth_date: field(Demographics, "dateOfBirth"),
                target: field(Demographics, "age"),
                as_of: None,
            },
        ],
        formats: vec![
            FormatRule { field: field(Demographics, "dateOfBirth"), format: FieldFormat::Date },
            FormatRule { field: field(Demographics, "name"), format: FieldFormat::PersonName },
            FormatRule { field: field(Demographics, "phone"), format: FieldFormat::Phone },
            FormatRule { field: field(ReferralInformation, "referralDate"), format: FieldFormat::Date },
        ],
        vocabularies,
        vocabulary_fields: vec![
            VocabularyRule { field: field(Mobility, "mobilityAid"), vocabulary: MOBILITY_AIDS.into() },
            VocabularyRule { field: field(AssistiveDevices, "devices"), vocabulary: MOBILITY_AIDS.into() },
            VocabularyRule { field: field(Medications, "medications"), vocabulary: MEDICATIONS.into() },
            VocabularyRule { field: field(Diagnoses, "diagnoses"), vocabulary: CONDITIONS.into() },
        ],
        defaults: vec![DefaultValue {
            field: field(ReferralInformation, "priority"),
            value: "routine".into(),
            reason: "Referrals without a stated priority are triaged as routine".into(),
        }],
        cross_section: vec![
            CrossSectionRule::MentionedInList {
                mention: field(Mobility, "mobilityAid"),
                list: field(AssistiveDevices, "devices"),
                vocabulary: MOBILITY_AIDS.into(),
                severity: Severity::Medium,
            },
            CrossSectionRule::MentionedInList {
                mention: field(Mobility, "notes"),
                list: field(AssistiveDevices, "devices"),
                vocabulary: MOBILITY_AIDS.into(),
                severity: Severity::Medium,
            },
            CrossSectionRule::MustMatch {
                primary: field(Demographics, "name"),
                secondary: field(ReferralInformation, "clientName"),
                severity: Severity::High,
            },
            CrossSectionRule::MustMatch {
                primary: field(Demographics, "dateOfBirth"),
                secondary: field(ReferralInformation, "dateOfBirth"),
                severity: Severity::High,
            },
            CrossSectionRule::DateOrder {
                earlier: field(Demographics, "dateOfBirth"),
                later: field(ReferralInformation, "referralDate"),
                severity: Severity::High,
            },
        ],
        checklists,
        reference_date: None,
    }
}
