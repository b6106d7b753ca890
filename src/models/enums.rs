use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Returned when a string does not name a variant of one of the enums below.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid enum value for {field}: {value}")]
pub struct ParseEnumError {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern.
/// Declaration order is significant: it drives `all()` and `Ord`.
macro_rules! str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $(#[serde(rename = $s)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(ParseEnumError {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(
    /// Closed set of section kinds found in referral and assessment documents.
    ///
    /// The header matcher walks section types in this declaration order, so
    /// when two types carry a pattern that matches the same line, the earlier
    /// variant wins.
    SectionType {
        Demographics => "demographics",
        ReferralInformation => "referral_information",
        MedicalHistory => "medical_history",
        Diagnoses => "diagnoses",
        Medications => "medications",
        Allergies => "allergies",
        FunctionalStatus => "functional_status",
        Mobility => "mobility",
        AssistiveDevices => "assistive_devices",
        CognitiveStatus => "cognitive_status",
        HomeEnvironment => "home_environment",
        SocialSupport => "social_support",
        SafetyConcerns => "safety_concerns",
        Goals => "goals",
        Recommendations => "recommendations",
    }
);

impl SectionType {
    /// Human heading for the section, as it usually appears in print.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Demographics => "demographics",
            Self::ReferralInformation => "referral information",
            Self::MedicalHistory => "medical history",
            Self::Diagnoses => "diagnoses",
            Self::Medications => "medications",
            Self::Allergies => "allergies",
            Self::FunctionalStatus => "functional status",
            Self::Mobility => "mobility",
            Self::AssistiveDevices => "assistive devices",
            Self::CognitiveStatus => "cognitive status",
            Self::HomeEnvironment => "home environment",
            Self::SocialSupport => "social support",
            Self::SafetyConcerns => "safety concerns",
            Self::Goals => "goals",
            Self::Recommendations => "recommendations",
        }
    }
}

str_enum!(DocumentType {
    Unknown => "unknown",
    InHomeAssessment => "in-home-assessment",
    Referral => "referral",
    DischargeSummary => "discharge-summary",
    ProgressNote => "progress-note",
});

str_enum!(DocumentStructure {
    Form => "form",
    Narrative => "narrative",
    Unknown => "unknown",
});

str_enum!(PatternPriority {
    Balanced => "balanced",
    SectionFirst => "section-first",
    ContentFirst => "content-first",
});

str_enum!(SuggestionSource {
    Pattern => "pattern",
    Relationship => "relationship",
    DomainKnowledge => "domain-knowledge",
});

str_enum!(Severity {
    Low => "low",
    Medium => "medium",
    High => "high",
});

str_enum!(Importance {
    Low => "low",
    Medium => "medium",
    High => "high",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn section_type_round_trips_through_str() {
        for section in SectionType::all() {
            assert_eq!(SectionType::from_str(section.as_str()).unwrap(), *section);
        }
    }

    #[test]
    fn unknown_value_reports_enum_name() {
        let err = SectionType::from_str("vitals").unwrap_err();
        assert_eq!(err.field, "SectionType");
        assert_eq!(err.value, "vitals");
    }

    #[test]
    fn ordering_follows_declaration() {
        assert!(SectionType::Demographics < SectionType::MedicalHistory);
        assert!(Severity::Low < Severity::High);
        assert!(Importance::Medium < Importance::High);
    }

    #[test]
    fn serde_uses_literal_names() {
        let json = serde_json::to_string(&SuggestionSource::DomainKnowledge).unwrap();
        assert_eq!(json, "\"domain-knowledge\"");
        let back: DocumentType = serde_json::from_str("\"in-home-assessment\"").unwrap();
        assert_eq!(back, DocumentType::InHomeAssessment);
    }
}
