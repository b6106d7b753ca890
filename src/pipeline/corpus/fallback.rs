//! Hand-authored patterns used when the labeled samples are too sparse.
//!
//! Header fallbacks are appended when a section mines fewer than five
//! patterns; contextual fallbacks top up sparse before/after lists. The
//! `before` lists are never mined from samples, so these are the only
//! `before` signals a corpus ever carries.

use super::types::Pattern;
use crate::models::enums::SectionType;

/// Frequency recorded for manual patterns: never observed in samples.
pub const MANUAL_FREQUENCY: u32 = 0;

fn table(entries: &[(&str, f32)]) -> Vec<Pattern> {
    entries
        .iter()
        .map(|(text, confidence)| Pattern::new(*text, *confidence, MANUAL_FREQUENCY))
        .collect()
}

/// Header fallbacks, confidence 0.7–0.9.
pub fn header_patterns(section: SectionType) -> Vec<Pattern> {
    match section {
        SectionType::Demographics => table(&[
            ("demographics", 0.9),
            ("patient information", 0.85),
            ("client information", 0.8),
            ("identifying information", 0.75),
        ]),
        SectionType::ReferralInformation => table(&[
            ("referral information", 0.9),
            ("reason for referral", 0.85),
            ("referral source", 0.8),
            ("referred by", 0.7),
        ]),
        SectionType::MedicalHistory => table(&[
            ("medical history", 0.9),
            ("past medical history", 0.9),
            ("health history", 0.8),
            ("relevant history", 0.7),
        ]),
        SectionType::Diagnoses => table(&[
            ("diagnoses", 0.9),
            ("diagnosis", 0.85),
            ("primary diagnosis", 0.85),
        ]),
        SectionType::Medications => table(&[
            ("medications", 0.9),
            ("current medications", 0.9),
            ("medication list", 0.85),
        ]),
        SectionType::Allergies => table(&[
            ("allergies", 0.9),
            ("known allergies", 0.85),
            ("drug allergies", 0.8),
        ]),
        SectionType::FunctionalStatus => table(&[
            ("functional status", 0.9),
            ("activities of daily living", 0.85),
            ("adl status", 0.8),
            ("self care", 0.7),
        ]),
        SectionType::Mobility => table(&[
            ("mobility", 0.9),
            ("mobility status", 0.85),
            ("transfers and ambulation", 0.8),
            ("gait", 0.7),
        ]),
        SectionType::AssistiveDevices => table(&[
            ("assistive devices", 0.9),
            ("durable medical equipment", 0.85),
            ("adaptive equipment", 0.8),
            ("equipment", 0.7),
        ]),
        SectionType::CognitiveStatus => table(&[
            ("cognitive status", 0.9),
            ("cognition", 0.85),
            ("mental status", 0.8),
        ]),
        SectionType::HomeEnvironment => table(&[
            ("home environment", 0.9),
            ("home setup", 0.8),
            ("living situation", 0.8),
            ("home layout", 0.75),
        ]),
        SectionType::SocialSupport => table(&[
            ("social support", 0.9),
            ("social history", 0.85),
            ("caregiver support", 0.8),
        ]),
        SectionType::SafetyConcerns => table(&[
            ("safety concerns", 0.9),
            ("safety", 0.8),
            ("fall risk", 0.8),
        ]),
        SectionType::Goals => table(&[
            ("goals", 0.9),
            ("client goals", 0.85),
            ("treatment goals", 0.85),
        ]),
        SectionType::Recommendations => table(&[
            ("recommendations", 0.9),
            ("plan", 0.7),
            ("plan of care", 0.85),
        ]),
    }
}

/// Contextual fallback that can open a section on its own under form
/// weighting (`0.5 * 0.7 = 0.35`).
pub const STRONG_CONTEXT: f32 = 0.5;

/// Contextual fallback that only ever supports other evidence
/// (`0.35 * 0.7 = 0.245`, below every strategy threshold).
pub const WEAK_CONTEXT: f32 = 0.35;

/// Lines that typically close the previous section or head a form, just
/// above the section header. Never header text itself: header neighbours
/// are ignored by the detector.
pub fn before_patterns(section: SectionType) -> Vec<Pattern> {
    let texts: &[&str] = match section {
        SectionType::Demographics => &["intake form", "assessment date"],
        SectionType::ReferralInformation => &["referral form", "date received"],
        SectionType::MedicalHistory => &["onset date"],
        SectionType::Diagnoses => &["past surgical history"],
        SectionType::Medications => &["icd-10"],
        SectionType::Allergies => &["prn"],
        SectionType::FunctionalStatus => &["reaction:"],
        SectionType::Mobility => &["adl score"],
        SectionType::AssistiveDevices => &["gait pattern"],
        SectionType::CognitiveStatus => &["equipment in home"],
        SectionType::HomeEnvironment => &["mmse score", "moca score"],
        SectionType::SocialSupport => &["entrance steps"],
        SectionType::SafetyConcerns => &["emergency contact"],
        SectionType::Goals => &["fall risk score"],
        SectionType::Recommendations => &["long-term goal"],
    };
    texts
        .iter()
        .map(|text| Pattern::new(*text, WEAK_CONTEXT, MANUAL_FREQUENCY))
        .collect()
}

/// Form labels that typically sit right below the section header. Only
/// labels specific to one section are strong.
pub fn after_patterns(section: SectionType) -> Vec<Pattern> {
    match section {
        SectionType::Demographics => table(&[
            ("date of birth", STRONG_CONTEXT),
            ("dob:", WEAK_CONTEXT),
            ("gender:", WEAK_CONTEXT),
        ]),
        SectionType::ReferralInformation => table(&[
            ("referral date", STRONG_CONTEXT),
            ("referring physician", STRONG_CONTEXT),
            ("referral reason", WEAK_CONTEXT),
        ]),
        SectionType::MedicalHistory => table(&[("pmh", WEAK_CONTEXT), ("history of", WEAK_CONTEXT)]),
        SectionType::Diagnoses => table(&[
            ("icd-10", STRONG_CONTEXT),
            ("icd code", STRONG_CONTEXT),
            ("secondary diagnosis", WEAK_CONTEXT),
        ]),
        SectionType::Medications => table(&[
            ("medication name", WEAK_CONTEXT),
            ("dosage", WEAK_CONTEXT),
            ("frequency:", WEAK_CONTEXT),
        ]),
        SectionType::Allergies => table(&[
            ("nkda", STRONG_CONTEXT),
            ("no known allergies", STRONG_CONTEXT),
            ("reaction:", WEAK_CONTEXT),
        ]),
        SectionType::FunctionalStatus => table(&[
            ("independent with adls", STRONG_CONTEXT),
            ("adls", WEAK_CONTEXT),
        ]),
        SectionType::Mobility => table(&[
            ("ambulation:", WEAK_CONTEXT),
            ("gait speed", WEAK_CONTEXT),
            ("transfers:", WEAK_CONTEXT),
        ]),
        SectionType::AssistiveDevices => table(&[
            ("dme", STRONG_CONTEXT),
            ("equipment owned", WEAK_CONTEXT),
            ("equipment in home", WEAK_CONTEXT),
        ]),
        SectionType::CognitiveStatus => table(&[
            ("mmse", STRONG_CONTEXT),
            ("moca", STRONG_CONTEXT),
            ("orientation:", WEAK_CONTEXT),
        ]),
        SectionType::HomeEnvironment => table(&[
            ("dwelling type", STRONG_CONTEXT),
            ("type of residence", WEAK_CONTEXT),
            ("entrance:", WEAK_CONTEXT),
        ]),
        SectionType::SocialSupport => table(&[
            ("lives with", WEAK_CONTEXT),
            ("primary caregiver", WEAK_CONTEXT),
            ("emergency contact", WEAK_CONTEXT),
        ]),
        SectionType::SafetyConcerns => table(&[
            ("fall risk score", STRONG_CONTEXT),
            ("hazards identified", WEAK_CONTEXT),
        ]),
        SectionType::Goals => table(&[
            ("short-term goal", STRONG_CONTEXT),
            ("long-term goal", STRONG_CONTEXT),
            ("goal date", WEAK_CONTEXT),
        ]),
        SectionType::Recommendations => table(&[
            ("recommended equipment", STRONG_CONTEXT),
            ("referrals to", WEAK_CONTEXT),
            ("follow-up", WEAK_CONTEXT),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_fallbacks_within_confidence_band() {
        for section in SectionType::all() {
            for p in header_patterns(*section) {
                assert!((0.7..=0.9).contains(&p.confidence), "{} = {}", p.text, p.confidence);
                assert_eq!(p.frequency, MANUAL_FREQUENCY);
            }
        }
    }

    #[test]
    fn fallback_texts_are_lowercase() {
        for section in SectionType::all() {
            let all = header_patterns(*section)
                .into_iter()
                .chain(before_patterns(*section))
                .chain(after_patterns(*section));
            for p in all {
                assert_eq!(p.text, p.text.to_lowercase());
            }
        }
    }

    #[test]
    fn contextual_fallbacks_are_weak_or_strong() {
        let form_weight = 0.7;
        for section in SectionType::all() {
            for p in before_patterns(*section) {
                assert!(p.confidence * form_weight < 0.25, "{}", p.text);
            }
            for p in after_patterns(*section) {
                assert!(
                    p.confidence == WEAK_CONTEXT || p.confidence == STRONG_CONTEXT,
                    "{} = {}",
                    p.text,
                    p.confidence
                );
                assert!(p.confidence * form_weight < 0.36, "{}", p.text);
            }
        }
    }

    #[test]
    fn body_words_are_not_contextual_fallbacks() {
        for section in SectionType::all() {
            let texts: Vec<String> = before_patterns(*section)
                .into_iter()
                .chain(after_patterns(*section))
                .map(|p| p.text)
                .collect();
            for word in ["walker", "fall", "daily", "tablet", "goal", "phone"] {
                assert!(!texts.iter().any(|t| t == word), "{section}: {word}");
            }
        }
    }

    #[test]
    fn contextual_fallbacks_are_not_header_patterns() {
        let headers: Vec<String> = SectionType::all()
            .iter()
            .flat_map(|s| header_patterns(*s))
            .map(|p| p.text)
            .collect();
        for section in SectionType::all() {
            for p in before_patterns(*section).into_iter().chain(after_patterns(*section)) {
                assert!(!headers.contains(&p.text), "{section}: {}", p.text);
            }
        }
    }

    #[test]
    fn every_section_has_contextual_fallbacks() {
        for section in SectionType::all() {
            assert!(!before_patterns(*section).is_empty());
            assert!(!after_patterns(*section).is_empty());
        }
    }
}
