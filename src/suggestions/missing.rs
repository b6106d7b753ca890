//! Missing-information detection against per-section checklists.
//!
//! Importance always comes from the field kind, never from confidence.
//! An absent section yields one section-level entry (`field: None`) followed
//! by one entry per expected field.

use super::rules::SuggestionRules;
use super::MissingInformation;
use crate::models::enums::Importance;
use crate::pipeline::extraction::StructuredRecord;

pub fn detect_missing(record: &StructuredRecord, rules: &SuggestionRules) -> Vec<MissingInformation> {
    let mut missing = Vec::new();

    for (&section, expected) in &rules.checklists {
        if expected.is_empty() {
            continue;
        }

        let Some(fields) = record.section(section) else {
            let importance = expected
                .iter()
                .map(|f| f.kind.importance())
                .max()
                .unwrap_or(Importance::Low);
            missing.push(MissingInformation {
                section,
                field: None,
                importance,
                reason: format!("No {} section found", section.label()),
            });
            missing.extend(expected.iter().map(|field| MissingInformation {
                section,
                field: Some(field.name.clone()),
                importance: field.kind.importance(),
                reason: format!("{} not found: no {} section", field.name, section.label()),
            }));
            continue;
        };

        for field in expected {
            let reason = match fields.get(&field.name) {
                Some(value) if !value.is_blank() => continue,
                Some(_) => format!("{} is blank in {}", field.name, section.label()),
                None => format!("{} not found in {}", field.name, section.label()),
            };
            missing.push(MissingInformation {
                section,
                field: Some(field.name.clone()),
                importance: field.kind.importance(),
                reason,
            });
        }
    }

    missing
}
