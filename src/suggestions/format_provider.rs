//! Content provider for canonical value formats (dates, names, phones).

use super::rules::{FieldFormat, SuggestionRules};
use super::{Candidate, ContentProvider};
use crate::models::enums::SuggestionSource;
use crate::pipeline::extraction::normalize::{format_phone, iso_date, title_case};
use crate::pipeline::extraction::StructuredRecord;

pub const FORMAT_CONFIDENCE: f32 = 0.8;

pub struct FormatProvider;

impl ContentProvider for FormatProvider {
    fn source(&self) -> SuggestionSource {
        SuggestionSource::Pattern
    }

    fn propose(&self, record: &StructuredRecord, rules: &SuggestionRules) -> Vec<Candidate> {
        rules
            .formats
            .iter()
            .filter_map(|rule| {
                let current = record.get_ref(&rule.field).filter(|v| !v.is_blank())?;
                let (value, reason) = match rule.format {
                    FieldFormat::Date => (iso_date(&current.value)?, "Date normalized to YYYY-MM-DD"),
                    FieldFormat::PersonName => (title_case(&current.value), "Name capitalization"),
                    FieldFormat::Phone => (format_phone(&current.value)?, "Phone number format"),
                };
                Some(Candidate {
                    target: rule.field.clone(),
                    value,
                    confidence: FORMAT_CONFIDENCE,
                    reason: reason.to_string(),
                })
            })
            .collect()
    }
}
