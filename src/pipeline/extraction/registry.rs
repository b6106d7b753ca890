use std::collections::BTreeMap;

use super::extractors::{default_extractor, FieldExtractor};
use super::types::{FieldMap, StructuredRecord, MAX_EXTRACTED_CONFIDENCE};
use crate::models::enums::SectionType;
use crate::pipeline::segmentation::confidence::clamp_unit;
use crate::pipeline::segmentation::Section;

/// Section type → extractor. Turns detected sections into a record.
pub struct ExtractorRegistry {
    extractors: BTreeMap<SectionType, Box<dyn FieldExtractor>>,
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl ExtractorRegistry {
    /// Registry with no extractors; every section yields an empty map.
    pub fn empty() -> Self {
        Self {
            extractors: BTreeMap::new(),
        }
    }

    /// Built-in extractor for every section type.
    pub fn with_defaults() -> Self {
        let extractors = SectionType::all()
            .iter()
            .map(|&section| (section, default_extractor(section)))
            .collect();
        Self { extractors }
    }

    /// Install `extractor` for `section`, replacing any previous one.
    pub fn register(&mut self, section: SectionType, extractor: Box<dyn FieldExtractor>) {
        self.extractors.insert(section, extractor);
    }

    /// Extract one section. Extractor failures are logged and produce an
    /// empty map; other sections are unaffected.
    pub fn extract_section(&self, section: &Section) -> FieldMap {
        let Some(extractor) = self.extractors.get(&section.section_type) else {
            tracing::debug!(section = %section.section_type, "No extractor registered");
            return FieldMap::new();
        };

        match extractor.extract(&section.content) {
            Ok(fields) => sanitize(section.section_type, fields),
            Err(e) => {
                tracing::warn!(
                    section = %section.section_type,
                    error = %e,
                    "Field extraction failed, section left empty"
                );
                FieldMap::new()
            }
        }
    }

    /// Build a record from detected sections. A section type seen more than
    /// once keeps, per field, the higher-confidence value.
    pub fn extract_record(&self, sections: &[Section]) -> StructuredRecord {
        let mut record = StructuredRecord::default();

        for section in sections {
            let fields = self.extract_section(section);
            let target = record.sections.entry(section.section_type).or_default();
            for (name, value) in fields {
                match target.get(&name) {
                    Some(existing) if existing.confidence >= value.confidence => {}
                    _ => {
                        target.insert(name, value);
                    }
                }
            }
        }

        tracing::debug!(
            sections = record.sections.len(),
            fields = record.fields().count(),
            "Structured record extracted"
        );
        record
    }
}

/// Drop fields with blank names or non-finite confidence; clamp the rest
/// below the confirmed level.
fn sanitize(section: SectionType, fields: FieldMap) -> FieldMap {
    fields
        .into_iter()
        .filter_map(|(name, mut value)| {
            let name = name.trim().to_string();
            if name.is_empty() || !value.confidence.is_finite() {
                tracing::warn!(section = %section, field = %name, "Malformed field dropped");
                return None;
            }
            value.confidence = clamp_unit(value.confidence).min(MAX_EXTRACTED_CONFIDENCE);
            Some((name, value))
        })
        .collect()
}
