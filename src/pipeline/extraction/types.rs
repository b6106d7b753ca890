use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::enums::SectionType;

/// Confidence of a value a reviewer has accepted.
pub const CONFIRMED_CONFIDENCE: f32 = 1.0;

/// Ceiling for extractor output, so no extracted value reads as confirmed.
pub const MAX_EXTRACTED_CONFIDENCE: f32 = 0.99;

/// One extracted field value with its confidence in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldValue {
    pub value: String,
    pub confidence: f32,
}

impl FieldValue {
    pub fn new(value: impl Into<String>, confidence: f32) -> Self {
        Self {
            value: value.into(),
            confidence,
        }
    }

    /// Value accepted by a reviewer.
    pub fn confirmed(value: impl Into<String>) -> Self {
        Self::new(value, CONFIRMED_CONFIDENCE)
    }

    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    pub fn is_confirmed(&self) -> bool {
        self.confidence >= CONFIRMED_CONFIDENCE
    }
}

/// Fields of one section, keyed by camelCase field name.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Section type → fields. Serializes as `{"demographics": {"name": ...}}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredRecord {
    pub sections: BTreeMap<SectionType, FieldMap>,
}

impl StructuredRecord {
    pub fn section(&self, section: SectionType) -> Option<&FieldMap> {
        self.sections.get(&section)
    }

    pub fn has_section(&self, section: SectionType) -> bool {
        self.sections.contains_key(&section)
    }

    pub fn get(&self, section: SectionType, field: &str) -> Option<&FieldValue> {
        self.sections.get(&section)?.get(field)
    }

    pub fn get_ref(&self, field: &FieldRef) -> Option<&FieldValue> {
        self.get(field.section, &field.field)
    }

    pub fn set(&mut self, section: SectionType, field: impl Into<String>, value: FieldValue) {
        self.sections
            .entry(section)
            .or_default()
            .insert(field.into(), value);
    }

    /// Every field in section order, then field-name order.
    pub fn fields(&self) -> impl Iterator<Item = (SectionType, &str, &FieldValue)> {
        self.sections.iter().flat_map(|(section, fields)| {
            fields
                .iter()
                .map(move |(name, value)| (*section, name.as_str(), value))
        })
    }
}

/// Address of a field inside a record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldRef {
    pub section: SectionType,
    pub field: String,
}

impl FieldRef {
    pub fn new(section: SectionType, field: impl Into<String>) -> Self {
        Self {
            section,
            field: field.into(),
        }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section, self.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_as_nested_map() {
        let mut record = StructuredRecord::default();
        record.set(SectionType::Demographics, "name", FieldValue::new("Jane Doe", 0.9));
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["demographics"]["name"]["value"], "Jane Doe");

        let back: StructuredRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn fields_iterate_in_section_order() {
        let mut record = StructuredRecord::default();
        record.set(SectionType::Mobility, "mobilityAid", FieldValue::new("walker", 0.7));
        record.set(SectionType::Demographics, "name", FieldValue::new("Jane Doe", 0.9));
        let order: Vec<_> = record.fields().map(|(s, f, _)| (s, f.to_string())).collect();
        assert_eq!(order[0].0, SectionType::Demographics);
        assert_eq!(order[1].1, "mobilityAid");
    }

    #[test]
    fn blank_and_confirmed() {
        assert!(FieldValue::new("  ", 0.4).is_blank());
        assert!(FieldValue::confirmed("x").is_confirmed());
        assert!(!FieldValue::new("x", 0.99).is_confirmed());
    }

    #[test]
    fn field_ref_display() {
        let r = FieldRef::new(SectionType::AssistiveDevices, "devices");
        assert_eq!(r.to_string(), "assistive_devices.devices");
    }
}
