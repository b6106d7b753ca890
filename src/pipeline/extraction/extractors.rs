//! Built-in field extractors.
//!
//! Each extractor turns the content of one section into a `FieldMap`.
//! They are deterministic, side-effect free and never panic; a value the
//! extractor is unsure of is kept with a lowered confidence so the
//! suggestion engine can propose a correction.

use std::sync::LazyLock;

use regex::Regex;

use super::normalize::{is_canonical_phone, is_iso_date, is_title_case, parse_date};
use super::types::{FieldMap, FieldValue};
use super::ExtractionError;
use crate::models::enums::SectionType;

/// Per-section extraction strategy.
pub trait FieldExtractor: Send + Sync {
    fn extract(&self, content: &str) -> Result<FieldMap, ExtractionError>;
}

// ═══════════════════════════════════════════════════════════
// Confidence levels
// ═══════════════════════════════════════════════════════════

/// Value taken from an explicit `Label: value` line.
pub const LABELED_CONFIDENCE: f32 = 0.9;
/// Value found by a free-text pattern.
pub const PATTERN_CONFIDENCE: f32 = 0.7;
/// Value present but in a non-canonical shape.
pub const NON_CANONICAL_CONFIDENCE: f32 = 0.5;
/// Guess from weak evidence.
pub const WEAK_CONFIDENCE: f32 = 0.4;
/// Label present, value unreadable.
pub const UNRESOLVED_CONFIDENCE: f32 = 0.0;

const NOTES_FIELD: &str = "notes";

static LABEL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z0-9 #/()'&.-]{0,40}?)\s*:\s*(.*)$").unwrap()
});

static LIST_BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s*").unwrap());

// ═══════════════════════════════════════════════════════════
// Key / value
// ═══════════════════════════════════════════════════════════

/// `"Date of Birth"` → `"dateOfBirth"`.
pub fn camel_case_key(label: &str) -> String {
    let mut key = String::new();
    for (i, word) in label
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .enumerate()
    {
        let lower = word.to_lowercase();
        if i == 0 {
            key.push_str(&lower);
        } else {
            let mut chars = lower.chars();
            if let Some(first) = chars.next() {
                key.extend(first.to_uppercase());
                key.push_str(chars.as_str());
            }
        }
    }
    key
}

/// Split a `Label: value` line. Labels ending in a digit are rejected so
/// clock times (`"seen at 10:30"`) stay free text.
fn parse_label_line(line: &str) -> Option<(String, String)> {
    let caps = LABEL_LINE.captures(line)?;
    let label = caps.get(1)?.as_str().trim();
    if label.ends_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    let key = camel_case_key(label);
    if key.is_empty() {
        return None;
    }
    let value = caps.get(2).map_or("", |m| m.as_str()).trim().to_string();
    Some((key, value))
}

fn labeled_fields(content: &str) -> FieldMap {
    let mut fields = FieldMap::new();
    let mut notes = Vec::new();

    for line in content.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match parse_label_line(line) {
            Some((key, value)) => {
                let confidence = if value.is_empty() {
                    UNRESOLVED_CONFIDENCE
                } else {
                    LABELED_CONFIDENCE
                };
                fields
                    .entry(key)
                    .or_insert_with(|| FieldValue::new(value, confidence));
            }
            None => notes.push(line),
        }
    }

    if !notes.is_empty() {
        fields
            .entry(NOTES_FIELD.to_string())
            .or_insert_with(|| FieldValue::new(notes.join(" "), PATTERN_CONFIDENCE));
    }
    fields
}

/// Generic extractor: `Label: value` lines become camelCase fields, the
/// remaining lines are joined into `notes`.
#[derive(Debug, Clone, Default)]
pub struct KeyValueExtractor;

impl FieldExtractor for KeyValueExtractor {
    fn extract(&self, content: &str) -> Result<FieldMap, ExtractionError> {
        Ok(labeled_fields(content))
    }
}

/// Move `alias` onto `canonical` unless `canonical` is already present.
fn apply_aliases(fields: &mut FieldMap, aliases: &[(&str, &str)]) {
    for (alias, canonical) in aliases {
        if let Some(value) = fields.remove(*alias) {
            fields.entry(canonical.to_string()).or_insert(value);
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Demographics
// ═══════════════════════════════════════════════════════════

const DEMOGRAPHIC_ALIASES: &[(&str, &str)] = &[
    ("clientName", "name"),
    ("patientName", "name"),
    ("fullName", "name"),
    ("client", "name"),
    ("patient", "name"),
    ("dob", "dateOfBirth"),
    ("birthDate", "dateOfBirth"),
    ("dateOfBirthDob", "dateOfBirth"),
    ("sex", "gender"),
    ("phoneNumber", "phone"),
    ("telephone", "phone"),
    ("tel", "phone"),
    ("homePhone", "phone"),
    ("homeAddress", "address"),
    ("streetAddress", "address"),
];

static NAME_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Z][A-Za-z'-]+(?:\s+[A-Z][A-Za-z'-]+)+)\s*(?:,|$)").unwrap()
});

static AGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bage[:\s]+(\d{1,3})\b|\b(\d{1,3})\s*(?:y/?o|years?[\s-]+old)\b").unwrap()
});

static GENDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(male|female|non-binary)\b").unwrap());

static DOB_INLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:dob|d\.o\.b\.|born)\b[:\s]*(\d{4}-\d{2}-\d{2}|\d{1,2}[/-]\d{1,2}[/-]\d{4})")
        .unwrap()
});

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(?\b\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b").unwrap());

/// Identity and contact fields: `name`, `dateOfBirth`, `age`, `gender`,
/// `phone`, `address`.
#[derive(Debug, Clone, Default)]
pub struct DemographicsExtractor;

impl FieldExtractor for DemographicsExtractor {
    fn extract(&self, content: &str) -> Result<FieldMap, ExtractionError> {
        let mut fields = labeled_fields(content);
        apply_aliases(&mut fields, DEMOGRAPHIC_ALIASES);

        if !fields.contains_key("name") {
            let first = content.lines().map(str::trim).find(|l| !l.is_empty());
            if let Some(caps) = first.and_then(|l| NAME_LINE.captures(l)) {
                fields.insert("name".into(), FieldValue::new(&caps[1], NON_CANONICAL_CONFIDENCE));
            }
        } else if let Some(name) = fields.get_mut("name") {
            if !name.is_blank() && !is_title_case(&name.value) {
                name.confidence = name.confidence.min(NON_CANONICAL_CONFIDENCE);
            }
        }

        if !fields.contains_key("age") {
            if let Some(caps) = AGE.captures(content) {
                if let Some(age) = caps.get(1).or_else(|| caps.get(2)) {
                    fields.insert("age".into(), FieldValue::new(age.as_str(), PATTERN_CONFIDENCE));
                }
            }
        }

        if !fields.contains_key("gender") {
            if let Some(caps) = GENDER.captures(content) {
                fields.insert(
                    "gender".into(),
                    FieldValue::new(caps[1].to_lowercase(), WEAK_CONFIDENCE),
                );
            }
        }

        match fields.get_mut("dateOfBirth") {
            Some(dob) if !dob.is_blank() => {
                if parse_date(&dob.value).is_none() {
                    dob.confidence = dob.confidence.min(WEAK_CONFIDENCE);
                } else if !is_iso_date(&dob.value) {
                    dob.confidence = dob.confidence.min(NON_CANONICAL_CONFIDENCE);
                }
            }
            Some(_) => {}
            None => {
                if let Some(caps) = DOB_INLINE.captures(content) {
                    let confidence = if is_iso_date(&caps[1]) {
                        PATTERN_CONFIDENCE
                    } else {
                        NON_CANONICAL_CONFIDENCE
                    };
                    fields.insert("dateOfBirth".into(), FieldValue::new(&caps[1], confidence));
                }
            }
        }

        match fields.get_mut("phone") {
            Some(phone) if !phone.is_blank() => {
                if !is_canonical_phone(&phone.value) {
                    phone.confidence = phone.confidence.min(NON_CANONICAL_CONFIDENCE);
                }
            }
            Some(_) => {}
            None => {
                if let Some(m) = PHONE.find(content) {
                    let confidence = if is_canonical_phone(m.as_str()) {
                        PATTERN_CONFIDENCE
                    } else {
                        NON_CANONICAL_CONFIDENCE
                    };
                    fields.insert("phone".into(), FieldValue::new(m.as_str(), confidence));
                }
            }
        }

        Ok(fields)
    }
}

// ═══════════════════════════════════════════════════════════
// Mobility
// ═══════════════════════════════════════════════════════════

/// Aids recognised in free text, most specific first.
const MOBILITY_AIDS: &[&str] = &[
    "rolling walker",
    "wheelchair",
    "rollator",
    "walker",
    "crutches",
    "quad cane",
    "cane",
    "scooter",
];

static NO_FALLS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:no|denies|denied)\s+(?:recent\s+|history\s+of\s+)?falls?\b").unwrap()
});

static FALLS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\b(?:falls?|fell|fallen)\b").unwrap());

/// Key/value fields plus `mobilityAid` and `fallHistory` from free text.
#[derive(Debug, Clone, Default)]
pub struct MobilityExtractor;

impl FieldExtractor for MobilityExtractor {
    fn extract(&self, content: &str) -> Result<FieldMap, ExtractionError> {
        let mut fields = labeled_fields(content);
        apply_aliases(
            &mut fields,
            &[("aid", "mobilityAid"), ("mobilityDevice", "mobilityAid"), ("falls", "fallHistory")],
        );

        if !fields.contains_key("mobilityAid") {
            let lower = content.to_lowercase();
            if let Some(aid) = MOBILITY_AIDS.iter().find(|aid| lower.contains(*aid)) {
                fields.insert("mobilityAid".into(), FieldValue::new(*aid, PATTERN_CONFIDENCE));
            }
        }

        if !fields.contains_key("fallHistory") {
            if NO_FALLS.is_match(content) {
                fields.insert(
                    "fallHistory".into(),
                    FieldValue::new("none reported", PATTERN_CONFIDENCE),
                );
            } else if let Some(line) = content.lines().map(str::trim).find(|l| FALLS.is_match(l)) {
                fields.insert("fallHistory".into(), FieldValue::new(line, WEAK_CONFIDENCE));
            }
        }

        Ok(fields)
    }
}

// ═══════════════════════════════════════════════════════════
// Lists
// ═══════════════════════════════════════════════════════════

/// Bulleted, numbered or comma separated items joined into one field.
#[derive(Debug, Clone)]
pub struct ListExtractor {
    field: String,
}

impl ListExtractor {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }
}

/// Split list content into unique items, preserving first-seen order.
pub fn list_items(content: &str) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    for line in content.lines() {
        let line = LIST_BULLET.replace(line, "");
        for item in line.split([',', ';']).map(str::trim).filter(|s| !s.is_empty()) {
            if !items.iter().any(|seen| seen.eq_ignore_ascii_case(item)) {
                items.push(item.to_string());
            }
        }
    }
    items
}

impl FieldExtractor for ListExtractor {
    fn extract(&self, content: &str) -> Result<FieldMap, ExtractionError> {
        let mut fields = FieldMap::new();
        let items = list_items(content);
        if !items.is_empty() {
            fields.insert(
                self.field.clone(),
                FieldValue::new(items.join(", "), PATTERN_CONFIDENCE),
            );
        }
        Ok(fields)
    }
}

/// Built-in extractor for a section type.
pub fn default_extractor(section: SectionType) -> Box<dyn FieldExtractor> {
    match section {
        SectionType::Demographics => Box::new(DemographicsExtractor),
        SectionType::Mobility => Box::new(MobilityExtractor),
        SectionType::AssistiveDevices => Box::new(ListExtractor::new("devices")),
        SectionType::Medications => Box::new(ListExtractor::new("medications")),
        SectionType::Allergies => Box::new(ListExtractor::new("allergies")),
        SectionType::Diagnoses => Box::new(ListExtractor::new("diagnoses")),
        _ => Box::new(KeyValueExtractor),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Key / value ──────────────────────────────────────

    #[test]
    fn camel_case_keys() {
        assert_eq!(camel_case_key("Date of Birth"), "dateOfBirth");
        assert_eq!(camel_case_key("PHONE #"), "phone");
        assert_eq!(camel_case_key("primary care physician"), "primaryCarePhysician");
    }

    #[test]
    fn key_value_lines_and_notes() {
        let fields = KeyValueExtractor
            .extract("Referral Source: Dr. Patel\nReason: home safety\nLives alone since 2019")
            .unwrap();
        assert_eq!(fields["referralSource"].value, "Dr. Patel");
        assert_eq!(fields["reason"].confidence, LABELED_CONFIDENCE);
        assert_eq!(fields["notes"].value, "Lives alone since 2019");
    }

    #[test]
    fn empty_label_is_unresolved() {
        let fields = KeyValueExtractor.extract("Caregiver:").unwrap();
        assert_eq!(fields["caregiver"].value, "");
        assert_eq!(fields["caregiver"].confidence, UNRESOLVED_CONFIDENCE);
    }

    #[test]
    fn clock_times_are_not_labels() {
        let fields = KeyValueExtractor.extract("Visit at 10:30").unwrap();
        assert_eq!(fields.len(), 1);
        assert!(fields.contains_key("notes"));
    }

    #[test]
    fn empty_content_gives_empty_map() {
        assert!(KeyValueExtractor.extract("").unwrap().is_empty());
    }

    // ── Demographics ─────────────────────────────────────

    #[test]
    fn demographics_from_free_text() {
        let fields = DemographicsExtractor.extract("John Smith, age 45").unwrap();
        assert_eq!(fields["name"].value, "John Smith");
        assert_eq!(fields["age"].value, "45");
    }

    #[test]
    fn demographics_aliases_and_scoring() {
        let content = "Client Name: JANE DOE\nDOB: 03/14/1948\nSex: Female\nTel: 555.123.4567";
        let fields = DemographicsExtractor.extract(content).unwrap();
        assert_eq!(fields["name"].value, "JANE DOE");
        assert_eq!(fields["name"].confidence, NON_CANONICAL_CONFIDENCE);
        assert_eq!(fields["dateOfBirth"].value, "03/14/1948");
        assert_eq!(fields["dateOfBirth"].confidence, NON_CANONICAL_CONFIDENCE);
        assert_eq!(fields["gender"].value, "Female");
        assert_eq!(fields["phone"].confidence, NON_CANONICAL_CONFIDENCE);
        assert!(!fields.contains_key("dob"));
    }

    #[test]
    fn iso_dob_keeps_labeled_confidence() {
        let fields = DemographicsExtractor.extract("Date of Birth: 1948-03-14").unwrap();
        assert_eq!(fields["dateOfBirth"].confidence, LABELED_CONFIDENCE);
    }

    #[test]
    fn unreadable_dob_is_weak() {
        let fields = DemographicsExtractor.extract("DOB: sometime in spring").unwrap();
        assert_eq!(fields["dateOfBirth"].confidence, WEAK_CONFIDENCE);
    }

    #[test]
    fn inline_dob_and_phone() {
        let fields = DemographicsExtractor
            .extract("Mary Jones, born 1950-07-02, 82 y/o female, (555) 987-6543")
            .unwrap();
        assert_eq!(fields["dateOfBirth"].value, "1950-07-02");
        assert_eq!(fields["age"].value, "82");
        assert_eq!(fields["gender"].value, "female");
        assert_eq!(fields["phone"].value, "(555) 987-6543");
        assert_eq!(fields["phone"].confidence, PATTERN_CONFIDENCE);
    }

    // ── Mobility ─────────────────────────────────────────

    #[test]
    fn mobility_aid_and_falls() {
        let fields = MobilityExtractor
            .extract("Ambulates with a rolling walker indoors.\nFell twice in March.")
            .unwrap();
        assert_eq!(fields["mobilityAid"].value, "rolling walker");
        assert_eq!(fields["fallHistory"].value, "Fell twice in March.");
    }

    #[test]
    fn denied_falls() {
        let fields = MobilityExtractor.extract("Denies falls. Independent.").unwrap();
        assert_eq!(fields["fallHistory"].value, "none reported");
        assert!(!fields.contains_key("mobilityAid"));
    }

    // ── Lists ────────────────────────────────────────────

    #[test]
    fn list_items_from_bullets_and_commas() {
        let content = "- Shower chair\n- Grab bars, raised toilet seat\n2. shower chair";
        assert_eq!(
            list_items(content),
            vec!["Shower chair", "Grab bars", "raised toilet seat"]
        );
        let fields = ListExtractor::new("devices").extract(content).unwrap();
        assert_eq!(fields["devices"].value, "Shower chair, Grab bars, raised toilet seat");
    }

    #[test]
    fn empty_list_has_no_field() {
        assert!(ListExtractor::new("allergies").extract("\n\n").unwrap().is_empty());
    }

    #[test]
    fn defaults_cover_list_sections() {
        let fields = default_extractor(SectionType::Medications)
            .extract("Metformin 500 mg")
            .unwrap();
        assert!(fields.contains_key("medications"));
    }
}
