//! Externally configured tables driving the suggestion engine.
//!
//! Every table is serde-loadable so deployments can ship their own JSON
//! rules file; `knowledge::default_rules` provides the built-in set.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::enums::{Importance, SectionType, Severity};
use crate::pipeline::extraction::FieldRef;

pub const DEFAULT_LOW_CONFIDENCE_THRESHOLD: f32 = 0.6;

#[derive(Error, Debug)]
pub enum RulesError {
    #[error("Suggestion rules not found at {0}")]
    NotFound(PathBuf),

    #[error("Malformed suggestion rules: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// ═══════════════════════════════════════════════════════════
// Content rules
// ═══════════════════════════════════════════════════════════

/// A same-document relationship implying a field's value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relationship {
    /// `target` should hold the same value as `source`.
    Mirror { source: FieldRef, target: FieldRef },
    /// `target` is the age in whole years at `as_of`, falling back to
    /// `SuggestionRules::reference_date`. Skipped when neither is set.
    AgeFromBirthDate {
        birth_date: FieldRef,
        target: FieldRef,
        #[serde(default)]
        as_of: Option<NaiveDate>,
    },
}

impl Relationship {
    pub fn target(&self) -> &FieldRef {
        match self {
            Relationship::Mirror { target, .. } | Relationship::AgeFromBirthDate { target, .. } => {
                target
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFormat {
    /// ISO `YYYY-MM-DD`.
    Date,
    /// Title case.
    PersonName,
    /// `(xxx) xxx-xxxx`.
    Phone,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatRule {
    pub field: FieldRef,
    pub format: FieldFormat,
}

/// Field whose words are corrected against a named vocabulary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VocabularyRule {
    pub field: FieldRef,
    pub vocabulary: String,
}

/// Value proposed for an empty field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultValue {
    pub field: FieldRef,
    pub value: String,
    pub reason: String,
}

// ═══════════════════════════════════════════════════════════
// Cross-section rules
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CrossSectionRule {
    /// Vocabulary terms mentioned in `mention` must appear in `list`.
    MentionedInList {
        mention: FieldRef,
        list: FieldRef,
        vocabulary: String,
        severity: Severity,
    },
    /// Both fields describe the same fact.
    MustMatch {
        primary: FieldRef,
        secondary: FieldRef,
        severity: Severity,
    },
    /// `earlier` must not be after `later`.
    DateOrder {
        earlier: FieldRef,
        later: FieldRef,
        severity: Severity,
    },
}

// ═══════════════════════════════════════════════════════════
// Checklists
// ═══════════════════════════════════════════════════════════

/// Field category; fixes the importance of a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Identity,
    Safety,
    Clinical,
    Contact,
    Administrative,
    Descriptive,
}

impl FieldKind {
    pub fn importance(self) -> Importance {
        match self {
            FieldKind::Identity | FieldKind::Safety => Importance::High,
            FieldKind::Clinical | FieldKind::Contact => Importance::Medium,
            FieldKind::Administrative | FieldKind::Descriptive => Importance::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedField {
    pub name: String,
    pub kind: FieldKind,
}

impl ExpectedField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Rule set
// ═══════════════════════════════════════════════════════════

fn default_threshold() -> f32 {
    DEFAULT_LOW_CONFIDENCE_THRESHOLD
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionRules {
    /// Fields below this confidence are candidates for content suggestions.
    #[serde(default = "default_threshold")]
    pub low_confidence_threshold: f32,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub formats: Vec<FormatRule>,
    /// Vocabulary name → terms.
    #[serde(default)]
    pub vocabularies: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub vocabulary_fields: Vec<VocabularyRule>,
    #[serde(default)]
    pub defaults: Vec<DefaultValue>,
    #[serde(default)]
    pub cross_section: Vec<CrossSectionRule>,
    #[serde(default)]
    pub checklists: BTreeMap<SectionType, Vec<ExpectedField>>,
    /// "Today" for date-relative rules. Never read from the clock, so
    /// output depends only on the document and the rules.
    #[serde(default)]
    pub reference_date: Option<NaiveDate>,
}

impl Default for SuggestionRules {
    fn default() -> Self {
        Self::empty()
    }
}

impl SuggestionRules {
    /// No rules at all; the engine then only reports nothing.
    pub fn empty() -> Self {
        Self {
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
            relationships: Vec::new(),
            formats: Vec::new(),
            vocabularies: BTreeMap::new(),
            vocabulary_fields: Vec::new(),
            defaults: Vec::new(),
            cross_section: Vec::new(),
            checklists: BTreeMap::new(),
            reference_date: None,
        }
    }

    pub fn vocabulary(&self, name: &str) -> &[String] {
        self.vocabularies.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Reject rule sets the engine cannot run with.
    pub fn validate(&self) -> Result<(), RulesError> {
        let t = self.low_confidence_threshold;
        if !t.is_finite() || !(0.0..=1.0).contains(&t) {
            return Err(RulesError::Malformed(format!(
                "low_confidence_threshold {t} outside [0, 1]"
            )));
        }

        let named = self
            .vocabulary_fields
            .iter()
            .map(|r| r.vocabulary.as_str())
            .chain(self.cross_section.iter().filter_map(|r| match r {
                CrossSectionRule::MentionedInList { vocabulary, .. } => Some(vocabulary.as_str()),
                _ => None,
            }));
        for name in named {
            if !self.vocabularies.contains_key(name) {
                return Err(RulesError::Malformed(format!("unknown vocabulary '{name}'")));
            }
        }
        Ok(())
    }
}

/// Load and validate a JSON rules file.
pub fn load_rules(path: &Path) -> Result<SuggestionRules, RulesError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => RulesError::NotFound(path.to_path_buf()),
        _ => RulesError::Io(e),
    })?;
    let rules: SuggestionRules =
        serde_json::from_slice(&bytes).map_err(|e| RulesError::Malformed(e.to_string()))?;
    rules.validate()?;

    tracing::info!(
        path = %path.display(),
        relationships = rules.relationships.len(),
        cross_section = rules.cross_section.len(),
        checklists = rules.checklists.len(),
        "Suggestion rules loaded"
    );
    Ok(rules)
}
