//! Document analysis orchestrator.
//!
//! Single entry point that drives the full pipeline:
//! classify → select strategy → detect sections → extract fields → suggest.
//!
//! The corpus is shared read-only behind an `Arc`; an `IntakePipeline` is
//! `Send + Sync` and can serve concurrent analyses.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use super::classify::{DocumentClassification, DocumentClassifier};
use super::corpus::{load_corpus, CorpusError, PatternCorpus};
use super::diagnostic::{Stage, StageDump};
use super::extraction::{ExtractorRegistry, StructuredRecord};
use super::segmentation::{FallbackMatcher, Section, SectionDetector};
use super::strategy::{select_strategy, Strategy};
use crate::config::EngineConfig;
use crate::suggestions::knowledge::default_rules;
use crate::suggestions::{
    load_rules, ContentSuggestion, MissingInformation, RulesError, SuggestionEngine,
    SuggestionReport, SuggestionRules, ValidationResult,
};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Startup failures. Analysis itself never fails.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Corpus error: {0}")]
    Corpus(#[from] CorpusError),

    #[error("Rules error: {0}")]
    Rules(#[from] RulesError),
}

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

const DOCUMENT_NAMESPACE: Uuid = Uuid::from_u128(0x2d8e_91a4_5c3b_4f6e_a1d7_0b9c_e4f2_7a13);

/// Everything produced for one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisOutput {
    /// Name-based id over the input text.
    pub document_id: Uuid,
    pub classification: DocumentClassification,
    pub strategy: Strategy,
    pub sections: Vec<Section>,
    pub record: StructuredRecord,
    pub suggestions: Vec<ContentSuggestion>,
    pub validations: Vec<ValidationResult>,
    pub missing_information: Vec<MissingInformation>,
}

impl AnalysisOutput {
    pub fn report(&self) -> SuggestionReport {
        SuggestionReport {
            content_suggestions: self.suggestions.clone(),
            validation_results: self.validations.clone(),
            missing_information: self.missing_information.clone(),
        }
    }
}

pub fn document_id(text: &str) -> Uuid {
    Uuid::new_v5(&DOCUMENT_NAMESPACE, text.as_bytes())
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

pub struct IntakePipeline {
    classifier: DocumentClassifier,
    detector: SectionDetector,
    extractors: ExtractorRegistry,
    engine: SuggestionEngine,
    dump_dir: Option<PathBuf>,
}

impl IntakePipeline {
    pub fn new(corpus: Arc<PatternCorpus>, rules: SuggestionRules) -> Self {
        Self {
            classifier: DocumentClassifier::default(),
            detector: SectionDetector::new(corpus),
            extractors: ExtractorRegistry::with_defaults(),
            engine: SuggestionEngine::new(rules),
            dump_dir: None,
        }
    }

    /// Load the corpus (fatal when missing, corrupt or empty) and the rules
    /// (built-in when no rules file is configured).
    pub fn from_config(config: &EngineConfig) -> Result<Self, PipelineError> {
        let corpus = load_corpus(&config.corpus_path)?;
        let rules = match &config.rules_path {
            Some(path) => load_rules(path)?,
            None => default_rules(),
        };

        tracing::info!(
            corpus = %config.corpus_path.display(),
            patterns = corpus.pattern_count(),
            custom_rules = config.rules_path.is_some(),
            "Intake pipeline ready"
        );
        Ok(Self::new(Arc::new(corpus), rules).with_dump_dir(config.dump_dir.clone()))
    }

    pub fn with_extractors(mut self, extractors: ExtractorRegistry) -> Self {
        self.extractors = extractors;
        self
    }

    pub fn with_fallback(mut self, matcher: Box<dyn FallbackMatcher>) -> Self {
        self.detector = self.detector.with_fallback(matcher);
        self
    }

    pub fn with_classifier(mut self, classifier: DocumentClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Date that date-relative suggestion rules treat as today. Without it
    /// those rules stay silent.
    pub fn with_reference_date(mut self, date: NaiveDate) -> Self {
        self.engine = self.engine.with_reference_date(date);
        self
    }

    pub fn with_dump_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.dump_dir = dir;
        self
    }

    pub fn corpus(&self) -> &PatternCorpus {
        self.detector.corpus()
    }

    pub fn engine(&self) -> &SuggestionEngine {
        &self.engine
    }

    /// Analyze one document. Total: malformed or empty input degrades to
    /// fewer sections and fields, never to an error.
    pub fn analyze(&self, text: &str) -> AnalysisOutput {
        let document_id = document_id(text);
        let dump = self
            .dump_dir
            .as_deref()
            .and_then(|base| StageDump::open(base, &document_id));
        if let Some(dump) = &dump {
            dump.text(Stage::Input, text);
        }

        let classification = self.classifier.classify(text);
        let strategy = select_strategy(&classification);
        let sections = self.detector.detect(text, &strategy);
        let record = self.extractors.extract_record(&sections);
        let report = self.engine.generate_suggestions(&record);

        if let Some(dump) = &dump {
            dump.json(Stage::Classification, &classification);
            dump.json(Stage::Strategy, &strategy);
            dump.json(Stage::Sections, &sections);
            dump.json(Stage::Record, &record);
            dump.json(Stage::Suggestions, &report);
        }

        tracing::info!(
            document_id = %document_id,
            doc_type = %classification.doc_type,
            sections = sections.len(),
            suggestions = report.content_suggestions.len(),
            validations = report.validation_results.len(),
            missing = report.missing_information.len(),
            "Document analyzed"
        );

        AnalysisOutput {
            document_id,
            classification,
            strategy,
            sections,
            record,
            suggestions: report.content_suggestions,
            validations: report.validation_results,
            missing_information: report.missing_information,
        }
    }

    /// Regenerate suggestions for `record` and apply the accepted ids.
    pub fn apply_suggestions(
        &self,
        record: &StructuredRecord,
        accepted: &HashSet<String>,
    ) -> StructuredRecord {
        self.engine.apply_suggestions(record, accepted)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
