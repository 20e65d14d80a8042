//! Recommendation pipeline.
//!
//! Pipeline:
//! 1. Normalize the condition or treatment name to a canonical key
//! 2. Resolve the key to ordered candidate medicine ids
//! 3. Cap (and for text modes deduplicate) the candidates
//! 4. For each candidate: safety check, dosage band, confidence score
//! 5. Apply the unsafe-inclusion policy and sort by confidence
//!
//! Every entry point is a pure function of its inputs and the read-only
//! knowledge base.

mod assembler;
mod dosage;
mod normalizer;
mod protocol;
mod safety;
mod scoring;

pub use assembler::{Assembler, Narrative};
pub use dosage::{derive_frequency, DosagePersonalizer};
pub use normalizer::Normalizer;
pub use protocol::{CandidateMode, ProtocolResolver, Resolution, ResolutionPath};
pub use safety::{SafetyEvaluator, ALLERGY_WARNING, ELDERLY_NSAID_WARNING, INTERACTION_WARNING};
pub use scoring::{relevance, FreeTextScoring, KeywordScoring, ScoringStrategy, StructuredScoring};

use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::knowledge::KnowledgeBase;
use crate::models::{PatientProfile, RecommendationResult, TreatmentContext};

use protocol::dedup_preserving_order;

/// Entry points over a knowledge base and configuration.
pub struct RecommendationEngine<'a> {
    kb: &'a KnowledgeBase,
    config: &'a EngineConfig,
}

impl<'a> RecommendationEngine<'a> {
    pub fn new(kb: &'a KnowledgeBase, config: &'a EngineConfig) -> Self {
        Self { kb, config }
    }

    pub fn config(&self) -> &'a EngineConfig {
        self.config
    }

    pub fn normalizer(&self) -> Normalizer<'a> {
        Normalizer::new(self.kb)
    }

    pub fn resolver(&self) -> ProtocolResolver<'a> {
        ProtocolResolver::new(self.kb)
    }

    /// Recommendations for a structured treatment context.
    pub fn generate(&self, context: &TreatmentContext, patient: &PatientProfile) -> Vec<RecommendationResult> {
        let canonical = self.normalizer().normalize(&context.condition);
        debug!(condition = %context.condition, canonical = %canonical, "normalized condition");

        let resolution = self.resolver().resolve(&canonical);
        let candidates = resolution.candidates(CandidateMode::Structured, self.config);

        let scoring = StructuredScoring {
            condition: &canonical,
            symptoms: &context.symptoms,
            resolution: &resolution,
        };
        let narrative = Narrative::Structured {
            context,
            resolution: &resolution,
        };

        let results = Assembler::new(self.kb, self.config).assemble(&candidates, Some(patient), &scoring, &narrative);
        info!(
            condition = %canonical,
            path = ?resolution.path,
            count = results.len(),
            "generated recommendations"
        );
        results
    }

    /// Recommendations from a treatment name and description.
    pub fn generate_from_text(
        &self,
        treatment_name: &str,
        description: &str,
        patient: &PatientProfile,
    ) -> Vec<RecommendationResult> {
        let canonical = self.normalizer().normalize(treatment_name);
        debug!(treatment = treatment_name, canonical = %canonical, "normalized treatment name");

        let resolution = self.resolver().resolve_text(&canonical, description);
        let candidates = resolution.candidates(CandidateMode::FreeText, self.config);

        let search_text = search_text(treatment_name, description);
        let scoring = FreeTextScoring {
            kb: self.kb,
            search_text: &search_text,
            exact_match: resolution.is_exact(),
            ceiling: self.config.free_text_confidence_ceiling,
        };
        let narrative = Narrative::FreeText { treatment_name };

        let results = Assembler::new(self.kb, self.config).assemble(&candidates, Some(patient), &scoring, &narrative);
        info!(
            treatment = treatment_name,
            path = ?resolution.path,
            count = results.len(),
            "generated recommendations from text"
        );
        results
    }

    /// Patient-agnostic suggestions from the keyword table.
    ///
    /// Keywords are matched in table order and their medicine lists joined
    /// with first occurrences kept; with no keyword hit the fallback
    /// protocol's ids are used. No safety filtering happens.
    pub fn suggest_from_keywords(&self, treatment_name: &str, description: &str) -> Vec<RecommendationResult> {
        let search_text = search_text(treatment_name, description);

        let mut ids: Vec<&str> = self
            .kb
            .keyword_suggestions()
            .iter()
            .filter(|s| search_text.contains(s.keyword.as_str()))
            .flat_map(|s| s.medicines.iter().map(String::as_str))
            .collect();
        if ids.is_empty() {
            debug!(treatment = treatment_name, "no keyword hit, using fallback");
            ids = self.kb.fallback_protocol().primary_candidates().collect();
        }

        let ids = dedup_preserving_order(ids);
        let candidates = CandidateMode::Keyword.select(&ids, self.config);

        let scoring = KeywordScoring {
            kb: self.kb,
            search_text: &search_text,
            ceiling: self.config.free_text_confidence_ceiling,
        };
        let narrative = Narrative::Keyword { treatment_name };

        let results = Assembler::new(self.kb, self.config).assemble(&candidates, None, &scoring, &narrative);
        info!(treatment = treatment_name, count = results.len(), "generated keyword suggestions");
        results
    }
}

fn search_text(treatment_name: &str, description: &str) -> String {
    format!("{} {}", treatment_name, description).to_lowercase()
}
