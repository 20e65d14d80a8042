//! Joins safety, dosage and scoring into ranked recommendations.

use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::knowledge::KnowledgeBase;
use crate::models::{MedicineRecord, PatientProfile, RecommendationResult, SafetyVerdict, TreatmentContext};

use super::{DosagePersonalizer, Resolution, SafetyEvaluator, ScoringStrategy};

const BASE_INSTRUCTIONS: &str = "Take as directed by your healthcare provider.";
const ANTIBIOTIC_INSTRUCTIONS: &str = "Complete the full course even if symptoms improve.";
const METFORMIN_INSTRUCTIONS: &str = "Take with meals to reduce stomach upset.";
const ELDERLY_INSTRUCTIONS: &str = "Monitor for side effects closely due to age.";

const ANTIBIOTIC_CATEGORY: &str = "Antibiotics";
const FREE_TEXT_DURATION: &str = "7-14 days";
const DEFAULT_DURATION: &str = "as directed by physician";

/// Request-specific wording for durations and explanations.
pub enum Narrative<'a> {
    /// Structured request with a condition breakdown
    Structured {
        context: &'a TreatmentContext,
        resolution: &'a Resolution<'a>,
    },
    /// Free-text request with a patient
    FreeText { treatment_name: &'a str },
    /// Keyword suggestion without a patient
    Keyword { treatment_name: &'a str },
}

impl Narrative<'_> {
    fn duration(&self, medicine: &MedicineRecord) -> String {
        if let Some(duration) = &medicine.duration {
            return duration.clone();
        }
        match self {
            Narrative::Structured { context, .. } => condition_duration(context),
            Narrative::FreeText { .. } | Narrative::Keyword { .. } => FREE_TEXT_DURATION.into(),
        }
    }

    fn reasoning(&self, medicine: &MedicineRecord) -> String {
        match self {
            Narrative::Structured { context, resolution } => {
                let tier = if resolution.is_first_line(&medicine.id) {
                    "first-line"
                } else {
                    "effective"
                };
                format!(
                    "{name} is recommended for {condition} based on current clinical guidelines. \
                     This medication is {tier} treatment for {severity} {condition}. \
                     The recommendation considers the patient's specific symptoms and medical profile.",
                    name = medicine.name,
                    condition = context.condition,
                    severity = context.severity,
                )
            }
            Narrative::FreeText { treatment_name } => format!(
                "Recommended for {} treatment based on standard medical protocols",
                treatment_name
            ),
            Narrative::Keyword { treatment_name } => format!(
                "Recommended for {} based on standard medical protocols",
                treatment_name
            ),
        }
    }

    fn instructions(&self, medicine: &MedicineRecord, elderly: bool) -> String {
        match self {
            Narrative::Keyword { treatment_name } => {
                format!("Take {} as prescribed for {}", medicine.name, treatment_name)
            }
            Narrative::Structured { .. } | Narrative::FreeText { .. } => {
                patient_instructions(medicine, elderly)
            }
        }
    }
}

/// Shared instruction text for patient-aware requests.
fn patient_instructions(medicine: &MedicineRecord, elderly: bool) -> String {
    let mut parts = vec![BASE_INSTRUCTIONS];
    if medicine.category == ANTIBIOTIC_CATEGORY {
        parts.push(ANTIBIOTIC_INSTRUCTIONS);
    }
    if medicine.name == "Metformin" {
        parts.push(METFORMIN_INSTRUCTIONS);
    }
    if elderly {
        parts.push(ELDERLY_INSTRUCTIONS);
    }
    parts.join(" ")
}

/// Course length from the condition wording.
fn condition_duration(context: &TreatmentContext) -> String {
    let condition = context.condition.to_lowercase();
    if condition.contains("infection") {
        "7-10 days".into()
    } else if condition.contains("pain") {
        "as needed".into()
    } else if ["chronic", "diabetes", "hypertension"]
        .iter()
        .any(|c| condition.contains(c))
    {
        "ongoing".into()
    } else {
        context
            .target_duration
            .clone()
            .unwrap_or_else(|| DEFAULT_DURATION.into())
    }
}

/// Builds the final, ordered result list.
pub struct Assembler<'a> {
    kb: &'a KnowledgeBase,
    config: &'a EngineConfig,
    safety: SafetyEvaluator,
    dosage: DosagePersonalizer,
}

impl<'a> Assembler<'a> {
    pub fn new(kb: &'a KnowledgeBase, config: &'a EngineConfig) -> Self {
        Self {
            kb,
            config,
            safety: SafetyEvaluator::new(config.elderly_age_threshold),
            dosage: DosagePersonalizer::new(config.elderly_age_threshold),
        }
    }

    /// Assemble recommendations for capped candidate ids.
    ///
    /// Unknown ids are skipped. An unsafe medicine is kept only while fewer
    /// than `min_safe_before_exclusion` safe results have been accepted, and
    /// then carries its warnings. Output is sorted by confidence, descending,
    /// ties keeping candidate order.
    pub fn assemble(
        &self,
        candidates: &[&str],
        patient: Option<&PatientProfile>,
        scoring: &dyn ScoringStrategy,
        narrative: &Narrative<'_>,
    ) -> Vec<RecommendationResult> {
        let mut results = Vec::with_capacity(candidates.len());
        let mut safe_count = 0usize;

        for &id in candidates {
            let Some(medicine) = self.kb.medicine(id) else {
                debug!(medicine = id, "not in knowledge base, skipping");
                continue;
            };

            let verdict = match patient {
                Some(patient) => self.safety.evaluate(medicine, patient),
                None => SafetyVerdict::clear(),
            };

            if !verdict.safe {
                if safe_count >= self.config.min_safe_before_exclusion {
                    debug!(medicine = id, "unsafe for patient, excluded");
                    continue;
                }
                warn!(
                    medicine = id,
                    safe_so_far = safe_count,
                    "including unsafe medicine for lack of safe alternatives"
                );
            }

            let dosage = match patient {
                Some(patient) => self.dosage.personalize(medicine, patient),
                None => self.dosage.standard(medicine),
            };
            let elderly = patient.is_some_and(|p| self.config.is_elderly(p));

            results.push(RecommendationResult {
                name: medicine.name.clone(),
                generic_name: medicine.generic_name.clone(),
                dosage: dosage.dosage,
                frequency: dosage.frequency,
                duration: narrative.duration(medicine),
                instructions: narrative.instructions(medicine, elderly),
                category: medicine.category.clone(),
                interactions: medicine.interactions.clone(),
                contraindications: medicine.contraindications.clone(),
                confidence: scoring.score(medicine, &verdict).min(100),
                reasoning: narrative.reasoning(medicine),
                side_effects: medicine.side_effects.clone(),
                safe: verdict.safe,
                warnings: verdict.warnings,
            });

            if results.last().is_some_and(|r| r.safe) {
                safe_count += 1;
            }
        }

        // sort_by is stable: equal confidence keeps resolution order
        results.sort_by(|a, b| b.confidence.cmp(&a.confidence));
        results
    }
}
