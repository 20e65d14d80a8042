//! MedRec Core Library
//!
//! Medicine recommendation and safety evaluation over a read-only medicine
//! knowledge base.
//!
//! # Architecture
//!
//! ```text
//! condition / treatment text
//!            │
//!            ▼
//!       Normalizer ──── synonyms
//!            │
//!            ▼
//!   ProtocolResolver ── exact → partial → text-extracted → fallback
//!            │
//!     [candidate cap: structured 6 as-is | free text 8 deduped]
//!            │
//!            ▼
//!  ┌─────────────────── per candidate ───────────────────┐
//!  │ SafetyEvaluator → DosagePersonalizer → Scoring      │
//!  └─────────────────────────┬───────────────────────────┘
//!                            │
//!                 Assembler (inclusion policy, stable sort)
//!                            │
//!                            ▼
//!                RecommendationResult list
//! ```
//!
//! # Core Principle
//!
//! **The engine never fails.** Unknown conditions fall back, unknown
//! medicines are skipped and unsafe medicines carry warnings. Only loading,
//! configuration and persistence return errors.
//!
//! # Modules
//!
//! - [`models`]: Domain types (MedicineRecord, PatientProfile, RecommendationResult, etc.)
//! - [`knowledge`]: Versioned knowledge base, embedded default catalog
//! - [`config`]: Engine tunables and the default patient profile
//! - [`engine`]: Normalizer, protocol resolver, safety, dosage, scoring, assembler
//! - [`store`]: Profile store trait and SQLite implementation

pub mod config;
pub mod engine;
pub mod knowledge;
pub mod models;
pub mod store;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig};
pub use engine::{Normalizer, ProtocolResolver, RecommendationEngine};
pub use knowledge::{KnowledgeBase, KnowledgeError};
pub use models::{
    MedicalCondition, MedicineRecord, PatientProfile, RecommendationDecision, RecommendationResult,
    RecommendationStatus, SavedRecommendation, Severity, TreatmentContext,
};
pub use store::{recommend_for_user, ProfileStore, SqliteStore, StoreError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum MedRecError {
    #[error("Knowledge base error: {0}")]
    KnowledgeError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    StoreError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<KnowledgeError> for MedRecError {
    fn from(e: KnowledgeError) -> Self {
        MedRecError::KnowledgeError(e.to_string())
    }
}

impl From<ConfigError> for MedRecError {
    fn from(e: ConfigError) -> Self {
        MedRecError::ConfigError(e.to_string())
    }
}

impl From<StoreError> for MedRecError {
    fn from(e: StoreError) -> Self {
        MedRecError::StoreError(e.to_string())
    }
}

impl From<models::ParseSeverityError> for MedRecError {
    fn from(e: models::ParseSeverityError) -> Self {
        MedRecError::InvalidInput(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for MedRecError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        MedRecError::StoreError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Engine over the built-in knowledge base with default settings.
#[uniffi::export]
pub fn open_engine() -> Arc<MedRecCore> {
    Arc::new(MedRecCore {
        kb: KnowledgeBase::builtin(),
        config: EngineConfig::default(),
        store: None,
    })
}

/// Engine with a JSON configuration; missing fields take defaults.
#[uniffi::export]
pub fn open_engine_with_config(config_json: String) -> Result<Arc<MedRecCore>, MedRecError> {
    let config = EngineConfig::from_json(&config_json)?;
    Ok(Arc::new(MedRecCore {
        kb: KnowledgeBase::builtin(),
        config,
        store: None,
    }))
}

/// Engine backed by a profile store at the given path.
#[uniffi::export]
pub fn open_engine_with_store(
    db_path: String,
    config_json: Option<String>,
) -> Result<Arc<MedRecCore>, MedRecError> {
    let config = match config_json {
        Some(json) => EngineConfig::from_json(&json)?,
        None => EngineConfig::default(),
    };
    let store = SqliteStore::open(&db_path)?;
    Ok(Arc::new(MedRecCore {
        kb: KnowledgeBase::builtin(),
        config,
        store: Some(Mutex::new(store)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Shared engine handle for FFI.
#[derive(uniffi::Object)]
pub struct MedRecCore {
    kb: Arc<KnowledgeBase>,
    config: EngineConfig,
    store: Option<Mutex<SqliteStore>>,
}

impl MedRecCore {
    fn engine(&self) -> RecommendationEngine<'_> {
        RecommendationEngine::new(&self.kb, &self.config)
    }

    fn store(&self) -> Result<&Mutex<SqliteStore>, MedRecError> {
        self.store
            .as_ref()
            .ok_or_else(|| MedRecError::InvalidInput("engine was opened without a store".into()))
    }
}

#[uniffi::export]
impl MedRecCore {
    // =========================================================================
    // Recommendation Operations
    // =========================================================================

    /// Recommendations for a structured treatment context.
    pub fn recommend(
        &self,
        context: FfiTreatmentContext,
        patient: FfiPatientProfile,
    ) -> Result<Vec<FfiRecommendation>, MedRecError> {
        let context = TreatmentContext::try_from(context)?;
        let patient = PatientProfile::from(patient);
        let results = self.engine().generate(&context, &patient);
        Ok(results.into_iter().map(Into::into).collect())
    }

    /// Recommendations from a treatment name and description.
    pub fn recommend_from_text(
        &self,
        treatment_name: String,
        description: String,
        patient: FfiPatientProfile,
    ) -> Vec<FfiRecommendation> {
        let patient = PatientProfile::from(patient);
        self.engine()
            .generate_from_text(&treatment_name, &description, &patient)
            .into_iter()
            .map(Into::into)
            .collect()
    }

    /// Patient-agnostic keyword suggestions.
    pub fn suggest_from_keywords(&self, treatment_name: String, description: String) -> Vec<FfiRecommendation> {
        self.engine()
            .suggest_from_keywords(&treatment_name, &description)
            .into_iter()
            .map(Into::into)
            .collect()
    }

    /// Canonical condition key for free text.
    pub fn normalize_condition(&self, text: String) -> String {
        self.engine().normalizer().normalize(&text)
    }

    /// Knowledge base version, if the catalog declares one.
    pub fn knowledge_base_version(&self) -> Option<String> {
        self.kb.version().map(str::to_string)
    }

    // =========================================================================
    // Store Operations
    // =========================================================================

    /// Store or replace a user's profile.
    pub fn upsert_patient_profile(&self, user_id: String, profile: FfiPatientProfile) -> Result<(), MedRecError> {
        let store = self.store()?.lock()?;
        store.upsert_patient_profile(&user_id, &profile.into())?;
        Ok(())
    }

    /// Free-text recommendations for a stored user, saved when a treatment
    /// id is given.
    pub fn recommend_for_user(
        &self,
        user_id: String,
        treatment_id: Option<String>,
        treatment_name: String,
        description: String,
    ) -> Result<Vec<FfiRecommendation>, MedRecError> {
        let store = self.store()?.lock()?;
        let results = recommend_for_user(
            &self.engine(),
            &*store,
            &user_id,
            treatment_id.as_deref(),
            &treatment_name,
            &description,
        );
        Ok(results.into_iter().map(Into::into).collect())
    }

    /// Accept or reject a saved recommendation.
    pub fn update_recommendation_status(
        &self,
        recommendation_id: String,
        accepted: bool,
        reason: Option<String>,
    ) -> Result<(), MedRecError> {
        let decision = if accepted {
            RecommendationDecision::Accepted
        } else {
            RecommendationDecision::Rejected { reason }
        };
        let store = self.store()?.lock()?;
        store.update_recommendation_status(&recommendation_id, &decision)?;
        Ok(())
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe recommendation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecommendation {
    pub name: String,
    pub generic_name: String,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: String,
    pub category: String,
    pub interactions: Vec<String>,
    pub contraindications: Vec<String>,
    pub confidence: u8,
    pub reasoning: String,
    pub side_effects: Vec<String>,
    pub safe: bool,
    pub warnings: Vec<String>,
}

impl From<RecommendationResult> for FfiRecommendation {
    fn from(result: RecommendationResult) -> Self {
        Self {
            name: result.name,
            generic_name: result.generic_name,
            dosage: result.dosage,
            frequency: result.frequency,
            duration: result.duration,
            instructions: result.instructions,
            category: result.category,
            interactions: result.interactions,
            contraindications: result.contraindications,
            confidence: result.confidence,
            reasoning: result.reasoning,
            side_effects: result.side_effects,
            safe: result.safe,
            warnings: result.warnings,
        }
    }
}

/// FFI-safe patient profile. Conditions are not carried across the boundary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientProfile {
    pub age: u32,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub allergies: Vec<String>,
    pub current_medications: Vec<String>,
    pub medical_history: Vec<String>,
}

impl From<FfiPatientProfile> for PatientProfile {
    fn from(profile: FfiPatientProfile) -> Self {
        PatientProfile {
            age: profile.age,
            weight: profile.weight,
            height: profile.height,
            allergies: profile.allergies,
            current_medications: profile.current_medications,
            medical_history: profile.medical_history,
            conditions: Vec::new(),
        }
    }
}

/// FFI-safe treatment context; `severity` is "mild", "moderate" or "severe".
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTreatmentContext {
    pub treatment_type: String,
    pub condition: String,
    pub severity: String,
    pub symptoms: Vec<String>,
    pub target_duration: Option<String>,
}

impl TryFrom<FfiTreatmentContext> for TreatmentContext {
    type Error = MedRecError;

    fn try_from(context: FfiTreatmentContext) -> Result<Self, Self::Error> {
        let severity: Severity = context.severity.parse()?;
        let mut treatment = TreatmentContext::new(context.condition, severity);
        treatment.treatment_type = context.treatment_type;
        treatment.symptoms = context.symptoms;
        treatment.target_duration = context.target_duration;
        Ok(treatment)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ffi_patient(age: u32) -> FfiPatientProfile {
        FfiPatientProfile {
            age,
            weight: None,
            height: None,
            allergies: Vec::new(),
            current_medications: Vec::new(),
            medical_history: Vec::new(),
        }
    }

    #[test]
    fn test_recommend_via_ffi() {
        let core = open_engine();
        let context = FfiTreatmentContext {
            treatment_type: "Blood Pressure Management".into(),
            condition: "hypertension".into(),
            severity: "Moderate".into(),
            symptoms: vec!["headache".into()],
            target_duration: None,
        };

        let results = core.recommend(context, ffi_patient(70)).unwrap();
        assert_eq!(results[0].name, "Lisinopril");
        assert_eq!(results[0].dosage, "5-10mg once daily");
    }

    #[test]
    fn test_bad_severity_is_invalid_input() {
        let core = open_engine();
        let context = FfiTreatmentContext {
            treatment_type: String::new(),
            condition: "hypertension".into(),
            severity: "critical".into(),
            symptoms: Vec::new(),
            target_duration: None,
        };

        let result = core.recommend(context, ffi_patient(40));
        assert!(matches!(result, Err(MedRecError::InvalidInput(_))));
    }

    #[test]
    fn test_open_with_config() {
        let core = open_engine_with_config(r#"{"free_text_candidate_cap": 1}"#.into()).unwrap();
        let results = core.recommend_from_text("respiratory".into(), String::new(), ffi_patient(30));
        assert_eq!(results.len(), 1);

        let bad = open_engine_with_config("{not json".into());
        assert!(matches!(bad, Err(MedRecError::ConfigError(_))));
    }

    #[test]
    fn test_normalize_condition() {
        let core = open_engine();
        assert_eq!(core.normalize_condition("  High Blood Pressure ".into()), "hypertension");
        assert_eq!(core.normalize_condition("Gout".into()), "gout");
    }

    #[test]
    fn test_store_operations_need_store() {
        let core = open_engine();
        let result = core.recommend_for_user("user-1".into(), None, "cough".into(), String::new());
        assert!(matches!(result, Err(MedRecError::InvalidInput(_))));
    }

    #[test]
    fn test_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medrec.db");
        let core = open_engine_with_store(path.to_string_lossy().into_owned(), None).unwrap();

        let mut patient = ffi_patient(40);
        patient.allergies = vec!["penicillin".into()];
        core.upsert_patient_profile("user-1".into(), patient).unwrap();

        let results = core
            .recommend_for_user("user-1".into(), Some("t-1".into()), "infection".into(), String::new())
            .unwrap();
        assert!(results.iter().any(|r| r.name == "Amoxicillin" && !r.safe));

        let missing = core.update_recommendation_status("missing".into(), true, None);
        assert!(matches!(missing, Err(MedRecError::StoreError(_))));
    }
}
