//! Recommendation output models.

use serde::{Deserialize, Serialize};

/// Outcome of checking a medicine against a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SafetyVerdict {
    /// False only when an allergy conflicts with a contraindication
    pub safe: bool,
    /// Human-readable findings, blocking and advisory
    pub warnings: Vec<String>,
}

impl SafetyVerdict {
    /// A verdict with no findings.
    pub fn clear() -> Self {
        Self {
            safe: true,
            warnings: Vec::new(),
        }
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Dose text and frequency chosen for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonalizedDosage {
    pub dosage: String,
    pub frequency: String,
}

/// A single ranked medicine recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationResult {
    pub name: String,
    pub generic_name: String,
    /// Personalized dose text
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub instructions: String,
    pub category: String,
    pub interactions: Vec<String>,
    pub contraindications: Vec<String>,
    /// Relative strength, always within 0..=100
    pub confidence: u8,
    pub reasoning: String,
    pub side_effects: Vec<String>,
    /// Safety verdict for the patient the result was generated for
    pub safe: bool,
    /// Safety findings carried with the result
    pub warnings: Vec<String>,
}

/// A caller's decision on a saved recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RecommendationDecision {
    Accepted,
    Rejected { reason: Option<String> },
}

/// Review status of a saved recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum RecommendationStatus {
    /// No decision recorded yet
    Pending,
    /// Accepted into the treatment
    Accepted { accepted_at: String },
    /// Rejected, optionally with a reason
    Rejected { reason: Option<String> },
}

impl RecommendationStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, RecommendationStatus::Pending)
    }
}

/// A recommendation as persisted by a profile store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavedRecommendation {
    pub id: String,
    pub user_id: String,
    pub treatment_id: String,
    pub recommendation: RecommendationResult,
    pub status: RecommendationStatus,
    pub recommended_at: String,
}
