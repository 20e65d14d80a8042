//! Engine configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{MedicalCondition, PatientProfile, Severity};

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Tunables for the recommendation pipeline.
///
/// The two patient-aware entry points keep separate candidate caps; see
/// [`crate::engine::CandidateMode`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// Candidates considered by the structured-context path
    pub structured_candidate_cap: usize,
    /// Candidates considered by the free-text path (after dedup)
    pub free_text_candidate_cap: usize,
    /// Candidates considered by keyword suggestions
    pub keyword_candidate_cap: usize,
    /// Patients strictly older than this get elderly dosing and cautions
    pub elderly_age_threshold: u32,
    /// Unsafe medicines are dropped once this many safe ones are accepted
    pub min_safe_before_exclusion: usize,
    /// Upper bound for free-text and keyword confidence
    pub free_text_confidence_ceiling: u8,
    /// Profile used when the store has none for a user
    pub default_profile: PatientProfile,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            structured_candidate_cap: 6,
            free_text_candidate_cap: 8,
            keyword_candidate_cap: 6,
            elderly_age_threshold: 65,
            min_safe_before_exclusion: 2,
            free_text_confidence_ceiling: 95,
            default_profile: default_patient_profile(),
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration; missing fields take defaults.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Reject settings that would make the engine return nothing.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.structured_candidate_cap == 0
            || self.free_text_candidate_cap == 0
            || self.keyword_candidate_cap == 0
        {
            return Err(ConfigError::Invalid("candidate caps must be positive".into()));
        }
        if self.free_text_confidence_ceiling > 100 {
            return Err(ConfigError::Invalid(format!(
                "confidence ceiling {} exceeds 100",
                self.free_text_confidence_ceiling
            )));
        }
        Ok(())
    }

    /// Whether a patient gets elderly dosing and cautions.
    pub fn is_elderly(&self, patient: &PatientProfile) -> bool {
        patient.age > self.elderly_age_threshold
    }
}

/// Profile for users the store knows nothing about.
pub fn default_patient_profile() -> PatientProfile {
    PatientProfile {
        age: 35,
        weight: Some(70.0),
        height: Some(170.0),
        allergies: Vec::new(),
        current_medications: Vec::new(),
        medical_history: Vec::new(),
        conditions: vec![MedicalCondition::new("general", Severity::Mild)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.structured_candidate_cap, 6);
        assert_eq!(config.free_text_candidate_cap, 8);
        assert_eq!(config.default_profile.age, 35);
        assert!(config.default_profile.allergies.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{"structured_candidate_cap": 3}"#).unwrap();
        assert_eq!(config.structured_candidate_cap, 3);
        assert_eq!(config.free_text_candidate_cap, 8);
    }

    #[test]
    fn test_zero_cap_rejected() {
        let result = EngineConfig::from_json(r#"{"free_text_candidate_cap": 0}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_is_elderly_strict() {
        let config = EngineConfig::default();
        assert!(!config.is_elderly(&PatientProfile::new(65)));
        assert!(config.is_elderly(&PatientProfile::new(66)));
    }
}
