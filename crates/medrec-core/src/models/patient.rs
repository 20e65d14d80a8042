//! Patient and treatment request models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Condition severity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Mild,
    #[default]
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "mild",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for an unrecognized severity string.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unknown severity: {0}")]
pub struct ParseSeverityError(pub String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mild" => Ok(Severity::Mild),
            "moderate" => Ok(Severity::Moderate),
            "severe" => Ok(Severity::Severe),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// A condition the patient has been diagnosed with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicalCondition {
    /// Free-text condition name
    pub condition: String,
    pub severity: Severity,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub duration: Option<String>,
}

impl MedicalCondition {
    pub fn new(condition: impl Into<String>, severity: Severity) -> Self {
        Self {
            condition: condition.into(),
            severity,
            symptoms: Vec::new(),
            duration: None,
        }
    }
}

/// Patient data the engine evaluates against. Never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    /// Age in years
    pub age: u32,
    /// Weight in kg
    #[serde(default)]
    pub weight: Option<f64>,
    /// Height in cm
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub current_medications: Vec<String>,
    #[serde(default)]
    pub medical_history: Vec<String>,
    #[serde(default)]
    pub conditions: Vec<MedicalCondition>,
}

impl PatientProfile {
    /// Create a profile with only an age; all collections empty.
    pub fn new(age: u32) -> Self {
        Self {
            age,
            weight: None,
            height: None,
            allergies: Vec::new(),
            current_medications: Vec::new(),
            medical_history: Vec::new(),
            conditions: Vec::new(),
        }
    }

    /// Allergies that carry text, lowercased and trimmed.
    pub fn normalized_allergies(&self) -> impl Iterator<Item = String> + '_ {
        self.allergies
            .iter()
            .map(|a| a.trim().to_lowercase())
            .filter(|a| !a.is_empty())
    }
}

/// A treatment request with a structured condition breakdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentContext {
    /// Kind of treatment (e.g., "Blood Pressure Management")
    pub treatment_type: String,
    /// Free-text condition; normalized before protocol lookup
    pub condition: String,
    pub severity: Severity,
    #[serde(default)]
    pub symptoms: Vec<String>,
    /// RFC 3339 start date
    pub start_date: String,
    #[serde(default)]
    pub target_duration: Option<String>,
}

impl TreatmentContext {
    /// Create a context with required fields.
    pub fn new(condition: impl Into<String>, severity: Severity) -> Self {
        Self {
            treatment_type: String::new(),
            condition: condition.into(),
            severity,
            symptoms: Vec::new(),
            start_date: chrono::Utc::now().to_rfc3339(),
            target_duration: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_parse() {
        assert_eq!("mild".parse::<Severity>(), Ok(Severity::Mild));
        assert_eq!(" Severe ".parse::<Severity>(), Ok(Severity::Severe));
        assert!("critical".parse::<Severity>().is_err());
    }

    #[test]
    fn test_severity_serde_lowercase() {
        let json = serde_json::to_string(&Severity::Moderate).unwrap();
        assert_eq!(json, "\"moderate\"");
    }

    #[test]
    fn test_normalized_allergies_skip_blank() {
        let mut patient = PatientProfile::new(40);
        patient.allergies = vec![" Penicillin ".into(), "".into(), "  ".into()];
        let allergies: Vec<String> = patient.normalized_allergies().collect();
        assert_eq!(allergies, vec!["penicillin"]);
    }

    #[test]
    fn test_profile_deserialize_defaults() {
        let patient: PatientProfile = serde_json::from_str(r#"{"age": 52}"#).unwrap();
        assert_eq!(patient.age, 52);
        assert!(patient.allergies.is_empty());
        assert!(patient.conditions.is_empty());
    }
}
