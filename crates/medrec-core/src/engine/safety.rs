//! Patient-specific safety checks.
//!
//! Only an allergy/contraindication conflict makes a medicine unsafe.
//! Interactions and age cautions are advisory.

use crate::models::{MedicineRecord, PatientProfile, SafetyVerdict};

pub const ALLERGY_WARNING: &str = "Patient has known allergy to this medication";
pub const INTERACTION_WARNING: &str = "Potential drug interaction detected";
pub const ELDERLY_NSAID_WARNING: &str = "Use with caution in elderly patients";

/// Category that triggers the elderly caution.
const NSAID_CATEGORY: &str = "NSAIDs";

/// Evaluates medicines against a patient's allergies, medications and age.
#[derive(Debug, Clone, Copy)]
pub struct SafetyEvaluator {
    elderly_age_threshold: u32,
}

impl SafetyEvaluator {
    pub fn new(elderly_age_threshold: u32) -> Self {
        Self {
            elderly_age_threshold,
        }
    }

    /// Check a medicine for one patient.
    pub fn evaluate(&self, medicine: &MedicineRecord, patient: &PatientProfile) -> SafetyVerdict {
        let mut verdict = SafetyVerdict::clear();

        if has_allergy_conflict(medicine, patient) {
            verdict.safe = false;
            verdict.warnings.push(ALLERGY_WARNING.into());
        }

        if has_interaction(medicine, patient) {
            verdict.warnings.push(INTERACTION_WARNING.into());
        }

        if patient.age > self.elderly_age_threshold && medicine.category == NSAID_CATEGORY {
            verdict.warnings.push(ELDERLY_NSAID_WARNING.into());
        }

        verdict
    }
}

/// Substring match in either direction between any allergy and any
/// contraindication, ignoring case. Blank allergies never match.
fn has_allergy_conflict(medicine: &MedicineRecord, patient: &PatientProfile) -> bool {
    let contraindications: Vec<String> = medicine
        .contraindications
        .iter()
        .map(|c| c.to_lowercase())
        .collect();

    patient.normalized_allergies().any(|allergy| {
        contraindications
            .iter()
            .any(|contra| contra.contains(&allergy) || allergy.contains(contra.as_str()))
    })
}

/// Exact, case-insensitive match between a current medication and an
/// interaction entry.
fn has_interaction(medicine: &MedicineRecord, patient: &PatientProfile) -> bool {
    patient
        .current_medications
        .iter()
        .map(|med| med.trim().to_lowercase())
        .any(|med| {
            medicine
                .interactions
                .iter()
                .any(|interaction| interaction.trim().to_lowercase() == med)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeBase;

    fn evaluator() -> SafetyEvaluator {
        SafetyEvaluator::new(65)
    }

    #[test]
    fn test_allergy_substring_of_contraindication() {
        let kb = KnowledgeBase::builtin();
        let amoxicillin = kb.medicine("amoxicillin").unwrap();

        let mut patient = PatientProfile::new(40);
        patient.allergies = vec!["Penicillin".into()];

        let verdict = evaluator().evaluate(amoxicillin, &patient);
        assert!(!verdict.safe);
        assert_eq!(verdict.warnings, vec![ALLERGY_WARNING]);
    }

    #[test]
    fn test_allergy_containing_contraindication() {
        let kb = KnowledgeBase::builtin();
        let lisinopril = kb.medicine("lisinopril").unwrap();

        let mut patient = PatientProfile::new(40);
        patient.allergies = vec!["history of angioedema".into()];

        assert!(!evaluator().evaluate(lisinopril, &patient).safe);
    }

    #[test]
    fn test_blank_allergy_ignored() {
        let kb = KnowledgeBase::builtin();
        let lisinopril = kb.medicine("lisinopril").unwrap();

        let mut patient = PatientProfile::new(40);
        patient.allergies = vec!["".into(), "   ".into()];

        assert!(evaluator().evaluate(lisinopril, &patient).safe);
    }

    #[test]
    fn test_interaction_is_advisory() {
        let kb = KnowledgeBase::builtin();
        let ibuprofen = kb.medicine("ibuprofen").unwrap();

        let mut patient = PatientProfile::new(40);
        patient.current_medications = vec!["Warfarin".into()];

        let verdict = evaluator().evaluate(ibuprofen, &patient);
        assert!(verdict.safe);
        assert_eq!(verdict.warnings, vec![INTERACTION_WARNING]);
    }

    #[test]
    fn test_interaction_requires_exact_name() {
        let kb = KnowledgeBase::builtin();
        let ibuprofen = kb.medicine("ibuprofen").unwrap();

        let mut patient = PatientProfile::new(40);
        patient.current_medications = vec!["warfarin sodium".into()];

        assert!(!evaluator().evaluate(ibuprofen, &patient).has_warnings());
    }

    #[test]
    fn test_interaction_folds_non_ascii_case() {
        let kb = KnowledgeBase::builtin();
        let mut medicine = kb.medicine("ibuprofen").unwrap().clone();
        medicine.interactions = vec!["Ærovent".into()];

        let mut patient = PatientProfile::new(40);
        patient.current_medications = vec!["ÆROVENT".into()];
        assert_eq!(evaluator().evaluate(&medicine, &patient).warnings, vec![INTERACTION_WARNING]);

        patient.current_medications = vec!["ærovent ".into()];
        assert_eq!(evaluator().evaluate(&medicine, &patient).warnings, vec![INTERACTION_WARNING]);
    }

    #[test]
    fn test_elderly_nsaid_caution() {
        let kb = KnowledgeBase::builtin();
        let ibuprofen = kb.medicine("ibuprofen").unwrap();
        let acetaminophen = kb.medicine("acetaminophen").unwrap();

        let patient = PatientProfile::new(70);
        let verdict = evaluator().evaluate(ibuprofen, &patient);
        assert!(verdict.safe);
        assert_eq!(verdict.warnings, vec![ELDERLY_NSAID_WARNING]);

        assert!(!evaluator().evaluate(acetaminophen, &patient).has_warnings());
        assert!(!evaluator().evaluate(ibuprofen, &PatientProfile::new(65)).has_warnings());
    }
}
