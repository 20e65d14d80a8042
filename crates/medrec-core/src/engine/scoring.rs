//! Confidence scoring strategies.
//!
//! Structured scoring (symmetric clamp to 0..=100):
//! - Indication match: +40
//! - Symptom overlap: up to +30
//! - Safe: +20, unsafe: -30
//! - First-line in the resolved protocol: +10
//!
//! Free-text scoring (capped from above only):
//! - Base: keyword relevance for the medicine (75 if unlisted)
//! - Exact protocol key match: +15
//! - Safe: +5, any warning: -10
//! - Capped at the configured ceiling (95 by default)

use crate::knowledge::KnowledgeBase;
use crate::models::{MedicineRecord, SafetyVerdict};

use super::Resolution;

const INDICATION_POINTS: f64 = 40.0;
const SYMPTOM_POINTS: f64 = 30.0;
const SAFE_POINTS: f64 = 20.0;
const UNSAFE_PENALTY: f64 = 30.0;
const FIRST_LINE_POINTS: f64 = 10.0;

const DEFAULT_RELEVANCE: u8 = 75;
const EXACT_MATCH_POINTS: i32 = 15;
const FREE_TEXT_SAFE_POINTS: i32 = 5;
const WARNING_PENALTY: i32 = 10;

/// A way of turning a candidate and its safety verdict into a 0..=100 score.
pub trait ScoringStrategy {
    fn score(&self, medicine: &MedicineRecord, verdict: &SafetyVerdict) -> u8;
}

/// Scoring for requests with a structured condition breakdown.
pub struct StructuredScoring<'a> {
    /// Normalized condition key
    pub condition: &'a str,
    pub symptoms: &'a [String],
    pub resolution: &'a Resolution<'a>,
}

impl StructuredScoring<'_> {
    /// Fraction of symptoms mentioned by any indication; 0 with no symptoms.
    fn symptom_overlap(&self, medicine: &MedicineRecord) -> f64 {
        if self.symptoms.is_empty() {
            return 0.0;
        }
        let matched = self
            .symptoms
            .iter()
            .filter(|s| medicine.mentions_symptom(s))
            .count();
        matched as f64 / self.symptoms.len() as f64
    }
}

impl ScoringStrategy for StructuredScoring<'_> {
    fn score(&self, medicine: &MedicineRecord, verdict: &SafetyVerdict) -> u8 {
        let mut score = 0.0;

        if medicine.is_indicated_for(self.condition) {
            score += INDICATION_POINTS;
        }

        score += SYMPTOM_POINTS * self.symptom_overlap(medicine);

        if verdict.safe {
            score += SAFE_POINTS;
        } else {
            score -= UNSAFE_PENALTY;
        }

        if self.resolution.is_first_line(&medicine.id) {
            score += FIRST_LINE_POINTS;
        }

        score.round().clamp(0.0, 100.0) as u8
    }
}

/// Scoring for requests carrying only a treatment name and description.
pub struct FreeTextScoring<'a> {
    pub kb: &'a KnowledgeBase,
    /// Lowercased `name + " " + description`
    pub search_text: &'a str,
    /// Whether the treatment name was itself a protocol key
    pub exact_match: bool,
    pub ceiling: u8,
}

impl ScoringStrategy for FreeTextScoring<'_> {
    fn score(&self, medicine: &MedicineRecord, verdict: &SafetyVerdict) -> u8 {
        let mut score = i32::from(relevance(self.kb, &medicine.id, self.search_text));

        if self.exact_match {
            score += EXACT_MATCH_POINTS;
        }
        if verdict.safe {
            score += FREE_TEXT_SAFE_POINTS;
        }
        if verdict.has_warnings() {
            score -= WARNING_PENALTY;
        }

        // Only the ceiling is a policy bound; the floor just keeps the type's range.
        score.min(i32::from(self.ceiling)).max(0) as u8
    }
}

/// Scoring for keyword suggestions, where no patient is known.
pub struct KeywordScoring<'a> {
    pub kb: &'a KnowledgeBase,
    pub search_text: &'a str,
    pub ceiling: u8,
}

impl ScoringStrategy for KeywordScoring<'_> {
    fn score(&self, medicine: &MedicineRecord, _verdict: &SafetyVerdict) -> u8 {
        relevance(self.kb, &medicine.id, self.search_text).min(self.ceiling)
    }
}

/// Keyword relevance of a medicine for a lowercased search text.
pub fn relevance(kb: &KnowledgeBase, medicine_id: &str, search_text: &str) -> u8 {
    kb.relevance_rule(medicine_id)
        .map(|rule| rule.relevance(search_text))
        .unwrap_or(DEFAULT_RELEVANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ProtocolResolver;

    fn unsafe_verdict() -> SafetyVerdict {
        SafetyVerdict {
            safe: false,
            warnings: vec!["allergy".into()],
        }
    }

    #[test]
    fn test_structured_full_marks() {
        let kb = KnowledgeBase::builtin();
        let resolution = ProtocolResolver::new(&kb).resolve("hypertension");
        let symptoms = vec!["heart failure".to_string()];
        let scoring = StructuredScoring {
            condition: "hypertension",
            symptoms: &symptoms,
            resolution: &resolution,
        };

        let lisinopril = kb.medicine("lisinopril").unwrap();
        assert_eq!(scoring.score(lisinopril, &SafetyVerdict::clear()), 100);
    }

    #[test]
    fn test_structured_partial_symptoms() {
        let kb = KnowledgeBase::builtin();
        let resolution = ProtocolResolver::new(&kb).resolve("hypertension");
        let symptoms = vec!["headache".to_string(), "dizziness".to_string()];
        let scoring = StructuredScoring {
            condition: "hypertension",
            symptoms: &symptoms,
            resolution: &resolution,
        };

        let lisinopril = kb.medicine("lisinopril").unwrap();
        // 40 indication + 0 symptoms + 20 safe + 10 first-line
        assert_eq!(scoring.score(lisinopril, &SafetyVerdict::clear()), 70);
    }

    #[test]
    fn test_structured_unsafe_clamps_at_zero() {
        let kb = KnowledgeBase::builtin();
        let resolution = ProtocolResolver::new(&kb).resolve("gout");
        let scoring = StructuredScoring {
            condition: "gout",
            symptoms: &[],
            resolution: &resolution,
        };

        let ibuprofen = kb.medicine("ibuprofen").unwrap();
        assert_eq!(scoring.score(ibuprofen, &unsafe_verdict()), 0);
    }

    #[test]
    fn test_structured_symptom_fraction_rounds() {
        let kb = KnowledgeBase::builtin();
        let resolution = ProtocolResolver::new(&kb).resolve("gout");
        let symptoms = vec!["fever".to_string(), "nausea".to_string(), "rash".to_string()];
        let scoring = StructuredScoring {
            condition: "gout",
            symptoms: &symptoms,
            resolution: &resolution,
        };

        let ibuprofen = kb.medicine("ibuprofen").unwrap();
        // 30 * 1/3 = 10, + 20 safe
        assert_eq!(scoring.score(ibuprofen, &SafetyVerdict::clear()), 30);
    }

    #[test]
    fn test_free_text_boosted_and_capped() {
        let kb = KnowledgeBase::builtin();
        let scoring = FreeTextScoring {
            kb: &kb,
            search_text: "respiratory infection chest congestion",
            exact_match: false,
            ceiling: 95,
        };

        let guaifenesin = kb.medicine("guaifenesin").unwrap();
        assert_eq!(scoring.score(guaifenesin, &SafetyVerdict::clear()), 95);

        let albuterol = kb.medicine("albuterol").unwrap();
        // 95 + 5 is capped
        assert_eq!(scoring.score(albuterol, &SafetyVerdict::clear()), 95);
    }

    #[test]
    fn test_free_text_penalties() {
        let kb = KnowledgeBase::builtin();
        let scoring = FreeTextScoring {
            kb: &kb,
            search_text: "back pain",
            exact_match: false,
            ceiling: 95,
        };

        let ibuprofen = kb.medicine("ibuprofen").unwrap();
        // 90 boosted, no safe bonus, -10 for warnings
        assert_eq!(scoring.score(ibuprofen, &unsafe_verdict()), 80);
    }

    #[test]
    fn test_unlisted_medicine_relevance_default() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(relevance(&kb, "multivitamin", "anything"), 75);
    }

    #[test]
    fn test_keyword_scoring_ignores_verdict() {
        let kb = KnowledgeBase::builtin();
        let scoring = KeywordScoring {
            kb: &kb,
            search_text: "fever",
            ceiling: 95,
        };
        let acetaminophen = kb.medicine("acetaminophen").unwrap();
        assert_eq!(scoring.score(acetaminophen, &unsafe_verdict()), 95);
    }
}
